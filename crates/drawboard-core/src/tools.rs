//! Tool modes and the mode state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available tool modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    #[default]
    Select,
    Text,
    Rect,
    Ellipse,
    Diamond,
    Frame,
    Line,
    Arrow,
    Pen,
}

impl ToolMode {
    pub const ALL: [ToolMode; 9] = [
        ToolMode::Select,
        ToolMode::Text,
        ToolMode::Rect,
        ToolMode::Ellipse,
        ToolMode::Diamond,
        ToolMode::Frame,
        ToolMode::Line,
        ToolMode::Arrow,
        ToolMode::Pen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolMode::Select => "select",
            ToolMode::Text => "text",
            ToolMode::Rect => "rect",
            ToolMode::Ellipse => "ellipse",
            ToolMode::Diamond => "diamond",
            ToolMode::Frame => "frame",
            ToolMode::Line => "line",
            ToolMode::Arrow => "arrow",
            ToolMode::Pen => "pen",
        }
    }

    /// Whether a gesture-down in this mode starts a drawing session.
    pub fn is_drawing(&self) -> bool {
        !matches!(self, ToolMode::Select | ToolMode::Text)
    }

    /// Interaction settings the renderer applies while this mode is active.
    pub fn config(&self) -> ModeConfig {
        match self {
            ToolMode::Select => ModeConfig {
                cursor: Cursor::Default,
                editor_visible: true,
                editor_hittable: true,
                hit_children: true,
            },
            ToolMode::Text => ModeConfig {
                cursor: Cursor::Text,
                editor_visible: false,
                editor_hittable: false,
                hit_children: true,
            },
            _ => ModeConfig {
                cursor: Cursor::Crosshair,
                editor_visible: false,
                editor_hittable: false,
                hit_children: false,
            },
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tool mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for ToolMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Cursor hint for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    Default,
    Crosshair,
    Text,
}

/// Per-mode interaction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeConfig {
    pub cursor: Cursor,
    /// Whether selection handles are shown.
    pub editor_visible: bool,
    /// Whether selection handles respond to the pointer.
    pub editor_hittable: bool,
    /// Whether frame children are eligible for hit-testing.
    pub hit_children: bool,
}

/// A completed mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ToolMode,
    pub to: ToolMode,
}

impl Transition {
    /// Entering any mode other than select clears the selection.
    pub fn clears_selection(&self) -> bool {
        self.to != ToolMode::Select
    }
}

/// Holds the active mode.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    mode: ToolMode,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn config(&self) -> ModeConfig {
        self.mode.config()
    }

    /// Switch modes. Setting the current mode again still counts as a transition.
    pub fn set_mode(&mut self, mode: ToolMode) -> Transition {
        let from = self.mode;
        self.mode = mode;
        log::debug!("Tool mode {} -> {}", from, mode);
        Transition { from, to: mode }
    }

    /// Return to select after a completed creation gesture.
    pub fn finish_gesture(&mut self) -> Transition {
        self.set_mode(ToolMode::Select)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_round_trip() {
        for mode in ToolMode::ALL {
            assert_eq!(mode.as_str().parse::<ToolMode>(), Ok(mode));
        }
        assert_eq!("lasso".parse::<ToolMode>(), Err(UnknownMode("lasso".to_string())));
    }

    #[test]
    fn test_drawing_modes_disable_child_hits() {
        for mode in ToolMode::ALL {
            let config = mode.config();
            assert_eq!(config.hit_children, !mode.is_drawing(), "{mode}");
            if mode != ToolMode::Select {
                assert!(!config.editor_visible);
                assert!(!config.editor_hittable);
            }
        }
        assert_eq!(ToolMode::Pen.config().cursor, Cursor::Crosshair);
        assert_eq!(ToolMode::Text.config().cursor, Cursor::Text);
    }

    #[test]
    fn test_tool_manager_transitions() {
        let mut tools = ToolManager::new();
        assert_eq!(tools.mode(), ToolMode::Select);

        let t = tools.set_mode(ToolMode::Rect);
        assert_eq!(t, Transition { from: ToolMode::Select, to: ToolMode::Rect });
        assert!(t.clears_selection());

        let back = tools.finish_gesture();
        assert!(!back.clears_selection());
        assert_eq!(tools.mode(), ToolMode::Select);
    }

    #[test]
    fn test_mode_config_serializes_camel_case() {
        let value = serde_json::to_value(ToolMode::Select.config()).unwrap();
        assert_eq!(value["editorHittable"], true);
        assert_eq!(value["cursor"], "default");
    }
}
