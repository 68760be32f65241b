//! Engine configuration.

use crate::error::ConfigError;
use crate::nodes::{NodeStyle, SerializableColor};
use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Tunable constants of the editing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of history entries kept.
    pub max_history: usize,
    /// Step added to the cumulative offset on every paste, and the fixed duplicate offset.
    pub paste_offset: f64,
    /// Shapes narrower or shorter than this are discarded at gesture-up.
    pub min_shape_size: f64,
    /// Lines and arrows shorter than this are discarded at gesture-up.
    pub min_line_length: f64,
    /// Minimum distance between consecutive pen samples.
    pub pen_sample_spacing: f64,
    /// Pen strokes with fewer samples are discarded.
    pub pen_min_points: usize,
    /// First-to-last distance under which a pen stroke closes into a polygon.
    pub pen_close_distance: f64,
    /// Delay between gesture-up and the final containment check.
    pub containment_settle_ms: u64,
    /// Stroke applied to the frame under a dragged node.
    pub highlight_stroke_color: SerializableColor,
    pub highlight_stroke_width: f64,
    /// Where images land when no drop point is given.
    pub default_image_position: Point,
    pub text_font_size: f64,
    pub text_placeholder: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: 50,
            paste_offset: 20.0,
            min_shape_size: 5.0,
            min_line_length: 5.0,
            pen_sample_spacing: 2.0,
            pen_min_points: 3,
            pen_close_distance: 20.0,
            containment_settle_ms: 50,
            highlight_stroke_color: SerializableColor::new(0x3b, 0x82, 0xf6, 255),
            highlight_stroke_width: 2.0,
            default_image_position: Point::new(100.0, 100.0),
            text_font_size: 24.0,
            text_placeholder: "Double-click to edit".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history == 0 {
            return Err(ConfigError::Invalid {
                field: "max_history",
                reason: "must keep at least one entry".to_string(),
            });
        }
        if self.pen_min_points == 0 {
            return Err(ConfigError::Invalid {
                field: "pen_min_points",
                reason: "must be at least 1".to_string(),
            });
        }
        let distances = [
            ("paste_offset", self.paste_offset),
            ("min_shape_size", self.min_shape_size),
            ("min_line_length", self.min_line_length),
            ("pen_sample_spacing", self.pen_sample_spacing),
            ("pen_close_distance", self.pen_close_distance),
            ("highlight_stroke_width", self.highlight_stroke_width),
            ("text_font_size", self.text_font_size),
        ];
        for (field, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is not a non-negative distance"),
                });
            }
        }
        Ok(())
    }

    /// Use a renderer color for the drag highlight.
    pub fn with_highlight_color(mut self, color: Color) -> Self {
        self.highlight_stroke_color = color.into();
        self
    }

    /// Stroke swap applied to a highlighted frame.
    pub(crate) fn apply_highlight(&self, style: &mut NodeStyle) {
        style.stroke = Some(self.highlight_stroke_color);
        style.stroke_width = self.highlight_stroke_width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_history, 50);
        assert!((config.paste_offset - 20.0).abs() < f64::EPSILON);
        assert_eq!(config.containment_settle_ms, 50);
        assert_eq!(config.highlight_stroke_color, SerializableColor::new(0x3b, 0x82, 0xf6, 255));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_highlight_color_from_renderer() {
        let red = Color::from_rgba8(255, 0, 0, 255);
        let config = EngineConfig::default().with_highlight_color(red);
        assert_eq!(config.highlight_stroke_color, SerializableColor::new(255, 0, 0, 255));

        let mut style = NodeStyle::default();
        config.apply_highlight(&mut style);
        assert_eq!(style.stroke, Some(SerializableColor::new(255, 0, 0, 255)));
        assert!((style.stroke_width - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"max_history": 10, "paste_offset": 8.0}"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.max_history, 10);
        assert!((config.paste_offset - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.pen_min_points, 3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"max_history": 0}"#),
            Err(ConfigError::Invalid { field: "max_history", .. })
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"min_shape_size": -1.0}"#),
            Err(ConfigError::Invalid { field: "min_shape_size", .. })
        ));
        assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }
}
