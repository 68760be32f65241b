//! Outbound notifications to the host UI.

use crate::history::HistoryState;
use crate::layers::LayerEntry;
use crate::nodes::NodeId;
use crate::tools::{ModeConfig, ToolMode};
use std::cell::RefCell;
use std::rc::Rc;

/// Receives engine notifications. Every method defaults to doing nothing,
/// so hosts implement only what they display.
pub trait EngineObserver {
    fn on_mode_change(&mut self, _mode: ToolMode) {}
    /// Cursor and editor settings for the new mode.
    fn on_interaction_config(&mut self, _config: ModeConfig) {}
    /// Full layer list, topmost first.
    fn on_layers_change(&mut self, _layers: &[LayerEntry]) {}
    fn on_selection_change(&mut self, _ids: &[NodeId]) {}
    fn on_history_change(&mut self, _state: HistoryState) {}
    fn on_layer_hover(&mut self, _id: NodeId) {}
    fn on_layer_unhover(&mut self, _id: NodeId) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Shared observers stay inspectable by their owner.
impl<T: EngineObserver> EngineObserver for Rc<RefCell<T>> {
    fn on_mode_change(&mut self, mode: ToolMode) {
        self.borrow_mut().on_mode_change(mode);
    }

    fn on_interaction_config(&mut self, config: ModeConfig) {
        self.borrow_mut().on_interaction_config(config);
    }

    fn on_layers_change(&mut self, layers: &[LayerEntry]) {
        self.borrow_mut().on_layers_change(layers);
    }

    fn on_selection_change(&mut self, ids: &[NodeId]) {
        self.borrow_mut().on_selection_change(ids);
    }

    fn on_history_change(&mut self, state: HistoryState) {
        self.borrow_mut().on_history_change(state);
    }

    fn on_layer_hover(&mut self, id: NodeId) {
        self.borrow_mut().on_layer_hover(id);
    }

    fn on_layer_unhover(&mut self, id: NodeId) {
        self.borrow_mut().on_layer_unhover(id);
    }
}

/// A notification as delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ModeChanged(ToolMode),
    InteractionConfig(ModeConfig),
    LayersChanged(Vec<LayerEntry>),
    SelectionChanged(Vec<NodeId>),
    HistoryChanged(HistoryState),
    LayerHover(NodeId),
    LayerUnhover(NodeId),
}

/// Observer that keeps every notification in order, for hosts that poll
/// and for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<EngineEvent>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn last_layers(&self) -> Option<&[LayerEntry]> {
        self.events.iter().rev().find_map(|e| match e {
            EngineEvent::LayersChanged(layers) => Some(layers.as_slice()),
            _ => None,
        })
    }

    pub fn last_selection(&self) -> Option<&[NodeId]> {
        self.events.iter().rev().find_map(|e| match e {
            EngineEvent::SelectionChanged(ids) => Some(ids.as_slice()),
            _ => None,
        })
    }

    pub fn last_history(&self) -> Option<HistoryState> {
        self.events.iter().rev().find_map(|e| match e {
            EngineEvent::HistoryChanged(state) => Some(*state),
            _ => None,
        })
    }

    /// Modes in the order they were entered.
    pub fn modes(&self) -> Vec<ToolMode> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::ModeChanged(mode) => Some(*mode),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&EngineEvent) -> bool) -> usize {
        self.events.iter().filter(|e| matches(e)).count()
    }
}

impl EngineObserver for RecordingObserver {
    fn on_mode_change(&mut self, mode: ToolMode) {
        self.events.push(EngineEvent::ModeChanged(mode));
    }

    fn on_interaction_config(&mut self, config: ModeConfig) {
        self.events.push(EngineEvent::InteractionConfig(config));
    }

    fn on_layers_change(&mut self, layers: &[LayerEntry]) {
        self.events.push(EngineEvent::LayersChanged(layers.to_vec()));
    }

    fn on_selection_change(&mut self, ids: &[NodeId]) {
        self.events.push(EngineEvent::SelectionChanged(ids.to_vec()));
    }

    fn on_history_change(&mut self, state: HistoryState) {
        self.events.push(EngineEvent::HistoryChanged(state));
    }

    fn on_layer_hover(&mut self, id: NodeId) {
        self.events.push(EngineEvent::LayerHover(id));
    }

    fn on_layer_unhover(&mut self, id: NodeId) {
        self.events.push(EngineEvent::LayerUnhover(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_recording_observer() {
        let shared = Rc::new(RefCell::new(RecordingObserver::new()));
        let mut observer: Box<dyn EngineObserver> = Box::new(shared.clone());
        observer.on_mode_change(ToolMode::Pen);
        observer.on_selection_change(&[]);
        observer.on_mode_change(ToolMode::Select);

        let recorded = shared.borrow();
        assert_eq!(recorded.modes(), vec![ToolMode::Pen, ToolMode::Select]);
        assert_eq!(recorded.last_selection(), Some(&[][..]));
        assert!(recorded.last_history().is_none());
        assert_eq!(recorded.count(|e| matches!(e, EngineEvent::ModeChanged(_))), 2);
    }

    #[test]
    fn test_noop_observer_accepts_everything() {
        let mut observer = NoopObserver;
        observer.on_layers_change(&[]);
        observer.on_layer_hover(NodeId::new_v4());
    }
}
