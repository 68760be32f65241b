//! The document engine: owns the scene and drives every editing operation.
//!
//! Each public operation mutates the scene, then flushes the queued scene
//! changes to the observer (layers first, then selection) and finally
//! records a history entry when the operation completes a user action.

use crate::clipboard::{ClipboardPayload, ClipboardService};
use crate::config::EngineConfig;
use crate::containment::ContainmentEngine;
use crate::drawing::{self, DrawingSession, SessionOutcome};
use crate::error::ImageError;
use crate::history::{HistoryManager, HistoryState};
use crate::input::{
    EditorCommand, InputHost, InputSubscriptions, KeyEvent, PointerEvent, ShortcutRegistry,
};
use crate::layers::{self, LayerEntry, ReorderPosition};
use crate::nodes::{Image, ImageSource, Node, NodeId, NodeKind, NodeStyle, Text, decode_dimensions};
use crate::observer::EngineObserver;
use crate::scene::{NodeProperty, SceneChange, SceneTree};
use crate::selection::Selection;
use crate::tools::{ModeConfig, ToolManager, ToolMode, Transition};
use kurbo::{Point, Vec2};
use peniko::Color;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

// Use web-time on WASM, std::time otherwise
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Handle for an image whose dimensions are still being decoded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingImageId(u64);

#[derive(Debug, Clone)]
struct PendingImage {
    source: ImageSource,
    at: Option<Point>,
}

/// A drag of the current selection in select mode.
#[derive(Debug, Clone, Copy)]
struct MoveGesture {
    last: Point,
    moved: bool,
}

pub struct Engine {
    config: EngineConfig,
    scene: SceneTree,
    tools: ToolManager,
    selection: Selection,
    history: HistoryManager,
    clipboard: ClipboardService,
    containment: ContainmentEngine,
    session: Option<DrawingSession>,
    gesture: Option<MoveGesture>,
    pending_images: HashMap<PendingImageId, PendingImage>,
    next_image: u64,
    selection_dirty: bool,
    observer: Box<dyn EngineObserver>,
    subscriptions: Option<InputSubscriptions>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("mode", &self.tools.mode())
            .field("nodes", &self.scene.len())
            .field("selection", &self.selection)
            .field("history", &self.history.state())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine with an empty document. The initial layer list and
    /// the `init` history entry are reported to `observer` right away.
    pub fn new(config: EngineConfig, observer: impl EngineObserver + 'static) -> Self {
        let mut engine = Self {
            history: HistoryManager::new(config.max_history),
            clipboard: ClipboardService::new(config.paste_offset),
            config,
            scene: SceneTree::new(),
            tools: ToolManager::new(),
            selection: Selection::new(),
            containment: ContainmentEngine::new(),
            session: None,
            gesture: None,
            pending_images: HashMap::new(),
            next_image: 0,
            selection_dirty: false,
            observer: Box::new(observer),
            subscriptions: None,
        };
        engine.emit_layers();
        engine.record("init");
        engine
    }

    // --- Queries ---

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneTree {
        &self.scene
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.scene.find(id)
    }

    pub fn mode(&self) -> ToolMode {
        self.tools.mode()
    }

    pub fn mode_config(&self) -> ModeConfig {
        self.tools.config()
    }

    pub fn selection(&self) -> &[NodeId] {
        self.selection.ids()
    }

    pub fn hovered_layer(&self) -> Option<NodeId> {
        self.selection.hovered()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn history_state(&self) -> HistoryState {
        self.history.state()
    }

    pub fn layers(&self) -> Vec<LayerEntry> {
        layers::project(&self.scene)
    }

    pub fn clipboard(&self) -> &ClipboardPayload {
        self.clipboard.payload()
    }

    pub fn highlighted_frame(&self) -> Option<NodeId> {
        self.containment.highlighted()
    }

    /// The highlighted frame and the stroke color the host should draw it with.
    pub fn highlight(&self) -> Option<(NodeId, Color)> {
        let id = self.containment.highlighted()?;
        let color = self.scene.find(id)?.style.stroke_color()?;
        Some((id, color))
    }

    pub fn has_pending_containment(&self) -> bool {
        self.containment.has_pending()
    }

    pub fn is_drawing(&self) -> bool {
        self.session.is_some()
    }

    // --- Notifications ---

    fn emit_layers(&mut self) {
        let layers = layers::project(&self.scene);
        self.observer.on_layers_change(&layers);
    }

    fn emit_history(&mut self) {
        self.observer.on_history_change(self.history.state());
    }

    fn set_selection(&mut self, ids: &[NodeId]) {
        if self.selection.set(ids) {
            self.selection_dirty = true;
        }
    }

    fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.selection_dirty = true;
        }
    }

    /// Report everything the last mutation changed.
    fn flush(&mut self) {
        let changes = self.scene.take_changes();
        if self.selection.retain_live(&self.scene) {
            self.selection_dirty = true;
        }
        if let Some(gone) = self.selection.prune_hover(&self.scene) {
            self.observer.on_layer_unhover(gone);
        }
        if changes.iter().any(SceneChange::is_layer_relevant) {
            self.emit_layers();
        }
        if std::mem::take(&mut self.selection_dirty) {
            self.observer.on_selection_change(self.selection.ids());
        }
    }

    /// Snapshot the scene as a new history entry. A live drag highlight is
    /// left out of the snapshot.
    fn record(&mut self, tag: &str) {
        let snapshot = self
            .containment
            .with_highlight_suspended(&mut self.scene, |tree| tree.snapshot());
        if self.history.record(tag, snapshot) {
            self.emit_history();
        }
    }

    // --- Modes ---

    /// Switch tool mode. Any unfinished drawing is dropped and pending
    /// containment is cancelled.
    pub fn set_mode(&mut self, mode: ToolMode) {
        self.abort_session();
        self.gesture = None;
        self.containment.cancel_pending();
        self.containment.clear_highlight(&mut self.scene);
        self.enter_mode(mode);
        self.flush();
    }

    fn enter_mode(&mut self, mode: ToolMode) {
        let transition = self.tools.set_mode(mode);
        self.apply_transition(transition);
    }

    fn apply_transition(&mut self, transition: Transition) {
        if transition.clears_selection() {
            self.clear_selection();
        }
        self.observer.on_mode_change(transition.to);
        self.observer.on_interaction_config(transition.to.config());
    }

    fn abort_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.scene.remove(session.node_id());
        }
    }

    // --- Pointer input ---

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position } => self.pointer_down(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position } => self.pointer_up(position),
            PointerEvent::Tap { position } => self.tap(position),
        }
    }

    /// Start a drawing session when a drawing mode is active.
    pub fn pointer_down(&mut self, point: Point) {
        if self.session.is_some() || !self.tools.mode().is_drawing() {
            return;
        }
        let Some((session, node)) = DrawingSession::begin(self.tools.mode(), point) else {
            return;
        };
        self.containment.cancel_pending();
        self.clear_selection();
        self.scene.add(node, None, None);
        self.session = Some(session);
        self.flush();
    }

    pub fn pointer_move(&mut self, point: Point) {
        if let Some(session) = &self.session {
            let config = &self.config;
            self.scene.update(session.node_id(), NodeProperty::Geometry, |node| {
                session.update(node, point, config)
            });
            self.flush();
        } else if self.gesture.is_some() {
            self.drag_to(point);
        }
    }

    pub fn pointer_up(&mut self, point: Point) {
        if self.session.is_some() {
            self.pointer_move(point);
            self.finish_session();
        } else if self.gesture.is_some() {
            self.drag_to(point);
            self.end_move();
        }
    }

    /// Place a text node in text mode.
    pub fn tap(&mut self, point: Point) {
        if self.tools.mode() == ToolMode::Text {
            self.add_text(point);
        }
    }

    fn finish_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let id = session.node_id();
        let outcome = match self.scene.find(id) {
            Some(node) => session.finish(node, &self.config),
            None => SessionOutcome::Discard,
        };

        let committed = match outcome {
            SessionOutcome::Commit => true,
            SessionOutcome::Replace(node) => {
                let index = self.scene.index_of(id);
                self.scene.add(node, None, index)
            }
            SessionOutcome::Discard => {
                self.scene.remove(id);
                false
            }
        };

        let transition = self.tools.finish_gesture();
        self.apply_transition(transition);
        if committed {
            self.set_selection(&[id]);
        }
        self.flush();
        if committed {
            self.record(&format!("create-{}", session.mode()));
        } else {
            log::debug!("Discarded {} drawn below the minimum size", session.mode());
        }
    }

    // --- Move gestures ---

    /// Start dragging the selection. Only in select mode, and only when
    /// something unlocked is selected.
    pub fn begin_move(&mut self, point: Point) -> bool {
        if self.tools.mode() != ToolMode::Select || self.session.is_some() {
            return false;
        }
        if self.movable_selection().is_empty() {
            return false;
        }
        self.containment.cancel_pending();
        self.gesture = Some(MoveGesture {
            last: point,
            moved: false,
        });
        true
    }

    /// Selected unlocked nodes, without children whose frame is also selected.
    fn movable_selection(&self) -> Vec<NodeId> {
        self.selection
            .ids()
            .iter()
            .copied()
            .filter(|&id| self.scene.find(id).is_some_and(|n| !n.locked))
            .filter(|&id| !self.scene.parent_of(id).is_some_and(|p| self.selection.contains(p)))
            .collect()
    }

    /// The dragged node when containment applies: one non-frame node.
    fn containment_candidate(&self) -> Option<NodeId> {
        let id = self.selection.single()?;
        let node = self.scene.find(id)?;
        (!node.is_frame() && !node.locked).then_some(id)
    }

    fn drag_to(&mut self, point: Point) {
        let movable = self.movable_selection();
        if movable.is_empty() {
            // The dragged nodes were deleted or deselected mid-gesture.
            self.gesture = None;
            self.containment.clear_highlight(&mut self.scene);
            return;
        }
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        let delta: Vec2 = point - gesture.last;
        gesture.last = point;
        if delta == Vec2::ZERO {
            return;
        }
        gesture.moved = true;

        for id in movable {
            self.scene.update(id, NodeProperty::Position, |node| node.translate(delta));
        }
        if let Some(id) = self.containment_candidate() {
            self.containment.update_highlight(&mut self.scene, id, &self.config);
        }
        self.flush();
    }

    fn end_move(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        self.containment.clear_highlight(&mut self.scene);
        if !gesture.moved || self.movable_selection().is_empty() {
            return;
        }
        self.flush();
        self.record("move");
        if let Some(id) = self.containment_candidate() {
            self.containment.schedule(
                id,
                Instant::now(),
                Duration::from_millis(self.config.containment_settle_ms),
            );
        }
    }

    /// Run the pending containment check if its settle delay has passed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        let Some(id) = self.containment.take_due(now) else {
            return false;
        };
        let Some(change) = ContainmentEngine::resolve(&self.scene, id) else {
            return false;
        };
        if !ContainmentEngine::apply(&mut self.scene, change) {
            return false;
        }
        self.flush();
        self.record(change.tag());
        true
    }

    // --- Creation ---

    /// Add a placeholder text node at `point`, select it and return to select mode.
    pub fn add_text(&mut self, point: Point) -> NodeId {
        let text = Text::new(self.config.text_placeholder.clone(), self.config.text_font_size);
        let style = drawing::default_style(ToolMode::Text);
        let node = Node::new(point, NodeKind::Text(text)).with_style(style);
        let id = node.id();
        self.scene.add(node, None, None);
        if self.tools.mode() != ToolMode::Select {
            let transition = self.tools.finish_gesture();
            self.apply_transition(transition);
        }
        self.set_selection(&[id]);
        self.flush();
        self.record("add-text");
        id
    }

    /// Register an image whose natural size the host is still decoding.
    pub fn request_image(&mut self, source: ImageSource, at: Option<Point>) -> PendingImageId {
        self.next_image += 1;
        let id = PendingImageId(self.next_image);
        self.pending_images.insert(id, PendingImage { source, at });
        id
    }

    /// Finish a pending image. Failures are logged and create nothing.
    pub fn complete_image(
        &mut self,
        id: PendingImageId,
        dimensions: Result<(u32, u32), ImageError>,
    ) -> Option<NodeId> {
        let pending = self.pending_images.remove(&id)?;
        match dimensions {
            Ok((width, height)) if width > 0 && height > 0 => {
                Some(self.insert_image(Image::new(pending.source, width, height), pending.at))
            }
            Ok(_) => {
                log::error!("Image load failed: {}", ImageError::ZeroSize);
                None
            }
            Err(e) => {
                log::error!("Image load failed: {}", e);
                None
            }
        }
    }

    pub fn pending_image_count(&self) -> usize {
        self.pending_images.len()
    }

    /// Decode raw image bytes and insert them as an embedded image.
    pub fn insert_image_data(&mut self, data: &[u8], at: Option<Point>) -> Option<NodeId> {
        match decode_dimensions(data) {
            Ok((format, width, height)) => {
                let source = ImageSource::embedded(format, data);
                Some(self.insert_image(Image::new(source, width, height), at))
            }
            Err(e) => {
                log::error!("Image load failed: {}", e);
                None
            }
        }
    }

    fn insert_image(&mut self, image: Image, at: Option<Point>) -> NodeId {
        let position = at.unwrap_or(self.config.default_image_position);
        let style = NodeStyle {
            stroke: None,
            stroke_width: 0.0,
            ..NodeStyle::default()
        };
        let node = Node::new(position, NodeKind::Image(image)).with_style(style);
        let id = node.id();
        self.scene.add(node, None, None);
        self.set_selection(&[id]);
        self.flush();
        self.record("add-image");
        log::info!("Inserted image {}", id);
        id
    }

    // --- Clipboard ---

    /// Copy the selection. Returns the number of nodes copied.
    pub fn copy(&mut self) -> usize {
        let clipboard = &mut self.clipboard;
        let ids = self.selection.ids();
        self.containment
            .with_highlight_suspended(&mut self.scene, |tree| clipboard.copy(tree, ids))
    }

    /// Paste the clipboard, selecting the new nodes.
    pub fn paste(&mut self) -> Vec<NodeId> {
        if self.clipboard.payload().is_empty() {
            return Vec::new();
        }
        self.clear_selection();
        let ids = self.clipboard.paste(&mut self.scene);
        self.set_selection(&ids);
        self.flush();
        if !ids.is_empty() {
            self.record("paste");
        }
        ids
    }

    /// Duplicate one node next to itself under the same parent.
    pub fn duplicate(&mut self, id: NodeId) -> Option<NodeId> {
        let clipboard = &self.clipboard;
        let new_id = self
            .containment
            .with_highlight_suspended(&mut self.scene, |tree| clipboard.duplicate(tree, id))?;
        self.set_selection(&[new_id]);
        self.flush();
        self.record("duplicate");
        Some(new_id)
    }

    /// Duplicate a single selected node, or copy and paste a multi-selection.
    pub fn duplicate_selection(&mut self) -> Vec<NodeId> {
        if let Some(id) = self.selection.single() {
            return self.duplicate(id).into_iter().collect();
        }
        if self.selection.is_empty() {
            return Vec::new();
        }
        self.copy();
        self.paste()
    }

    /// Clipboard payload as JSON for the system clipboard.
    pub fn clipboard_json(&self) -> Result<String, serde_json::Error> {
        self.clipboard.payload().to_json()
    }

    /// Replace the clipboard with a payload read from the system clipboard.
    pub fn import_clipboard_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let payload = ClipboardPayload::from_json(json)?;
        let count = payload.len();
        self.clipboard.set_payload(payload);
        Ok(count)
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: &[serde_json::Value]) {
        self.abort_session();
        self.gesture = None;
        self.containment.cancel_pending();
        self.containment.clear_highlight(&mut self.scene);

        self.history.begin_restore();
        self.scene.restore(snapshot);
        self.clear_selection();
        self.flush();
        self.history.end_restore();
        self.emit_history();
    }

    // --- Selection and layers ---

    /// Select the node behind a layer row; an unknown id clears the selection.
    pub fn select_layer(&mut self, id: NodeId) {
        if self.scene.contains(id) {
            self.set_selection(&[id]);
        } else {
            self.clear_selection();
        }
        self.flush();
    }

    /// Adopt the renderer's selection, ignoring ids not in the scene.
    pub fn sync_selection_from_renderer(&mut self, ids: &[NodeId]) {
        let live: Vec<NodeId> = ids.iter().copied().filter(|&id| self.scene.contains(id)).collect();
        self.set_selection(&live);
        self.flush();
    }

    pub fn toggle_visible(&mut self, id: NodeId) -> bool {
        self.update_layer(id, NodeProperty::Visible, "toggle-visible", |node| {
            node.visible = !node.visible
        })
    }

    pub fn toggle_lock(&mut self, id: NodeId) -> bool {
        self.update_layer(id, NodeProperty::Locked, "toggle-lock", |node| {
            node.locked = !node.locked
        })
    }

    pub fn rename_layer(&mut self, id: NodeId, name: &str) -> bool {
        self.update_layer(id, NodeProperty::Name, "rename", |node| node.name = name.to_string())
    }

    fn update_layer(
        &mut self,
        id: NodeId,
        property: NodeProperty,
        tag: &str,
        f: impl FnOnce(&mut Node),
    ) -> bool {
        if !self.scene.update(id, property, f) {
            return false;
        }
        self.flush();
        self.record(tag);
        true
    }

    pub fn remove_layer(&mut self, id: NodeId) -> bool {
        if self.scene.remove(id).is_none() {
            return false;
        }
        self.flush();
        self.record("delete");
        true
    }

    /// Delete every selected node.
    pub fn remove_selected(&mut self) -> usize {
        let ids = self.selection.ids().to_vec();
        let removed = ids.into_iter().filter(|&id| self.scene.remove(id).is_some()).count();
        self.clear_selection();
        self.flush();
        if removed > 0 {
            self.record("delete");
        }
        removed
    }

    pub fn reorder_layer(
        &mut self,
        drag: NodeId,
        target: NodeId,
        position: ReorderPosition,
    ) -> bool {
        if !layers::reorder(&mut self.scene, drag, target, position) {
            return false;
        }
        self.flush();
        self.record("reorder");
        true
    }

    pub fn hover_layer(&mut self, id: NodeId) {
        if !self.scene.contains(id) {
            return;
        }
        match self.selection.set_hovered(Some(id)) {
            Some(previous) if previous == id => return,
            Some(previous) => self.observer.on_layer_unhover(previous),
            None => {}
        }
        self.observer.on_layer_hover(id);
    }

    pub fn unhover_layer(&mut self, id: NodeId) {
        if self.selection.hovered() == Some(id) {
            self.selection.set_hovered(None);
            self.observer.on_layer_unhover(id);
        }
    }

    /// Remove every node from the document.
    pub fn clear(&mut self) {
        self.abort_session();
        self.gesture = None;
        self.containment.cancel_pending();
        self.containment.clear_highlight(&mut self.scene);
        if self.scene.is_empty() {
            return;
        }
        self.scene.clear();
        self.clear_selection();
        self.flush();
        self.record("clear");
    }

    // --- Keyboard ---

    /// Run the shortcut bound to `event`, if any.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<EditorCommand> {
        let command = ShortcutRegistry::resolve(event)?;
        self.execute(command);
        Some(command)
    }

    pub fn execute(&mut self, command: EditorCommand) {
        match command {
            EditorCommand::Delete => {
                self.remove_selected();
            }
            EditorCommand::Copy => {
                self.copy();
            }
            EditorCommand::Paste => {
                self.paste();
            }
            EditorCommand::Duplicate => {
                self.duplicate_selection();
            }
            EditorCommand::Undo => {
                self.undo();
            }
            EditorCommand::Redo => {
                self.redo();
            }
        }
    }

    // --- Lifecycle ---

    /// Subscribe to the host's keyboard, paste, drag-over and drop channels.
    /// Replaces (and releases) any earlier subscriptions.
    pub fn attach_input(&mut self, host: &Rc<RefCell<dyn InputHost>>) {
        self.subscriptions = None;
        self.subscriptions = Some(InputSubscriptions::acquire(host));
    }

    /// Release the host subscriptions.
    pub fn detach_input(&mut self) {
        self.subscriptions = None;
    }

    pub fn is_input_attached(&self) -> bool {
        self.subscriptions.is_some()
    }
}
