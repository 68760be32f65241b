//! Frame containment: highlight the frame under a dragged node and move the
//! node in or out of frames when the drag ends.

use crate::config::EngineConfig;
use crate::nodes::{NodeId, SerializableColor};
use crate::scene::SceneTree;
use kurbo::Point;
use std::time::Duration;

// Use web-time on WASM, std::time otherwise
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Frame currently highlighted and the stroke it had before.
#[derive(Debug, Clone, PartialEq)]
struct Highlight {
    frame: NodeId,
    stroke: Option<SerializableColor>,
    stroke_width: f64,
}

/// A containment check waiting for the drag to settle.
#[derive(Debug, Clone, Copy)]
struct PendingCheck {
    node: NodeId,
    due: Instant,
}

/// Membership change decided at the end of a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reparent {
    /// Move into `frame`, placed at `local` in the frame's space.
    IntoFrame { node: NodeId, frame: NodeId, local: Point },
    /// Move out to the root, placed at its world position.
    ToRoot { node: NodeId, world: Point },
}

impl Reparent {
    /// History tag for the change.
    pub fn tag(&self) -> &'static str {
        match self {
            Reparent::IntoFrame { .. } => "frame-enter",
            Reparent::ToRoot { .. } => "frame-leave",
        }
    }
}

#[derive(Debug, Default)]
pub struct ContainmentEngine {
    highlight: Option<Highlight>,
    pending: Option<PendingCheck>,
}

impl ContainmentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// First top-level frame whose rectangle contains the world-space
    /// center of `node`. Zero-area frames and the node itself are skipped.
    pub fn find_container(tree: &SceneTree, node: NodeId) -> Option<NodeId> {
        let center = tree.world_bounds(node)?.center();
        tree.roots()
            .iter()
            .filter(|n| n.is_frame() && !n.internal && n.id() != node)
            .find(|frame| {
                let rect = frame.bounds();
                rect.area() > 0.0 && rect.contains(center)
            })
            .map(|frame| frame.id())
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlight.as_ref().map(|h| h.frame)
    }

    /// Move the highlight to the frame under `node`, if it changed.
    pub fn update_highlight(&mut self, tree: &mut SceneTree, node: NodeId, config: &EngineConfig) {
        let target = Self::find_container(tree, node);
        if target == self.highlighted() {
            return;
        }
        self.clear_highlight(tree);
        let Some(frame_id) = target else {
            return;
        };
        if let Some(frame) = tree.find_mut(frame_id) {
            self.highlight = Some(Highlight {
                frame: frame_id,
                stroke: frame.style.stroke,
                stroke_width: frame.style.stroke_width,
            });
            config.apply_highlight(&mut frame.style);
        }
    }

    /// Restore the highlighted frame's stroke. A frame that no longer
    /// exists is simply forgotten.
    pub fn clear_highlight(&mut self, tree: &mut SceneTree) {
        if let Some(highlight) = self.highlight.take() {
            if let Some(frame) = tree.find_mut(highlight.frame) {
                frame.style.stroke = highlight.stroke;
                frame.style.stroke_width = highlight.stroke_width;
            }
        }
    }

    /// Run `f` with the highlighted frame showing its own stroke, so
    /// snapshots and copies taken inside `f` never capture the highlight.
    /// The highlight is put back afterwards unless `f` removed the frame.
    pub fn with_highlight_suspended<R>(
        &mut self,
        tree: &mut SceneTree,
        f: impl FnOnce(&mut SceneTree) -> R,
    ) -> R {
        let Some(highlight) = self.highlight.take() else {
            return f(tree);
        };
        let shown = tree.find_mut(highlight.frame).map(|frame| {
            let shown = (frame.style.stroke, frame.style.stroke_width);
            frame.style.stroke = highlight.stroke;
            frame.style.stroke_width = highlight.stroke_width;
            shown
        });

        let result = f(tree);

        if let (Some((stroke, width)), Some(frame)) = (shown, tree.find_mut(highlight.frame)) {
            frame.style.stroke = stroke;
            frame.style.stroke_width = width;
            self.highlight = Some(highlight);
        }
        result
    }

    /// Queue the final check for `node`, replacing any earlier one.
    pub fn schedule(&mut self, node: NodeId, now: Instant, delay: Duration) {
        self.pending = Some(PendingCheck { node, due: now + delay });
    }

    pub fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            log::debug!("Cancelled containment check for {}", pending.node);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending check if it is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<NodeId> {
        match self.pending {
            Some(pending) if now >= pending.due => {
                self.pending = None;
                Some(pending.node)
            }
            _ => None,
        }
    }

    /// Decide whether `node` should change parent. Frames never move into
    /// frames; an unchanged parent yields None.
    pub fn resolve(tree: &SceneTree, node: NodeId) -> Option<Reparent> {
        if tree.find(node)?.is_frame() {
            return None;
        }
        let current = tree.parent_of(node);
        let world = tree.world_position(node)?;
        match Self::find_container(tree, node) {
            Some(frame) if Some(frame) != current => {
                let origin = tree.find(frame)?.position;
                Some(Reparent::IntoFrame {
                    node,
                    frame,
                    local: world - origin.to_vec2(),
                })
            }
            None if current.is_some() => Some(Reparent::ToRoot { node, world }),
            _ => None,
        }
    }

    pub fn apply(tree: &mut SceneTree, change: Reparent) -> bool {
        match change {
            Reparent::IntoFrame { node, frame, local } => tree.reparent(node, Some(frame), local),
            Reparent::ToRoot { node, world } => tree.reparent(node, None, world),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Frame, Node, NodeKind, Rectangle};
    use crate::record::{self, IdPolicy};

    fn setup() -> (SceneTree, NodeId, NodeId) {
        let mut tree = SceneTree::new();
        let frame = Node::new(Point::new(100.0, 100.0), NodeKind::Frame(Frame::new(200.0, 200.0)));
        let frame_id = frame.id();
        let node = Node::new(Point::new(0.0, 0.0), NodeKind::Rectangle(Rectangle::new(20.0, 20.0)));
        let node_id = node.id();
        tree.add(frame, None, None);
        tree.add(node, None, None);
        (tree, frame_id, node_id)
    }

    fn move_to(tree: &mut SceneTree, id: NodeId, x: f64, y: f64) {
        tree.find_mut(id).unwrap().position = Point::new(x, y);
    }

    #[test]
    fn test_find_container_uses_center() {
        let (mut tree, frame_id, node_id) = setup();
        assert_eq!(ContainmentEngine::find_container(&tree, node_id), None);
        // Bounds start outside but the center (100, 100) is on the frame edge.
        move_to(&mut tree, node_id, 90.0, 90.0);
        assert_eq!(ContainmentEngine::find_container(&tree, node_id), Some(frame_id));
    }

    #[test]
    fn test_zero_area_frames_are_skipped() {
        let mut tree = SceneTree::new();
        let empty = Node::new(Point::ZERO, NodeKind::Frame(Frame::new(0.0, 100.0)));
        let node = Node::new(Point::ZERO, NodeKind::Rectangle(Rectangle::new(10.0, 10.0)));
        let node_id = node.id();
        tree.add(empty, None, None);
        tree.add(node, None, None);
        assert_eq!(ContainmentEngine::find_container(&tree, node_id), None);
    }

    #[test]
    fn test_highlight_captures_and_restores_stroke() {
        let (mut tree, frame_id, node_id) = setup();
        let config = EngineConfig::default();
        let original = tree.find(frame_id).unwrap().style.clone();

        move_to(&mut tree, node_id, 150.0, 150.0);
        let mut containment = ContainmentEngine::new();
        containment.update_highlight(&mut tree, node_id, &config);
        assert_eq!(containment.highlighted(), Some(frame_id));
        assert_eq!(
            tree.find(frame_id).unwrap().style.stroke,
            Some(config.highlight_stroke_color)
        );

        move_to(&mut tree, node_id, 500.0, 500.0);
        containment.update_highlight(&mut tree, node_id, &config);
        assert_eq!(containment.highlighted(), None);
        assert_eq!(tree.find(frame_id).unwrap().style, original);
    }

    #[test]
    fn test_snapshot_with_highlight_suspended() {
        let (mut tree, frame_id, node_id) = setup();
        let config = EngineConfig::default();
        let original = tree.find(frame_id).unwrap().style.clone();
        move_to(&mut tree, node_id, 150.0, 150.0);
        let mut containment = ContainmentEngine::new();
        containment.update_highlight(&mut tree, node_id, &config);

        let snapshot = containment.with_highlight_suspended(&mut tree, |tree| tree.snapshot());
        let restored = record::node_from_value(&snapshot[0], IdPolicy::Preserve).unwrap();
        assert_eq!(restored.style, original);

        // Still highlighted afterwards.
        assert_eq!(containment.highlighted(), Some(frame_id));
        assert_eq!(
            tree.find(frame_id).unwrap().style.stroke,
            Some(config.highlight_stroke_color)
        );

        // Removing the frame inside the closure drops the highlight.
        containment.with_highlight_suspended(&mut tree, |tree| tree.remove(frame_id));
        assert_eq!(containment.highlighted(), None);
    }

    #[test]
    fn test_resolve_into_frame_preserves_world_position() {
        let (mut tree, frame_id, node_id) = setup();
        move_to(&mut tree, node_id, 150.0, 170.0);
        let change = ContainmentEngine::resolve(&tree, node_id).unwrap();
        assert_eq!(
            change,
            Reparent::IntoFrame {
                node: node_id,
                frame: frame_id,
                local: Point::new(50.0, 70.0)
            }
        );
        assert_eq!(change.tag(), "frame-enter");
        assert!(ContainmentEngine::apply(&mut tree, change));
        assert_eq!(tree.world_position(node_id), Some(Point::new(150.0, 170.0)));

        // Still inside its parent: nothing to do.
        assert_eq!(ContainmentEngine::resolve(&tree, node_id), None);
    }

    #[test]
    fn test_resolve_out_of_frame() {
        let (mut tree, frame_id, node_id) = setup();
        tree.reparent(node_id, Some(frame_id), Point::new(10.0, 10.0));
        move_to(&mut tree, node_id, 400.0, 0.0);
        let change = ContainmentEngine::resolve(&tree, node_id).unwrap();
        assert_eq!(change, Reparent::ToRoot { node: node_id, world: Point::new(500.0, 100.0) });
        assert_eq!(change.tag(), "frame-leave");
    }

    #[test]
    fn test_frames_are_never_reparented() {
        let (tree, frame_id, _) = setup();
        assert_eq!(ContainmentEngine::resolve(&tree, frame_id), None);
    }

    #[test]
    fn test_pending_check_is_due_after_delay() {
        let (_, _, node_id) = setup();
        let mut containment = ContainmentEngine::new();
        let start = Instant::now();
        containment.schedule(node_id, start, Duration::from_millis(50));
        assert_eq!(containment.take_due(start), None);
        assert_eq!(containment.take_due(start + Duration::from_millis(50)), Some(node_id));
        assert!(!containment.has_pending());

        containment.schedule(node_id, start, Duration::from_millis(50));
        containment.cancel_pending();
        assert_eq!(containment.take_due(start + Duration::from_secs(1)), None);
    }
}
