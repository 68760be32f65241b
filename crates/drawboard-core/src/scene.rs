//! Scene tree: the ordered document of nodes.
//!
//! The tree holds top-level nodes in paint order (later = on top). Frames
//! hold their own ordered children, one level deep. Every mutation queues a
//! [`SceneChange`] which the engine drains once the surrounding operation is
//! complete.

use crate::nodes::{Node, NodeId};
use crate::record::{self, IdPolicy};
use kurbo::{Point, Rect};
use serde_json::Value;

/// Node properties whose change is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeProperty {
    Position,
    Geometry,
    Style,
    Visible,
    Locked,
    Name,
    Text,
}

/// A queued notification about a tree mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Added(NodeId),
    Removed(NodeId),
    /// Children of the given parent (None = root) changed order.
    Reordered(Option<NodeId>),
    Reparented(NodeId),
    PropertyChanged(NodeId, NodeProperty),
    /// The whole tree was replaced from a snapshot.
    Restored,
}

impl SceneChange {
    /// Whether this change alters what the layer list shows.
    pub fn is_layer_relevant(&self) -> bool {
        match self {
            SceneChange::PropertyChanged(_, property) => matches!(
                property,
                NodeProperty::Visible
                    | NodeProperty::Locked
                    | NodeProperty::Name
                    | NodeProperty::Text
            ),
            _ => true,
        }
    }
}

/// Where a node lives: index of its frame among the roots (if nested) and
/// its index within that parent.
#[derive(Debug, Clone, Copy)]
struct Location {
    frame: Option<usize>,
    index: usize,
}

/// The ordered node tree.
#[derive(Debug, Default)]
pub struct SceneTree {
    roots: Vec<Node>,
    changes: Vec<SceneChange>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level nodes in paint order.
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    fn locate(&self, id: NodeId) -> Option<Location> {
        for (i, node) in self.roots.iter().enumerate() {
            if node.id() == id {
                return Some(Location { frame: None, index: i });
            }
            if let Some(j) = node.as_frame().and_then(|f| f.child_index(id)) {
                return Some(Location {
                    frame: Some(i),
                    index: j,
                });
            }
        }
        None
    }

    fn siblings_mut(&mut self, frame: Option<usize>) -> Option<&mut Vec<Node>> {
        match frame {
            None => Some(&mut self.roots),
            Some(i) => self.roots.get_mut(i)?.as_frame_mut().map(|f| &mut f.children),
        }
    }

    fn frame_index(&self, id: NodeId) -> Option<usize> {
        self.roots.iter().position(|n| n.id() == id && n.is_frame())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.locate(id).is_some()
    }

    /// Depth-first lookup including frame children.
    pub fn find(&self, id: NodeId) -> Option<&Node> {
        let loc = self.locate(id)?;
        match loc.frame {
            None => self.roots.get(loc.index),
            Some(f) => self.roots.get(f)?.children().get(loc.index),
        }
    }

    /// Mutable lookup. Changes made through it are not reported; use
    /// [`SceneTree::update`] for reported edits.
    pub(crate) fn find_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let loc = self.locate(id)?;
        self.siblings_mut(loc.frame)?.get_mut(loc.index)
    }

    /// Edit a node in place and report `property` as changed.
    /// Returns false when the node does not exist.
    pub fn update(
        &mut self,
        id: NodeId,
        property: NodeProperty,
        f: impl FnOnce(&mut Node),
    ) -> bool {
        match self.find_mut(id) {
            Some(node) => {
                f(node);
                self.changes.push(SceneChange::PropertyChanged(id, property));
                true
            }
            None => false,
        }
    }

    /// Parent frame of a nested node. None for top-level or missing nodes.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let frame = self.locate(id)?.frame?;
        self.roots.get(frame).map(Node::id)
    }

    /// Ordered children of `parent`, or the top level when `parent` is None.
    /// A missing or non-frame parent has no children.
    pub fn children(&self, parent: Option<NodeId>) -> &[Node] {
        match parent {
            None => &self.roots,
            Some(id) => self.find(id).map(Node::children).unwrap_or(&[]),
        }
    }

    /// Index of a node among its siblings.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.locate(id).map(|loc| loc.index)
    }

    /// Position of a node in scene space.
    pub fn world_position(&self, id: NodeId) -> Option<Point> {
        let loc = self.locate(id)?;
        match loc.frame {
            None => self.roots.get(loc.index).map(|n| n.position),
            Some(f) => {
                let frame = self.roots.get(f)?;
                let child = frame.children().get(loc.index)?;
                Some(frame.position + child.position.to_vec2())
            }
        }
    }

    /// Axis-aligned bounds of a node in scene space.
    pub fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        let node = self.find(id)?;
        let origin = self.world_position(id)?;
        Some(node.local_bounds() + origin.to_vec2())
    }

    /// Insert `node` under `parent` (None = root) at `index`, appending when
    /// the index is None or out of range. A node already in the tree is
    /// detached first. Frames cannot be nested and the parent must be a
    /// frame; either violation leaves the tree untouched and returns false.
    pub fn add(&mut self, node: Node, parent: Option<NodeId>, index: Option<usize>) -> bool {
        let id = node.id();
        if let Some(parent_id) = parent {
            if node.is_frame() {
                log::warn!("Refusing to nest frame {} inside frame {}", id, parent_id);
                return false;
            }
            if self.frame_index(parent_id).is_none() {
                log::debug!("Parent {} of node {} is not a frame in the tree", parent_id, id);
                return false;
            }
        }

        let existed = self.detach(id).is_some();
        // Detaching may have shifted the parent frame.
        let frame = match parent {
            None => None,
            Some(parent_id) => match self.frame_index(parent_id) {
                Some(i) => Some(i),
                None => return false,
            },
        };
        let Some(siblings) = self.siblings_mut(frame) else {
            return false;
        };
        let at = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(at, node);

        self.changes.push(if existed {
            SceneChange::Reparented(id)
        } else {
            SceneChange::Added(id)
        });
        true
    }

    /// Detach a node without reporting it.
    fn detach(&mut self, id: NodeId) -> Option<Node> {
        let loc = self.locate(id)?;
        let siblings = self.siblings_mut(loc.frame)?;
        Some(siblings.remove(loc.index))
    }

    /// Remove a node (and, for a frame, its children). No-op if absent.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.detach(id)?;
        self.changes.push(SceneChange::Removed(id));
        Some(node)
    }

    /// Move a node under a new parent, placing it at `position` in the new
    /// parent's space. Appends at the end of the new parent's children.
    pub fn reparent(&mut self, id: NodeId, parent: Option<NodeId>, position: Point) -> bool {
        let Some(node) = self.find(id) else {
            return false;
        };
        if parent.is_some() && node.is_frame() {
            return false;
        }
        if let Some(parent_id) = parent {
            if parent_id == id || self.frame_index(parent_id).is_none() {
                return false;
            }
        }
        let Some(mut node) = self.detach(id) else {
            return false;
        };
        node.position = position;
        let frame = parent.and_then(|p| self.frame_index(p));
        let Some(siblings) = self.siblings_mut(frame) else {
            return false;
        };
        siblings.push(node);
        self.changes.push(SceneChange::Reparented(id));
        true
    }

    /// Move a node to `index` among its current siblings.
    pub fn reorder(&mut self, id: NodeId, index: usize) -> bool {
        let Some(loc) = self.locate(id) else {
            return false;
        };
        let parent = loc.frame.and_then(|f| self.roots.get(f)).map(Node::id);
        let Some(siblings) = self.siblings_mut(loc.frame) else {
            return false;
        };
        let node = siblings.remove(loc.index);
        let at = index.min(siblings.len());
        siblings.insert(at, node);
        if at != loc.index {
            self.changes.push(SceneChange::Reordered(parent));
        }
        true
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        for node in std::mem::take(&mut self.roots) {
            self.changes.push(SceneChange::Removed(node.id()));
        }
    }

    /// Serialize every non-internal node, frames with their children.
    pub fn snapshot(&self) -> Vec<Value> {
        record::nodes_to_values(&self.roots)
    }

    /// Replace the tree contents from a snapshot, keeping node identities.
    /// Malformed records are skipped.
    pub fn restore(&mut self, values: &[Value]) {
        let mut roots = Vec::with_capacity(values.len());
        for node in record::nodes_from_values(values, IdPolicy::Preserve) {
            // A record duplicated in a damaged snapshot keeps its first occurrence.
            let id = node.id();
            let duplicate = roots.iter().any(|n: &Node| {
                n.id() == id || n.as_frame().is_some_and(|f| f.child(id).is_some())
            });
            if duplicate {
                log::warn!("Skipping duplicate record {} in snapshot", id);
                continue;
            }
            roots.push(node);
        }
        self.roots = roots;
        self.changes.push(SceneChange::Restored);
    }

    /// Drain queued change notifications.
    pub fn take_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Ellipse, Frame, NodeKind, Rectangle};
    use uuid::Uuid;

    fn rect(x: f64, y: f64) -> Node {
        Node::new(Point::new(x, y), NodeKind::Rectangle(Rectangle::new(10.0, 10.0)))
    }

    fn frame(x: f64, y: f64) -> Node {
        Node::new(Point::new(x, y), NodeKind::Frame(Frame::new(200.0, 200.0)))
    }

    #[test]
    fn test_add_appends_and_inserts() {
        let mut tree = SceneTree::new();
        let a = rect(0.0, 0.0);
        let b = rect(1.0, 0.0);
        let c = rect(2.0, 0.0);
        let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
        assert!(tree.add(a, None, None));
        assert!(tree.add(b, None, None));
        assert!(tree.add(c, None, Some(0)));
        let order: Vec<_> = tree.roots().iter().map(Node::id).collect();
        assert_eq!(order, vec![c_id, a_id, b_id]);
        assert_eq!(
            tree.take_changes(),
            vec![SceneChange::Added(a_id), SceneChange::Added(b_id), SceneChange::Added(c_id)]
        );
        assert!(tree.take_changes().is_empty());
    }

    #[test]
    fn test_add_existing_node_detaches_first() {
        let mut tree = SceneTree::new();
        let f = frame(100.0, 100.0);
        let f_id = f.id();
        let node = rect(0.0, 0.0);
        let id = node.id();
        tree.add(f, None, None);
        tree.add(node.clone(), None, None);
        tree.take_changes();

        assert!(tree.add(node, Some(f_id), None));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.parent_of(id), Some(f_id));
        assert_eq!(tree.take_changes(), vec![SceneChange::Reparented(id)]);
    }

    #[test]
    fn test_frames_cannot_nest() {
        let mut tree = SceneTree::new();
        let outer = frame(0.0, 0.0);
        let outer_id = outer.id();
        tree.add(outer, None, None);
        assert!(!tree.add(frame(10.0, 10.0), Some(outer_id), None));
        assert!(!tree.add(rect(0.0, 0.0), Some(Uuid::new_v4()), None));
        assert_eq!(tree.len(), 1);
        assert!(tree.children(Some(outer_id)).is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut tree = SceneTree::new();
        assert!(tree.remove(Uuid::new_v4()).is_none());
        assert!(tree.take_changes().is_empty());
    }

    #[test]
    fn test_find_and_world_geometry_of_nested_node() {
        let mut tree = SceneTree::new();
        let f = frame(100.0, 50.0);
        let f_id = f.id();
        let child = Node::new(Point::new(10.0, 20.0), NodeKind::Ellipse(Ellipse::new(30.0, 40.0)));
        let child_id = child.id();
        tree.add(f, None, None);
        tree.add(child, Some(f_id), None);

        assert!(tree.find(child_id).is_some());
        assert_eq!(tree.world_position(child_id), Some(Point::new(110.0, 70.0)));
        assert_eq!(tree.world_bounds(child_id), Some(Rect::new(110.0, 70.0, 140.0, 110.0)));
        assert_eq!(tree.parent_of(f_id), None);
        assert_eq!(tree.children(Some(f_id)).len(), 1);
        assert_eq!(tree.len(), 1);
        assert!(tree.contains(child_id));
    }

    #[test]
    fn test_reparent_rewrites_position() {
        let mut tree = SceneTree::new();
        let f = frame(100.0, 100.0);
        let f_id = f.id();
        let node = rect(150.0, 160.0);
        let id = node.id();
        tree.add(f, None, None);
        tree.add(node, None, None);

        assert!(tree.reparent(id, Some(f_id), Point::new(50.0, 60.0)));
        assert_eq!(tree.world_position(id), Some(Point::new(150.0, 160.0)));
        assert!(tree.reparent(id, None, Point::new(150.0, 160.0)));
        assert_eq!(tree.parent_of(id), None);
        assert!(!tree.reparent(f_id, Some(f_id), Point::ZERO));
    }

    #[test]
    fn test_reorder() {
        let mut tree = SceneTree::new();
        let a = rect(0.0, 0.0);
        let b = rect(0.0, 0.0);
        let (a_id, b_id) = (a.id(), b.id());
        tree.add(a, None, None);
        tree.add(b, None, None);
        tree.take_changes();
        assert!(tree.reorder(a_id, 5));
        assert_eq!(tree.index_of(a_id), Some(1));
        assert_eq!(tree.index_of(b_id), Some(0));
        assert_eq!(tree.take_changes(), vec![SceneChange::Reordered(None)]);
    }

    #[test]
    fn test_snapshot_restore_keeps_ids() {
        let mut tree = SceneTree::new();
        let f = frame(0.0, 0.0);
        let f_id = f.id();
        let child = rect(5.0, 5.0);
        let child_id = child.id();
        tree.add(f, None, None);
        tree.add(child, Some(f_id), None);
        tree.add(rect(1.0, 1.0).into_internal(), None, None);

        let snapshot = tree.snapshot();
        assert_eq!(snapshot.len(), 1);
        tree.clear();
        assert!(tree.is_empty());

        tree.restore(&snapshot);
        assert_eq!(tree.parent_of(child_id), Some(f_id));
        assert!(tree.take_changes().contains(&SceneChange::Restored));
    }

    #[test]
    fn test_property_relevance() {
        let id = Uuid::new_v4();
        assert!(SceneChange::PropertyChanged(id, NodeProperty::Locked).is_layer_relevant());
        assert!(!SceneChange::PropertyChanged(id, NodeProperty::Position).is_layer_relevant());
        assert!(SceneChange::Removed(id).is_layer_relevant());
    }
}
