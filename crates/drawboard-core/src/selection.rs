//! Selection and hover state.
//!
//! This is UI state kept apart from the scene tree: the tree knows nothing
//! about which nodes are selected, and the selection is pruned against the
//! tree after every operation.

use crate::nodes::NodeId;
use crate::scene::SceneTree;

/// Ordered set of selected nodes plus the layer currently hovered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: Vec<NodeId>,
    hovered: Option<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected ids in selection order.
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    /// The only selected node, if exactly one is selected.
    pub fn single(&self) -> Option<NodeId> {
        match self.ids.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    /// Select a single node. Returns whether the selection changed.
    pub fn select(&mut self, id: NodeId) -> bool {
        self.set(&[id])
    }

    /// Replace the selection, dropping repeated ids.
    pub fn set(&mut self, ids: &[NodeId]) -> bool {
        let mut next = Vec::with_capacity(ids.len());
        for &id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        if next == self.ids {
            return false;
        }
        self.ids = next;
        true
    }

    pub fn add(&mut self, id: NodeId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn clear(&mut self) -> bool {
        if self.ids.is_empty() {
            return false;
        }
        self.ids.clear();
        true
    }

    /// Drop selected ids that no longer exist in `tree`.
    pub fn retain_live(&mut self, tree: &SceneTree) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&id| tree.contains(id));
        self.ids.len() != before
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Forget a hovered node that no longer exists in `tree`, returning it.
    pub fn prune_hover(&mut self, tree: &SceneTree) -> Option<NodeId> {
        self.hovered.take_if(|id| !tree.contains(*id))
    }

    /// Set the hovered node, returning the previous one.
    pub fn set_hovered(&mut self, id: Option<NodeId>) -> Option<NodeId> {
        std::mem::replace(&mut self.hovered, id)
    }
}
