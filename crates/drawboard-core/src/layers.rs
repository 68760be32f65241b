//! Layer list projection and layer-list reordering.

use crate::nodes::{Node, NodeId};
use crate::scene::SceneTree;
use serde::{Deserialize, Serialize};

/// One row of the layer panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerEntry {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub visible: bool,
    pub locked: bool,
    /// Frame children, topmost first. Absent for other nodes and empty frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<LayerEntry>>,
}

impl LayerEntry {
    fn from_node(node: &Node) -> Self {
        let children = node
            .is_frame()
            .then(|| project_nodes(node.children()))
            .filter(|children| !children.is_empty());
        Self {
            id: node.id(),
            name: node.display_name(),
            node_type: node.node_type().tag().to_string(),
            visible: node.visible,
            locked: node.locked,
            children,
        }
    }
}

fn project_nodes(nodes: &[Node]) -> Vec<LayerEntry> {
    nodes
        .iter()
        .rev()
        .filter(|node| !node.internal)
        .map(LayerEntry::from_node)
        .collect()
}

/// Layer list of the whole tree, topmost node first.
pub fn project(tree: &SceneTree) -> Vec<LayerEntry> {
    project_nodes(tree.roots())
}

/// Where a dragged layer lands relative to the target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderPosition {
    /// Above the target in the list, i.e. painted over it.
    Before,
    /// Below the target in the list, i.e. painted under it.
    After,
}

/// Move `drag` next to `target` in layer-list terms. A target in another
/// parent moves the dragged node into that parent, keeping its world
/// position. Returns false (and changes nothing) when either id is missing,
/// both are the same, or the move would nest a frame.
pub fn reorder(
    tree: &mut SceneTree,
    drag: NodeId,
    target: NodeId,
    position: ReorderPosition,
) -> bool {
    if drag == target || !tree.contains(target) {
        return false;
    }
    let Some(node) = tree.find(drag) else {
        return false;
    };
    let parent = tree.parent_of(target);
    if parent.is_some() && node.is_frame() {
        return false;
    }

    let mut moved = node.clone();
    if tree.parent_of(drag) != parent {
        let Some(world) = tree.world_position(drag) else {
            return false;
        };
        let origin = parent
            .and_then(|p| tree.find(p))
            .map(|frame| frame.position.to_vec2())
            .unwrap_or_default();
        moved.position = world - origin;
    }

    // Target index once the dragged node is detached.
    let Some(mut target_index) = tree.index_of(target) else {
        return false;
    };
    if tree.parent_of(drag) == parent && tree.index_of(drag).is_some_and(|i| i < target_index) {
        target_index -= 1;
    }
    let insert_at = match position {
        ReorderPosition::Before => target_index + 1,
        ReorderPosition::After => target_index,
    };
    tree.add(moved, parent, Some(insert_at))
}
