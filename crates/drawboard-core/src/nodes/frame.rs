//! Frame node: a container holding one level of child nodes.

use super::{Node, NodeGeometry};
use kurbo::Rect;

/// A rectangular container. Children are positioned in the frame's local space.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    /// Child nodes, back to front.
    pub children: Vec<Node>,
}

impl Frame {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            children: Vec::new(),
        }
    }

    pub fn child(&self, id: super::NodeId) -> Option<&Node> {
        self.children.iter().find(|c| c.id() == id)
    }

    pub fn child_index(&self, id: super::NodeId) -> Option<usize> {
        self.children.iter().position(|c| c.id() == id)
    }
}

impl NodeGeometry for Frame {
    fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}
