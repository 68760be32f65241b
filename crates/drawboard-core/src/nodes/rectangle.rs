//! Rectangle node geometry.

use super::NodeGeometry;
use kurbo::Rect;

/// An axis-aligned rectangle. Corner rounding comes from the node style.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl NodeGeometry for Rectangle {
    fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}
