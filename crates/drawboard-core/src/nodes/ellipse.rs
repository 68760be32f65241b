//! Ellipse node geometry.

use super::NodeGeometry;
use kurbo::Rect;

/// An ellipse inscribed in a `width` x `height` box.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    pub width: f64,
    pub height: f64,
}

impl Ellipse {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl NodeGeometry for Ellipse {
    fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}
