//! Arrow node geometry.

use super::NodeGeometry;
use kurbo::{Point, Rect};

/// A two-point line with an arrowhead at `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub start: Point,
    pub end: Point,
    /// Length of the arrowhead strokes.
    pub head_size: f64,
}

impl Arrow {
    pub const DEFAULT_HEAD_SIZE: f64 = 15.0;

    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            head_size: Self::DEFAULT_HEAD_SIZE,
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

impl NodeGeometry for Arrow {
    fn local_bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }
}
