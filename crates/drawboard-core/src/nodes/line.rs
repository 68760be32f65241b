//! Line node geometry.

use super::NodeGeometry;
use kurbo::{Point, Rect};

/// A straight segment between two local points.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

impl NodeGeometry for Line {
    fn local_bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_normalize_direction() {
        let line = Line::new(Point::new(10.0, 0.0), Point::new(0.0, 10.0));
        let bounds = line.local_bounds();
        assert!(bounds.x0.abs() < f64::EPSILON);
        assert!((bounds.x1 - 10.0).abs() < f64::EPSILON);
        assert!((line.length() - 200f64.sqrt()).abs() < 1e-9);
    }
}
