//! Polygon node geometry (diamonds and closed pen strokes).

use super::NodeGeometry;
use kurbo::{Point, Rect, Vec2};

/// A closed polygon whose vertices live inside a `width` x `height` box.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub width: f64,
    pub height: f64,
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(width: f64, height: f64, points: Vec<Point>) -> Self {
        Self {
            width,
            height,
            points,
        }
    }

    /// Diamond with vertices at the edge midpoints: top, right, bottom, left.
    pub fn diamond(width: f64, height: f64) -> Self {
        Self::new(width, height, diamond_points(width, height))
    }

    /// Resize a diamond, recomputing its four vertices.
    pub fn set_diamond_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.points = diamond_points(width, height);
    }

    /// Build a polygon from arbitrary points.
    ///
    /// Returns the polygon with vertices shifted so its bounding box starts
    /// at the origin, and the offset that was removed from them.
    pub fn from_points(points: &[Point]) -> (Vec2, Self) {
        let Some(bounds) = points_bounds(points) else {
            return (Vec2::ZERO, Self::new(0.0, 0.0, Vec::new()));
        };
        let offset = bounds.origin().to_vec2();
        let shifted = points.iter().map(|p| *p - offset).collect();
        (offset, Self::new(bounds.width(), bounds.height(), shifted))
    }
}

fn diamond_points(width: f64, height: f64) -> Vec<Point> {
    vec![
        Point::new(width / 2.0, 0.0),
        Point::new(width, height / 2.0),
        Point::new(width / 2.0, height),
        Point::new(0.0, height / 2.0),
    ]
}

/// Bounding box of a point list, `None` when empty.
pub(crate) fn points_bounds(points: &[Point]) -> Option<Rect> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .skip(1)
            .fold(Rect::from_points(first, first), |rect, p| rect.union_pt(*p)),
    )
}

impl NodeGeometry for Polygon {
    fn local_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}
