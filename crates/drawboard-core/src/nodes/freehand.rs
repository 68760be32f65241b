//! Freehand (pen) path geometry.

use super::polygon::points_bounds;
use super::NodeGeometry;
use kurbo::{Point, Rect, Vec2};

/// An open polyline sampled from a pen stroke.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Freehand {
    pub points: Vec<Point>,
}

impl Freehand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Append a sample if it lies further than `min_spacing` from the last one.
    ///
    /// Returns whether the sample was recorded.
    pub fn push_sample(&mut self, point: Point, min_spacing: f64) -> bool {
        match self.points.last() {
            Some(last) if last.distance(point) <= min_spacing => false,
            _ => {
                self.points.push(point);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shift the points so their bounding box starts at the origin.
    ///
    /// Returns the offset removed from every point.
    pub fn normalize(&mut self) -> Vec2 {
        let Some(bounds) = points_bounds(&self.points) else {
            return Vec2::ZERO;
        };
        let offset = bounds.origin().to_vec2();
        for point in &mut self.points {
            *point -= offset;
        }
        offset
    }
}

impl NodeGeometry for Freehand {
    fn local_bounds(&self) -> Rect {
        points_bounds(&self.points).unwrap_or(Rect::ZERO)
    }
}
