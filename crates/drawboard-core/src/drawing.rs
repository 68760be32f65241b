//! Drawing sessions: one gesture that creates one node.

use crate::config::EngineConfig;
use crate::nodes::{
    Arrow, Ellipse, Frame, Freehand, Line, Node, NodeId, NodeKind, NodeStyle, Polygon, Rectangle,
    SerializableColor,
};
use crate::tools::ToolMode;
use kurbo::{Point, Rect};

const RECT_FILL: SerializableColor = SerializableColor::new(0x32, 0xcd, 0x79, 255);
const RECT_CORNER_RADIUS: f64 = 10.0;
const ELLIPSE_FILL: SerializableColor = SerializableColor::new(0xff, 0xff, 0x00, 255);
const DIAMOND_FILL: SerializableColor = SerializableColor::new(0x00, 0x00, 0xff, 255);
const FRAME_STROKE: SerializableColor = SerializableColor::new(0xd0, 0xd0, 0xd0, 255);
const INK: SerializableColor = SerializableColor::new(0x33, 0x33, 0x33, 255);

/// Style a node created in `mode` starts with.
pub fn default_style(mode: ToolMode) -> NodeStyle {
    match mode {
        ToolMode::Rect => NodeStyle::filled(RECT_FILL).with_corner_radius(RECT_CORNER_RADIUS),
        ToolMode::Ellipse => NodeStyle::filled(ELLIPSE_FILL),
        ToolMode::Diamond => NodeStyle::filled(DIAMOND_FILL),
        ToolMode::Frame => NodeStyle {
            fill: Some(SerializableColor::white()),
            ..NodeStyle::stroked(FRAME_STROKE, 1.0)
        },
        ToolMode::Text => NodeStyle::filled(INK),
        ToolMode::Line | ToolMode::Arrow | ToolMode::Pen => NodeStyle::stroked(INK, 2.0),
        ToolMode::Select => NodeStyle::default(),
    }
}

/// How a finished session ends.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Keep the live node as it is.
    Commit,
    /// Swap the live node for a different one (a pen loop becoming a polygon).
    Replace(Node),
    /// Remove the live node; nothing is recorded.
    Discard,
}

/// An in-progress drawing gesture.
#[derive(Debug, Clone)]
pub struct DrawingSession {
    mode: ToolMode,
    anchor: Point,
    node_id: NodeId,
}

impl DrawingSession {
    /// Start a session at `anchor`, returning it with the zero-size live node
    /// to insert into the tree. None for modes that do not draw.
    pub fn begin(mode: ToolMode, anchor: Point) -> Option<(Self, Node)> {
        let kind = match mode {
            ToolMode::Rect => NodeKind::Rectangle(Rectangle::new(0.0, 0.0)),
            ToolMode::Ellipse => NodeKind::Ellipse(Ellipse::new(0.0, 0.0)),
            ToolMode::Diamond => NodeKind::Polygon(Polygon::diamond(0.0, 0.0)),
            ToolMode::Frame => NodeKind::Frame(Frame::new(0.0, 0.0)),
            ToolMode::Line => NodeKind::Line(Line::new(Point::ZERO, Point::ZERO)),
            ToolMode::Arrow => NodeKind::Arrow(Arrow::new(Point::ZERO, Point::ZERO)),
            ToolMode::Pen => NodeKind::FreehandPath(Freehand::from_points(vec![Point::ZERO])),
            ToolMode::Select | ToolMode::Text => return None,
        };
        let mut node = Node::new(anchor, kind).with_style(default_style(mode));
        if mode == ToolMode::Diamond {
            // Diamonds are polygons but keep their own label.
            node.name = "Diamond".to_string();
        }
        Some((Self::new(mode, anchor, node.id()), node))
    }

    fn new(mode: ToolMode, anchor: Point, node_id: NodeId) -> Self {
        Self {
            mode,
            anchor,
            node_id,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Update the live node for a pointer move to `point` (scene space).
    pub fn update(&self, node: &mut Node, point: Point, config: &EngineConfig) {
        let rect = Rect::from_points(self.anchor, point);
        match &mut node.kind {
            NodeKind::Rectangle(r) => {
                node.position = rect.origin();
                r.width = rect.width();
                r.height = rect.height();
            }
            NodeKind::Ellipse(e) => {
                node.position = rect.origin();
                e.width = rect.width();
                e.height = rect.height();
            }
            NodeKind::Frame(f) => {
                node.position = rect.origin();
                f.width = rect.width();
                f.height = rect.height();
            }
            NodeKind::Polygon(p) => {
                node.position = rect.origin();
                p.set_diamond_size(rect.width(), rect.height());
            }
            NodeKind::Line(l) => l.end = point - self.anchor.to_vec2(),
            NodeKind::Arrow(a) => a.end = point - self.anchor.to_vec2(),
            NodeKind::FreehandPath(f) => {
                f.push_sample(point - self.anchor.to_vec2(), config.pen_sample_spacing);
            }
            NodeKind::Text(_) | NodeKind::Image(_) => {}
        }
    }

    /// Decide whether the live node survives gesture-up.
    pub fn finish(&self, node: &Node, config: &EngineConfig) -> SessionOutcome {
        match &node.kind {
            NodeKind::Rectangle(_)
            | NodeKind::Ellipse(_)
            | NodeKind::Frame(_)
            | NodeKind::Polygon(_) => {
                let size = node.size();
                if size.width < config.min_shape_size || size.height < config.min_shape_size {
                    SessionOutcome::Discard
                } else {
                    SessionOutcome::Commit
                }
            }
            NodeKind::Line(l) if l.length() < config.min_line_length => SessionOutcome::Discard,
            NodeKind::Arrow(a) if a.length() < config.min_line_length => SessionOutcome::Discard,
            NodeKind::Line(_) | NodeKind::Arrow(_) => SessionOutcome::Commit,
            NodeKind::FreehandPath(stroke) => finish_pen(node, stroke, config),
            NodeKind::Text(_) | NodeKind::Image(_) => SessionOutcome::Commit,
        }
    }
}

fn finish_pen(node: &Node, stroke: &Freehand, config: &EngineConfig) -> SessionOutcome {
    if stroke.len() < config.pen_min_points {
        return SessionOutcome::Discard;
    }
    let (Some(&first), Some(&last)) = (stroke.points.first(), stroke.points.last()) else {
        return SessionOutcome::Discard;
    };

    if first.distance(last) >= config.pen_close_distance {
        let mut open = stroke.clone();
        let offset = open.normalize();
        let mut committed = node.clone();
        committed.position += offset;
        committed.kind = NodeKind::FreehandPath(open);
        return SessionOutcome::Replace(committed);
    }

    // Drop the closing tail the user drew back toward the start.
    let mut points = stroke.points.clone();
    while points.len() > 3 {
        match points.last() {
            Some(p) if p.distance(first) < config.pen_close_distance => {
                points.pop();
            }
            _ => break,
        }
    }

    let (offset, polygon) = Polygon::from_points(&points);
    let mut style = node.style.clone();
    style.fill = style.stroke;
    let mut closed = Node::with_id(node.id(), node.position + offset, NodeKind::Polygon(polygon))
        .with_name(node.name.clone())
        .with_style(style);
    closed.visible = node.visible;
    closed.locked = node.locked;
    SessionOutcome::Replace(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeType;

    fn draw(mode: ToolMode, points: &[Point]) -> (DrawingSession, Node) {
        let config = EngineConfig::default();
        let (session, mut node) = DrawingSession::begin(mode, points[0]).unwrap();
        for p in &points[1..] {
            session.update(&mut node, *p, &config);
        }
        (session, node)
    }

    #[test]
    fn test_select_and_text_do_not_draw() {
        assert!(DrawingSession::begin(ToolMode::Select, Point::ZERO).is_none());
        assert!(DrawingSession::begin(ToolMode::Text, Point::ZERO).is_none());
    }

    #[test]
    fn test_rect_normalizes_drag_direction() {
        let corners = [Point::new(100.0, 100.0), Point::new(40.0, 150.0)];
        let (session, node) = draw(ToolMode::Rect, &corners);
        assert_eq!(node.position, Point::new(40.0, 100.0));
        assert!((node.size().width - 60.0).abs() < f64::EPSILON);
        assert!((node.size().height - 50.0).abs() < f64::EPSILON);
        assert_eq!(session.finish(&node, &EngineConfig::default()), SessionOutcome::Commit);
        assert_eq!(node.style.corner_radius, RECT_CORNER_RADIUS);
    }

    #[test]
    fn test_small_rect_is_discarded() {
        let (session, node) = draw(ToolMode::Rect, &[Point::ZERO, Point::new(3.0, 3.0)]);
        assert_eq!(session.finish(&node, &EngineConfig::default()), SessionOutcome::Discard);

        let (session, node) = draw(ToolMode::Ellipse, &[Point::ZERO, Point::new(50.0, 4.0)]);
        assert_eq!(session.finish(&node, &EngineConfig::default()), SessionOutcome::Discard);
    }

    #[test]
    fn test_diamond_vertices_follow_box() {
        let (_, node) = draw(ToolMode::Diamond, &[Point::new(10.0, 10.0), Point::new(50.0, 30.0)]);
        let NodeKind::Polygon(p) = &node.kind else {
            panic!("diamond should be a polygon");
        };
        assert_eq!(
            p.points,
            vec![
                Point::new(20.0, 0.0),
                Point::new(40.0, 10.0),
                Point::new(20.0, 20.0),
                Point::new(0.0, 10.0)
            ]
        );
        assert_eq!(node.name, "Diamond");
    }

    #[test]
    fn test_line_length_threshold() {
        let config = EngineConfig::default();
        let (session, node) = draw(ToolMode::Line, &[Point::new(5.0, 5.0), Point::new(8.0, 8.0)]);
        assert_eq!(session.finish(&node, &config), SessionOutcome::Discard);

        let (session, node) = draw(ToolMode::Arrow, &[Point::new(5.0, 5.0), Point::new(50.0, 5.0)]);
        assert_eq!(session.finish(&node, &config), SessionOutcome::Commit);
        let NodeKind::Arrow(a) = &node.kind else {
            panic!("expected arrow");
        };
        assert_eq!(a.end, Point::new(45.0, 0.0));
    }

    #[test]
    fn test_pen_sample_spacing() {
        let (_, node) = draw(
            ToolMode::Pen,
            &[Point::ZERO, Point::new(1.0, 0.0), Point::new(2.5, 0.0), Point::new(3.0, 0.0)],
        );
        let NodeKind::FreehandPath(f) = &node.kind else {
            panic!("expected freehand");
        };
        assert_eq!(f.points, vec![Point::ZERO, Point::new(2.5, 0.0)]);
    }

    #[test]
    fn test_pen_too_few_points_is_discarded() {
        let (session, node) = draw(ToolMode::Pen, &[Point::ZERO, Point::new(30.0, 0.0)]);
        assert_eq!(session.finish(&node, &EngineConfig::default()), SessionOutcome::Discard);
    }

    #[test]
    fn test_pen_open_stroke_stays_freehand() {
        let (session, node) = draw(
            ToolMode::Pen,
            &[Point::new(10.0, 10.0), Point::new(20.0, 20.0), Point::new(40.0, 10.0)],
        );
        let outcome = session.finish(&node, &EngineConfig::default());
        let SessionOutcome::Replace(committed) = outcome else {
            panic!("open stroke should be normalized");
        };
        assert_eq!(committed.id(), node.id());
        assert_eq!(committed.node_type(), NodeType::FreehandPath);
        assert_eq!(committed.position, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_pen_loop_closes_into_polygon() {
        let stroke = [
            Point::new(0.0, 0.0),
            Point::new(40.0, 0.0),
            Point::new(40.0, 40.0),
            Point::new(0.0, 40.0),
            Point::new(5.0, 10.0),
            Point::new(2.0, 4.0),
        ];
        let (session, node) = draw(ToolMode::Pen, &stroke);
        let SessionOutcome::Replace(closed) = session.finish(&node, &EngineConfig::default()) else {
            panic!("loop should close");
        };
        let NodeKind::Polygon(p) = &closed.kind else {
            panic!("expected polygon");
        };
        assert_eq!(p.points.len(), 4);
        assert_eq!(closed.id(), node.id());
        assert!(closed.style.fill.is_some());
    }

    #[test]
    fn test_pen_trim_keeps_three_points() {
        let stroke = [
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(6.0, 0.0),
            Point::new(9.0, 0.0),
        ];
        let (session, node) = draw(ToolMode::Pen, &stroke);
        let SessionOutcome::Replace(closed) = session.finish(&node, &EngineConfig::default()) else {
            panic!("short loop should close");
        };
        let NodeKind::Polygon(p) = &closed.kind else {
            panic!("expected polygon");
        };
        assert_eq!(p.points.len(), 3);
    }
}
