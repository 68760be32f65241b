//! Node definitions for the drawing board.
//!
//! A [`Node`] carries the attributes every scene element shares (identity,
//! name, position, style, flags) and a [`NodeKind`] holding the geometry of
//! its concrete type. Geometry is stored in node-local coordinates relative
//! to `position`, so moving a node between parents only rewrites `position`.

mod arrow;
mod ellipse;
mod frame;
mod freehand;
mod image;
mod line;
mod polygon;
mod rectangle;
mod text;

pub use arrow::Arrow;
pub use ellipse::Ellipse;
pub use frame::Frame;
pub use freehand::Freehand;
pub use image::{decode_dimensions, Image, ImageFormat, ImageSource};
pub use line::Line;
pub use polygon::Polygon;
pub use rectangle::Rectangle;
pub use text::Text;

use kurbo::{Point, Rect, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for nodes.
pub type NodeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties shared by every node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill: Option<SerializableColor>,
    /// Stroke color (None = no stroke).
    #[serde(default)]
    pub stroke: Option<SerializableColor>,
    /// Stroke width.
    #[serde(default)]
    pub stroke_width: f64,
    /// Corner radius (0 = sharp corners). Only rectangles and frames render it.
    #[serde(default)]
    pub corner_radius: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: Some(SerializableColor::black()),
            stroke_width: 2.0,
            corner_radius: 0.0,
            opacity: 1.0,
        }
    }
}

impl NodeStyle {
    /// A filled style without stroke.
    pub fn filled(fill: SerializableColor) -> Self {
        Self {
            fill: Some(fill),
            stroke: None,
            stroke_width: 0.0,
            ..Self::default()
        }
    }

    /// A stroke-only style.
    pub fn stroked(stroke: SerializableColor, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke),
            stroke_width: width,
            ..Self::default()
        }
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius;
        self
    }

    /// Get the stroke color as a peniko Color.
    pub fn stroke_color(&self) -> Option<Color> {
        self.stroke.map(Into::into)
    }
}

/// Type tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Rectangle,
    Ellipse,
    Polygon,
    Text,
    Image,
    Line,
    Arrow,
    FreehandPath,
    Frame,
}

impl NodeType {
    /// Stable tag used in records and layer entries.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeType::Rectangle => "Rectangle",
            NodeType::Ellipse => "Ellipse",
            NodeType::Polygon => "Polygon",
            NodeType::Text => "Text",
            NodeType::Image => "Image",
            NodeType::Line => "Line",
            NodeType::Arrow => "Arrow",
            NodeType::FreehandPath => "FreehandPath",
            NodeType::Frame => "Frame",
        }
    }

    /// Label a freshly created node of this type is named with.
    pub fn default_name(&self) -> &'static str {
        match self {
            NodeType::Rectangle => "Rectangle",
            NodeType::Ellipse => "Ellipse",
            NodeType::Polygon => "Polygon",
            NodeType::Text => "Text",
            NodeType::Image => "Image",
            NodeType::Line => "Line",
            NodeType::Arrow => "Arrow",
            NodeType::FreehandPath => "Pen",
            NodeType::Frame => "Frame",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Geometry common to all node kinds, in node-local coordinates.
pub trait NodeGeometry {
    /// Bounding box relative to the node's position.
    fn local_bounds(&self) -> Rect;
}

/// Closed set of node kinds with their geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Polygon(Polygon),
    Text(Text),
    Image(Image),
    Line(Line),
    Arrow(Arrow),
    FreehandPath(Freehand),
    Frame(Frame),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Rectangle(_) => NodeType::Rectangle,
            NodeKind::Ellipse(_) => NodeType::Ellipse,
            NodeKind::Polygon(_) => NodeType::Polygon,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Image(_) => NodeType::Image,
            NodeKind::Line(_) => NodeType::Line,
            NodeKind::Arrow(_) => NodeType::Arrow,
            NodeKind::FreehandPath(_) => NodeType::FreehandPath,
            NodeKind::Frame(_) => NodeType::Frame,
        }
    }

    fn geometry(&self) -> &dyn NodeGeometry {
        match self {
            NodeKind::Rectangle(g) => g,
            NodeKind::Ellipse(g) => g,
            NodeKind::Polygon(g) => g,
            NodeKind::Text(g) => g,
            NodeKind::Image(g) => g,
            NodeKind::Line(g) => g,
            NodeKind::Arrow(g) => g,
            NodeKind::FreehandPath(g) => g,
            NodeKind::Frame(g) => g,
        }
    }
}

/// A single element of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    /// User-editable display name.
    pub name: String,
    /// Origin of the node in its parent's coordinate space.
    pub position: Point,
    /// Style properties.
    pub style: NodeStyle,
    /// Whether the node is painted.
    pub visible: bool,
    /// Whether the node is protected from interactive editing.
    pub locked: bool,
    /// Engine-owned decoration that never shows up in layers, clipboard or history.
    pub internal: bool,
    /// Type-specific geometry.
    pub kind: NodeKind,
}

impl Node {
    /// Create a node with a fresh identity, the type's default name and default style.
    pub fn new(position: Point, kind: NodeKind) -> Self {
        Self::with_id(Uuid::new_v4(), position, kind)
    }

    /// Create a node with a specific identity (record restoration).
    pub(crate) fn with_id(id: NodeId, position: Point, kind: NodeKind) -> Self {
        Self {
            id,
            name: kind.node_type().default_name().to_string(),
            position,
            style: NodeStyle::default(),
            visible: true,
            locked: false,
            internal: false,
            kind,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    /// Mark the node as an engine-owned decoration.
    pub fn into_internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.kind, NodeKind::Frame(_))
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match &self.kind {
            NodeKind::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_frame_mut(&mut self) -> Option<&mut Frame> {
        match &mut self.kind {
            NodeKind::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Children of a frame; empty for every other kind.
    pub fn children(&self) -> &[Node] {
        self.as_frame().map(|f| f.children.as_slice()).unwrap_or(&[])
    }

    /// Bounding box relative to the node's own position.
    pub fn local_bounds(&self) -> Rect {
        self.kind.geometry().local_bounds()
    }

    /// Bounding box in the parent's coordinate space.
    pub fn bounds(&self) -> Rect {
        self.local_bounds() + self.position.to_vec2()
    }

    pub fn size(&self) -> Size {
        self.local_bounds().size()
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Name shown in the layer list.
    pub fn display_name(&self) -> String {
        match &self.kind {
            NodeKind::Text(text) if !text.content.is_empty() => text.content.clone(),
            NodeKind::Text(_) => NodeType::Text.default_name().to_string(),
            _ if !self.name.is_empty() => self.name.clone(),
            _ => self.node_type().tag().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_conversion_round_trip() {
        let color = SerializableColor::new(0x32, 0xcd, 0x79, 0x80);
        let renderer: Color = color.into();
        assert_eq!(SerializableColor::from(renderer), color);

        let style = NodeStyle::stroked(color, 1.0);
        assert_eq!(style.stroke_color().map(SerializableColor::from), Some(color));
        assert_eq!(NodeStyle::filled(color).stroke_color(), None);
    }

    #[test]
    fn test_bounds_follow_position() {
        let rect = Rectangle::new(100.0, 50.0);
        let node = Node::new(Point::new(10.0, 20.0), NodeKind::Rectangle(rect));
        let bounds = node.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 110.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_name() {
        let rect = Node::new(Point::ZERO, NodeKind::Rectangle(Rectangle::new(1.0, 1.0)));
        assert_eq!(rect.display_name(), "Rectangle");

        let renamed = rect.with_name("Header");
        assert_eq!(renamed.display_name(), "Header");

        let unnamed =
            Node::new(Point::ZERO, NodeKind::Ellipse(Ellipse::new(1.0, 1.0))).with_name("");
        assert_eq!(unnamed.display_name(), "Ellipse");

        let text = Node::new(Point::ZERO, NodeKind::Text(Text::new("Hello", 24.0)));
        assert_eq!(text.display_name(), "Hello");

        let empty = Node::new(Point::ZERO, NodeKind::Text(Text::new("", 24.0)));
        assert_eq!(empty.display_name(), "Text");
    }

    #[test]
    fn test_children_of_non_frame_is_empty() {
        let line = Line::new(Point::ZERO, Point::new(5.0, 5.0));
        let node = Node::new(Point::ZERO, NodeKind::Line(line));
        assert!(node.children().is_empty());
        assert!(!node.is_frame());
    }
}
