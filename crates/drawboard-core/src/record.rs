//! Serialized node records.
//!
//! Records are the one wire format of the engine: the clipboard payload and
//! history snapshots are both lists of records. Each record is kept as a
//! `serde_json::Value` until it is needed so that a single malformed entry
//! can be skipped without discarding the rest of a batch.

use crate::error::{RecordError, RecordResult};
use crate::nodes::{
    Arrow, Ellipse, Frame, Freehand, Image, ImageSource, Line, Node, NodeId, NodeKind, NodeStyle,
    NodeType, Polygon, Rectangle, Text,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const KEY_TYPE: &str = "type";

const KNOWN_TYPES: [NodeType; 9] = [
    NodeType::Rectangle,
    NodeType::Ellipse,
    NodeType::Polygon,
    NodeType::Text,
    NodeType::Image,
    NodeType::Line,
    NodeType::Arrow,
    NodeType::FreehandPath,
    NodeType::Frame,
];

/// How identities are assigned when records become nodes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Keep the recorded identity (history restore).
    Preserve,
    /// Mint a fresh identity for the node and all its children (paste).
    Fresh,
}

/// A serialized node: common attributes plus type-tagged geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub style: NodeStyle,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(flatten)]
    pub geometry: GeometryRecord,
}

fn default_true() -> bool {
    true
}

/// Type-specific part of a record, tagged by the node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeometryRecord {
    Rectangle {
        width: f64,
        height: f64,
    },
    Ellipse {
        width: f64,
        height: f64,
    },
    Polygon {
        width: f64,
        height: f64,
        points: Vec<Point>,
    },
    Text {
        text: String,
        font_size: f64,
    },
    Image {
        width: f64,
        height: f64,
        source_width: u32,
        source_height: u32,
        source: ImageSource,
    },
    Line {
        start: Point,
        end: Point,
    },
    Arrow {
        start: Point,
        end: Point,
        #[serde(default = "default_head_size")]
        head_size: f64,
    },
    FreehandPath {
        points: Vec<Point>,
    },
    Frame {
        width: f64,
        height: f64,
        #[serde(default)]
        children: Vec<Value>,
    },
}

fn default_head_size() -> f64 {
    Arrow::DEFAULT_HEAD_SIZE
}

impl NodeRecord {
    /// Serialize a node. Internal children of frames are left out.
    pub fn from_node(node: &Node) -> Self {
        let geometry = match &node.kind {
            NodeKind::Rectangle(r) => GeometryRecord::Rectangle {
                width: r.width,
                height: r.height,
            },
            NodeKind::Ellipse(e) => GeometryRecord::Ellipse {
                width: e.width,
                height: e.height,
            },
            NodeKind::Polygon(p) => GeometryRecord::Polygon {
                width: p.width,
                height: p.height,
                points: p.points.clone(),
            },
            NodeKind::Text(t) => GeometryRecord::Text {
                text: t.content.clone(),
                font_size: t.font_size,
            },
            NodeKind::Image(i) => GeometryRecord::Image {
                width: i.width,
                height: i.height,
                source_width: i.source_width,
                source_height: i.source_height,
                source: i.source.clone(),
            },
            NodeKind::Line(l) => GeometryRecord::Line {
                start: l.start,
                end: l.end,
            },
            NodeKind::Arrow(a) => GeometryRecord::Arrow {
                start: a.start,
                end: a.end,
                head_size: a.head_size,
            },
            NodeKind::FreehandPath(f) => GeometryRecord::FreehandPath {
                points: f.points.clone(),
            },
            NodeKind::Frame(f) => GeometryRecord::Frame {
                width: f.width,
                height: f.height,
                children: f
                    .children
                    .iter()
                    .filter(|child| !child.internal)
                    .filter_map(|child| node_to_value(child).ok())
                    .collect(),
            },
        };

        Self {
            id: node.id(),
            name: node.name.clone(),
            x: node.position.x,
            y: node.position.y,
            style: node.style.clone(),
            visible: node.visible,
            locked: node.locked,
            geometry,
        }
    }

    /// Parse a record, distinguishing unknown type tags from other damage.
    pub fn from_value(value: &Value) -> RecordResult<Self> {
        if let Some(tag) = value.get(KEY_TYPE).and_then(Value::as_str) {
            if !KNOWN_TYPES.iter().any(|t| t.tag() == tag) {
                return Err(RecordError::UnknownType(tag.to_string()));
            }
        }
        Ok(Self::deserialize(value)?)
    }

    pub fn node_type(&self) -> NodeType {
        match self.geometry {
            GeometryRecord::Rectangle { .. } => NodeType::Rectangle,
            GeometryRecord::Ellipse { .. } => NodeType::Ellipse,
            GeometryRecord::Polygon { .. } => NodeType::Polygon,
            GeometryRecord::Text { .. } => NodeType::Text,
            GeometryRecord::Image { .. } => NodeType::Image,
            GeometryRecord::Line { .. } => NodeType::Line,
            GeometryRecord::Arrow { .. } => NodeType::Arrow,
            GeometryRecord::FreehandPath { .. } => NodeType::FreehandPath,
            GeometryRecord::Frame { .. } => NodeType::Frame,
        }
    }

    /// Rebuild a live node. Malformed frame children are logged and skipped.
    pub fn into_node(self, policy: IdPolicy) -> RecordResult<Node> {
        let id = match policy {
            IdPolicy::Preserve => self.id,
            IdPolicy::Fresh => Uuid::new_v4(),
        };
        let kind = match self.geometry {
            GeometryRecord::Rectangle { width, height } => {
                NodeKind::Rectangle(Rectangle::new(width, height))
            }
            GeometryRecord::Ellipse { width, height } => {
                NodeKind::Ellipse(Ellipse::new(width, height))
            }
            GeometryRecord::Polygon {
                width,
                height,
                points,
            } => NodeKind::Polygon(Polygon::new(width, height, points)),
            GeometryRecord::Text { text, font_size } => NodeKind::Text(Text::new(text, font_size)),
            GeometryRecord::Image {
                width,
                height,
                source_width,
                source_height,
                source,
            } => NodeKind::Image(Image {
                width,
                height,
                source_width,
                source_height,
                source,
            }),
            GeometryRecord::Line { start, end } => NodeKind::Line(Line::new(start, end)),
            GeometryRecord::Arrow {
                start,
                end,
                head_size,
            } => NodeKind::Arrow(Arrow {
                start,
                end,
                head_size,
            }),
            GeometryRecord::FreehandPath { points } => {
                NodeKind::FreehandPath(Freehand::from_points(points))
            }
            GeometryRecord::Frame {
                width,
                height,
                children,
            } => {
                let mut frame = Frame::new(width, height);
                for value in &children {
                    match child_from_value(value, policy) {
                        Ok(child) => frame.children.push(child),
                        Err(e) => log::warn!("Skipping child of frame {}: {}", self.id, e),
                    }
                }
                NodeKind::Frame(frame)
            }
        };

        let mut node = Node::with_id(id, Point::new(self.x, self.y), kind);
        node.name = self.name;
        node.style = self.style;
        node.visible = self.visible;
        node.locked = self.locked;
        Ok(node)
    }
}

fn child_from_value(value: &Value, policy: IdPolicy) -> RecordResult<Node> {
    let record = NodeRecord::from_value(value)?;
    if record.node_type() == NodeType::Frame {
        return Err(RecordError::NestedFrame(record.id.to_string()));
    }
    record.into_node(policy)
}

/// Serialize a node into a record value.
pub fn node_to_value(node: &Node) -> RecordResult<Value> {
    Ok(serde_json::to_value(NodeRecord::from_node(node))?)
}

/// Rebuild a node from a record value.
pub fn node_from_value(value: &Value, policy: IdPolicy) -> RecordResult<Node> {
    NodeRecord::from_value(value)?.into_node(policy)
}

/// Serialize every non-internal node of a list.
pub fn nodes_to_values(nodes: &[Node]) -> Vec<Value> {
    nodes
        .iter()
        .filter(|node| !node.internal)
        .filter_map(|node| match node_to_value(node) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Failed to serialize node {}: {}", node.id(), e);
                None
            }
        })
        .collect()
}

/// Rebuild a list of nodes, logging and skipping malformed records.
pub fn nodes_from_values(values: &[Value], policy: IdPolicy) -> Vec<Node> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match node_from_value(value, policy) {
            Ok(node) => Some(node),
            Err(e) => {
                log::warn!("Skipping record {}: {}", index, e);
                None
            }
        })
        .collect()
}
