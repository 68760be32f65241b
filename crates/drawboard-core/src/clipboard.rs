//! Copy, paste and duplicate.
//!
//! Copied nodes are kept as serialized records annotated with where they
//! came from, so a payload can be pasted any number of times and can carry
//! frame children whose frame was not copied with them.

use crate::nodes::{Node, NodeId};
use crate::record::{self, IdPolicy};
use crate::scene::SceneTree;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// One copied node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardEntry {
    pub original_id: NodeId,
    /// Frame the node was a child of when copied.
    #[serde(default)]
    pub parent_frame: Option<NodeId>,
    #[serde(default)]
    pub in_frame: bool,
    /// Scene-space position at copy time, used when the parent frame is gone.
    pub world_position: Point,
    pub record: Value,
}

/// Ordered copied nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub entries: Vec<ClipboardEntry>,
}

impl ClipboardPayload {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a payload, skipping entries that do not parse.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            entries: Vec<Value>,
        }
        let raw: Raw = serde_json::from_str(json)?;
        let entries = raw
            .entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping clipboard entry {}: {}", i, e);
                    None
                }
            })
            .collect();
        Ok(Self { entries })
    }
}

/// Holds the payload and the cumulative paste offset.
#[derive(Debug, Clone)]
pub struct ClipboardService {
    payload: ClipboardPayload,
    step: f64,
    pastes: u32,
}

impl ClipboardService {
    pub fn new(step: f64) -> Self {
        Self {
            payload: ClipboardPayload::default(),
            step,
            pastes: 0,
        }
    }

    pub fn payload(&self) -> &ClipboardPayload {
        &self.payload
    }

    /// Replace the payload (e.g. from the system clipboard) and reset the offset.
    pub fn set_payload(&mut self, payload: ClipboardPayload) {
        self.payload = payload;
        self.pastes = 0;
    }

    /// Offset the next paste will use.
    pub fn current_offset(&self) -> f64 {
        self.step * self.pastes as f64
    }

    /// Serialize the selected nodes into the payload. Missing and internal
    /// ids are ignored. A child selected along with its frame is copied once,
    /// as its own entry. Returns the number of entries.
    pub fn copy(&mut self, tree: &SceneTree, selection: &[NodeId]) -> usize {
        let selected: HashSet<NodeId> = selection.iter().copied().collect();
        let mut entries = Vec::with_capacity(selection.len());

        for &id in selection {
            let Some(node) = tree.find(id).filter(|n| !n.internal) else {
                continue;
            };
            let mut copied = node.clone();
            if let Some(frame) = copied.as_frame_mut() {
                frame.children.retain(|child| !selected.contains(&child.id()));
            }
            let record = match record::node_to_value(&copied) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Failed to copy node {}: {}", id, e);
                    continue;
                }
            };
            let parent_frame = tree.parent_of(id);
            entries.push(ClipboardEntry {
                original_id: id,
                parent_frame,
                in_frame: parent_frame.is_some(),
                world_position: tree.world_position(id).unwrap_or(node.position),
                record,
            });
        }

        log::debug!("Copied {} nodes", entries.len());
        self.payload = ClipboardPayload { entries };
        self.pastes = 0;
        self.payload.len()
    }

    /// Rebuild the payload as new nodes, each pasted step further from the
    /// original than the last. Returns the new ids in payload order.
    pub fn paste(&mut self, tree: &mut SceneTree) -> Vec<NodeId> {
        if self.payload.is_empty() {
            return Vec::new();
        }
        self.pastes += 1;
        let offset = Vec2::new(self.current_offset(), self.current_offset());

        // Pass 1: instantiate every record.
        let mut built: Vec<Option<Node>> = Vec::with_capacity(self.payload.len());
        let mut by_original: HashMap<NodeId, usize> = HashMap::new();
        for entry in &self.payload.entries {
            let node = match record::node_from_value(&entry.record, IdPolicy::Fresh) {
                Ok(node) => {
                    by_original.insert(entry.original_id, built.len());
                    Some(node)
                }
                Err(e) => {
                    log::warn!("Skipping clipboard record {}: {}", entry.original_id, e);
                    None
                }
            };
            built.push(node);
        }
        let new_ids: Vec<NodeId> = built.iter().flatten().map(Node::id).collect();

        // Pass 2: place each node. Only children attached to a frame built
        // in this paste keep their local position; everything else moves by
        // the offset.
        let mut roots: Vec<usize> = Vec::new();
        for (i, entry) in self.payload.entries.iter().enumerate() {
            let Some(is_frame) = built[i].as_ref().map(Node::is_frame) else {
                continue;
            };
            let parent = match entry.parent_frame {
                Some(parent) if entry.in_frame && !is_frame => parent,
                _ => {
                    if let Some(node) = built[i].as_mut() {
                        node.translate(offset);
                    }
                    roots.push(i);
                    continue;
                }
            };

            let pasted_frame = by_original
                .get(&parent)
                .copied()
                .filter(|&j| built[j].as_ref().is_some_and(Node::is_frame));
            if let Some(frame_index) = pasted_frame {
                if let Some(child) = built[i].take() {
                    if let Some(frame) = built[frame_index].as_mut().and_then(Node::as_frame_mut) {
                        frame.children.push(child);
                    }
                }
                continue;
            }

            if tree.find(parent).is_some_and(Node::is_frame) {
                if let Some(mut child) = built[i].take() {
                    child.translate(offset);
                    tree.add(child, Some(parent), None);
                }
                continue;
            }

            // Parent frame is gone: land at the copied world position.
            if let Some(node) = built[i].as_mut() {
                node.position = entry.world_position + offset;
            }
            roots.push(i);
        }

        // Pass 3: attach everything queued for the root.
        for i in roots {
            if let Some(node) = built[i].take() {
                tree.add(node, None, None);
            }
        }

        log::info!("Pasted {} nodes", new_ids.len());
        new_ids
    }

    /// Clone one node a fixed step away under the same parent. The payload
    /// is left untouched.
    pub fn duplicate(&self, tree: &mut SceneTree, id: NodeId) -> Option<NodeId> {
        let node = tree.find(id).filter(|n| !n.internal)?;
        let parent = tree.parent_of(id);
        let value = match record::node_to_value(node) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to duplicate node {}: {}", id, e);
                return None;
            }
        };
        let mut copy = match record::node_from_value(&value, IdPolicy::Fresh) {
            Ok(copy) => copy,
            Err(e) => {
                log::warn!("Failed to duplicate node {}: {}", id, e);
                return None;
            }
        };
        copy.translate(Vec2::new(self.step, self.step));
        let new_id = copy.id();
        if !tree.add(copy, parent, None) {
            return None;
        }
        log::info!("Duplicated node {} as {}", id, new_id);
        Some(new_id)
    }
}
