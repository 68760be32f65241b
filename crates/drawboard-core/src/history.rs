//! Linear snapshot history with undo/redo.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

// Use web-time on WASM, std::time otherwise
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Default maximum number of history entries.
pub const MAX_HISTORY: usize = 50;

/// Full serialized scene, shared between entries and restores.
pub type Snapshot = Arc<[Value]>;

/// A recorded document state.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Short label of the action that produced this state (`move`, `paste`, ...).
    pub tag: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub snapshot: Snapshot,
}

/// Summary sent to the host after every history change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub index: usize,
    pub length: usize,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Entries plus a cursor pointing at the current state.
#[derive(Debug)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    max_entries: usize,
    restoring: bool,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl HistoryManager {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            max_entries: max_entries.max(1),
            restoring: false,
        }
    }

    /// Record a new state after the cursor, dropping any redo branch and
    /// evicting the oldest entry past the cap. Ignored while a restore is
    /// in progress; returns whether an entry was recorded.
    pub fn record(&mut self, tag: impl Into<String>, snapshot: Vec<Value>) -> bool {
        let tag = tag.into();
        if self.restoring {
            log::debug!("Ignoring history record '{}' during restore", tag);
            return false;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(HistoryEntry {
            tag,
            timestamp_ms: now_ms(),
            snapshot: snapshot.into(),
        });
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
        log::debug!(
            "Recorded history '{}' ({}/{})",
            self.entries[self.cursor].tag,
            self.cursor + 1,
            self.entries.len()
        );
        true
    }

    /// Step the cursor back and return the state to restore.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(|e| Arc::clone(&e.snapshot))
    }

    /// Step the cursor forward and return the state to restore.
    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).map(|e| Arc::clone(&e.snapshot))
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor < self.entries.len() - 1
    }

    /// Suppress recording until [`HistoryManager::end_restore`].
    pub fn begin_restore(&mut self) {
        self.restoring = true;
    }

    pub fn end_restore(&mut self) {
        self.restoring = false;
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            index: self.cursor,
            length: self.entries.len(),
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
