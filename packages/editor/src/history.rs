//! # Undo/Redo History
//!
//! Bounded list of full document snapshots with a cursor.
//!
//! ## Design
//!
//! - Each entry is a complete value copy of `{blocks, page_data}`
//! - Undo/redo move the cursor and hand back the snapshot to restore
//! - Committing after an undo discards everything past the cursor
//! - Once the list exceeds its limit the oldest entry is evicted
//! - Commits are debounced: a burst of edits becomes one entry
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = HistoryManager::new();
//! history.commit(doc.snapshot());
//!
//! // after an edit, debounced
//! history.schedule(doc.snapshot(), Instant::now());
//! history.poll(Instant::now() + Duration::from_millis(500));
//!
//! if let Some(previous) = history.undo() {
//!     doc.replace(previous);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::debounce::Debouncer;
use crate::document::Snapshot;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_HISTORY_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub snapshot: Snapshot,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

#[derive(Debug)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    /// Index of the entry matching the document, meaningless while empty
    current_index: usize,

    /// Maximum number of entries kept (at least 1)
    limit: usize,

    pending: Option<Snapshot>,
    debounce: Debouncer,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_DEBOUNCE)
    }

    pub fn with_limit(limit: usize, debounce: Duration) -> Self {
        Self {
            entries: Vec::new(),
            current_index: 0,
            limit: limit.max(1),
            pending: None,
            debounce: Debouncer::new(debounce),
        }
    }

    /// Record a snapshot as the newest entry
    pub fn commit(&mut self, snapshot: Snapshot) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.current_index + 1);
        }

        self.entries.push(HistoryEntry {
            snapshot,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });

        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.current_index = self.entries.len() - 1;

        tracing::debug!(
            entries = self.entries.len(),
            current_index = self.current_index,
            "history commit"
        );
    }

    /// Step back one entry. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.current_index -= 1;
        Some(self.entries[self.current_index].snapshot.clone())
    }

    /// Step forward one entry. `None` at the tip.
    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.current_index += 1;
        Some(self.entries[self.current_index].snapshot.clone())
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.entries.len()
    }

    /// Hold `snapshot` for a debounced commit, restarting the delay
    pub fn schedule(&mut self, snapshot: Snapshot, now: Instant) {
        self.pending = Some(snapshot);
        self.debounce.arm(now);
    }

    /// Commit the pending snapshot if its delay has passed
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.debounce.fire(now) {
            if let Some(snapshot) = self.pending.take() {
                self.commit(snapshot);
                return true;
            }
        }
        false
    }

    /// Commit the pending snapshot right away, if any
    pub fn flush(&mut self) -> bool {
        self.debounce.cancel();
        match self.pending.take() {
            Some(snapshot) => {
                self.commit(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.current_index)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_index = 0;
        self.pending = None;
        self.debounce.cancel();
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}
