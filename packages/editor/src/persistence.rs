//! # Persistence Coordinator
//!
//! Dirty tracking, local crash-recovery cache, and debounced remote autosave.
//!
//! ## Flow
//!
//! 1. Every applied change calls [`PersistenceCoordinator::on_change`]: the
//!    document is marked dirty, a snapshot is written to the local cache, and
//!    the autosave deadline is (re)armed with the snapshot captured.
//! 2. When the deadline passes, [`PersistenceCoordinator::poll`] compares the
//!    captured snapshot with the live one. If they differ the save is stale:
//!    it is re-armed instead of sent.
//! 3. Otherwise the save runs in two phases, page metadata then the block
//!    list. The server's block list comes back reconciled.
//! 4. Success clears the cache and the dirty flag. Failure keeps both and
//!    waits for the next change; nothing retries on its own.

use async_trait::async_trait;
use pagewright_common::LocalCache;
use pagewright_model::{Block, PageData};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::debounce::Debouncer;
use crate::document::Snapshot;
use crate::reconcile::{reconcile, Reconciled};

pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(2000);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
}

/// Remote page storage
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn save_page(&self, page_id: &str, page_data: &PageData) -> Result<(), RemoteError>;

    /// Replace the page's blocks; returns the server's authoritative list
    async fn sync_blocks(&self, page_id: &str, blocks: &[Block]) -> Result<Vec<Block>, RemoteError>;
}

#[async_trait]
impl<R: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<R> {
    async fn save_page(&self, page_id: &str, page_data: &PageData) -> Result<(), RemoteError> {
        (**self).save_page(page_id, page_data).await
    }

    async fn sync_blocks(&self, page_id: &str, blocks: &[Block]) -> Result<Vec<Block>, RemoteError> {
        (**self).sync_blocks(page_id, blocks).await
    }
}

/// Transient status for the editor's save indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum SaveStatus {
    Idle,
    Pending,
    Saving,
    Saved,
    Failed(String),
}

#[derive(Debug)]
pub enum SaveOutcome {
    /// No save was due
    NotDue,
    /// The document changed since the save was scheduled; re-armed
    Stale,
    Saved(Reconciled),
    Failed(RemoteError),
}

pub struct PersistenceCoordinator<R, C> {
    page_id: String,
    remote: R,
    cache: C,
    dirty: bool,
    status: SaveStatus,
    timer: Debouncer,
    /// Serialized snapshot captured when the save was scheduled
    scheduled: Option<String>,
}

impl<R: RemoteStore, C: LocalCache> PersistenceCoordinator<R, C> {
    pub fn new(page_id: impl Into<String>, remote: R, cache: C) -> Self {
        Self::with_debounce(page_id, remote, cache, DEFAULT_AUTOSAVE_DEBOUNCE)
    }

    pub fn with_debounce(page_id: impl Into<String>, remote: R, cache: C, debounce: Duration) -> Self {
        Self {
            page_id: page_id.into(),
            remote,
            cache,
            dirty: false,
            status: SaveStatus::Idle,
            timer: Debouncer::new(debounce),
            scheduled: None,
        }
    }

    /// Record a change: mark dirty, write the local cache, re-arm autosave
    pub fn on_change(&mut self, snapshot: &Snapshot, now: Instant) {
        self.dirty = true;

        match snapshot.to_json() {
            Ok(json) => {
                if let Err(err) = self.cache.write(&self.page_id, &json) {
                    tracing::warn!(page_id = %self.page_id, error = %err, "local cache write failed");
                }
                self.scheduled = Some(json);
            }
            Err(err) => {
                tracing::warn!(page_id = %self.page_id, error = %err, "could not serialize snapshot");
                self.scheduled = None;
            }
        }

        self.status = SaveStatus::Pending;
        self.timer.arm(now);
    }

    /// Run the autosave if its deadline has passed
    pub async fn poll(&mut self, current: &Snapshot, now: Instant) -> SaveOutcome {
        if !self.timer.fire(now) {
            return SaveOutcome::NotDue;
        }

        let live = current.to_json().ok();
        if live.is_none() || live != self.scheduled {
            tracing::debug!(page_id = %self.page_id, "document changed since save was scheduled");
            self.scheduled = live;
            self.timer.arm(now);
            return SaveOutcome::Stale;
        }

        self.save(current).await
    }

    /// Save immediately, cancelling any pending autosave
    pub async fn save_now(&mut self, current: &Snapshot) -> SaveOutcome {
        self.timer.cancel();
        self.save(current).await
    }

    async fn save(&mut self, current: &Snapshot) -> SaveOutcome {
        self.status = SaveStatus::Saving;
        tracing::info!(page_id = %self.page_id, blocks = current.blocks.len(), "saving page");

        let result = match self.remote.save_page(&self.page_id, &current.page_data).await {
            Ok(()) => self.remote.sync_blocks(&self.page_id, &current.blocks).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(server_blocks) => {
                let reconciled = reconcile(&current.blocks, server_blocks);
                if let Err(err) = self.cache.clear(&self.page_id) {
                    tracing::warn!(page_id = %self.page_id, error = %err, "local cache clear failed");
                }
                self.dirty = false;
                self.scheduled = None;
                self.status = SaveStatus::Saved;
                tracing::info!(page_id = %self.page_id, "page saved");
                SaveOutcome::Saved(reconciled)
            }
            Err(err) => {
                tracing::warn!(page_id = %self.page_id, error = %err, "autosave failed");
                self.status = SaveStatus::Failed(err.to_string());
                SaveOutcome::Failed(err)
            }
        }
    }

    /// Read a snapshot left in the local cache by an interrupted session
    pub fn recover(&self) -> Option<Snapshot> {
        let json = match self.cache.read(&self.page_id) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(page_id = %self.page_id, error = %err, "local cache read failed");
                return None;
            }
        };

        match Snapshot::from_json(&json) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(page_id = %self.page_id, error = %err, "discarding unreadable cached snapshot");
                None
            }
        }
    }

    pub fn discard_cache(&mut self) {
        if let Err(err) = self.cache.clear(&self.page_id) {
            tracing::warn!(page_id = %self.page_id, error = %err, "local cache clear failed");
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}
