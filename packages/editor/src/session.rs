//! # Edit Session
//!
//! One user's editing session on one page.
//!
//! The session turns UI intents into mutations, keeps the selection pointed
//! at a live block, and drives the two timers: the debounced history commit
//! and the debounced autosave. Timers only fire from [`EditSession::tick`];
//! a driver sleeps until [`EditSession::next_deadline`] and then ticks.

use pagewright_common::LocalCache;
use pagewright_model::{Block, BlockId, BlockNode, ContainerType, IdGenerator, PageData, TemplateRegistry};
use tokio::time::Instant;

use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::document::{MutationResult, PageDocument, Snapshot};
use crate::drag_drop::{self, DropZone};
use crate::errors::EditorError;
use crate::history::HistoryManager;
use crate::mutations::Mutation;
use crate::persistence::{PersistenceCoordinator, RemoteStore, SaveOutcome, SaveStatus};
use crate::reconcile::Reconciled;

pub struct EditSession<R, C> {
    pub document: PageDocument,

    /// Currently selected block, always present in the document
    selected: Option<BlockId>,

    ids: IdGenerator,
    templates: TemplateRegistry,
    persistence: PersistenceCoordinator<R, C>,
}

impl<R: RemoteStore, C: LocalCache> EditSession<R, C> {
    /// Open a page for editing
    pub fn open(
        page_id: impl Into<String>,
        blocks: Vec<Block>,
        page_data: PageData,
        templates: TemplateRegistry,
        remote: R,
        cache: C,
        config: &EditorConfig,
    ) -> Self {
        let page_id = page_id.into();
        let mut ids = IdGenerator::new(&page_id);
        let history = HistoryManager::with_limit(config.history_limit, config.history_debounce());
        let document = PageDocument::load(page_id.clone(), blocks, page_data, &mut ids, history);
        let persistence = PersistenceCoordinator::with_debounce(page_id, remote, cache, config.autosave_debounce());

        Self {
            document,
            selected: None,
            ids,
            templates,
            persistence,
        }
    }

    /// Replace the session's id generator (deterministic ids in tests)
    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Apply an intent and schedule history and autosave
    pub fn apply(&mut self, mutation: Mutation, now: Instant) -> Result<MutationResult, EditorError> {
        let result = self.document.apply(&mutation, &mut self.ids, &self.templates)?;

        if let Some(created) = &result.created {
            self.selected = Some(created.clone());
        }
        self.after_change(now);
        Ok(result)
    }

    pub fn add_block(
        &mut self,
        template_id: impl Into<String>,
        container_type: ContainerType,
        parent_id: Option<BlockId>,
        now: Instant,
    ) -> Result<BlockId, EditorError> {
        let result = self.apply(
            Mutation::AddBlock {
                template_id: template_id.into(),
                container_type,
                parent_id,
                order: None,
            },
            now,
        )?;
        result
            .created
            .ok_or_else(|| EditorError::Generic("add_block created nothing".to_string()))
    }

    /// Drop `dragged` onto `hovered`. Returns `false` when the drop is refused.
    pub fn drop_block(
        &mut self,
        dragged: &BlockId,
        hovered: &BlockId,
        zone: DropZone,
        now: Instant,
    ) -> Result<bool, EditorError> {
        let Some(target) = drag_drop::resolve_drop(self.document.blocks(), dragged, hovered, zone) else {
            return Ok(false);
        };

        self.apply(
            Mutation::MoveBlock {
                block_id: dragged.clone(),
                new_parent_id: target.parent_id,
                new_order: target.order,
            },
            now,
        )?;
        Ok(true)
    }

    /// Restore the previous history entry. Returns `false` at the boundary.
    pub fn undo(&mut self, now: Instant) -> bool {
        self.document.history.flush();
        match self.document.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot, now);
                true
            }
            None => false,
        }
    }

    /// Restore the next history entry. Returns `false` at the tip.
    pub fn redo(&mut self, now: Instant) -> bool {
        self.document.history.flush();
        match self.document.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot, now);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.document.history.has_pending() || self.document.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.document.history.has_pending() && self.document.history.can_redo()
    }

    pub fn copy_block(&mut self, id: &BlockId) -> Result<(), EditorError> {
        self.document.clipboard = Some(Clipboard::copy_block(self.document.blocks(), id)?);
        Ok(())
    }

    pub fn copy_style(&mut self, id: &BlockId) -> Result<(), EditorError> {
        self.document.clipboard = Some(Clipboard::copy_style(self.document.blocks(), id)?);
        Ok(())
    }

    /// Paste the copied block under `parent_id`, at the end of its group.
    ///
    /// The clipboard is kept, so pasting twice yields two copies.
    pub fn paste(&mut self, parent_id: Option<BlockId>, now: Instant) -> Result<BlockId, EditorError> {
        let blocks = match &self.document.clipboard {
            Some(Clipboard::Block { blocks }) if blocks.is_empty() => return Err(EditorError::EmptyClipboard),
            Some(Clipboard::Block { blocks }) => blocks.clone(),
            Some(other) => {
                return Err(EditorError::ClipboardMismatch {
                    expected: "block",
                    found: other.kind(),
                })
            }
            None => return Err(EditorError::EmptyClipboard),
        };

        let result = self.apply(Mutation::PasteBlocks { blocks, parent_id }, now)?;
        result
            .created
            .ok_or_else(|| EditorError::Generic("paste created nothing".to_string()))
    }

    /// Replace `target`'s style with the copied style
    pub fn paste_style(&mut self, target: &BlockId, now: Instant) -> Result<(), EditorError> {
        let style_config = match &self.document.clipboard {
            Some(Clipboard::Style { style_config }) => style_config.clone(),
            Some(other) => {
                return Err(EditorError::ClipboardMismatch {
                    expected: "style",
                    found: other.kind(),
                })
            }
            None => return Err(EditorError::EmptyClipboard),
        };

        self.apply(
            Mutation::ReplaceStyle {
                block_id: target.clone(),
                style_config,
            },
            now,
        )?;
        Ok(())
    }

    pub fn select(&mut self, id: Option<BlockId>) -> Result<(), EditorError> {
        if let Some(id) = &id {
            if !self.document.contains(id) {
                return Err(EditorError::UnknownBlock(id.clone()));
            }
        }
        self.selected = id;
        Ok(())
    }

    pub fn selected(&self) -> Option<&BlockId> {
        self.selected.as_ref()
    }

    pub fn update_page_data(&mut self, page_data: PageData, now: Instant) {
        self.document.set_page_data(page_data);
        self.after_change(now);
    }

    /// Fire whichever timers are due
    pub async fn tick(&mut self, now: Instant) -> SaveOutcome {
        self.document.history.poll(now);

        let current = self.document.snapshot();
        let outcome = self.persistence.poll(&current, now).await;
        if let SaveOutcome::Saved(reconciled) = &outcome {
            self.adopt_server_blocks(reconciled);
        }
        outcome
    }

    /// Save right away, bypassing the autosave delay
    pub async fn save_now(&mut self) -> SaveOutcome {
        let current = self.document.snapshot();
        let outcome = self.persistence.save_now(&current).await;
        if let SaveOutcome::Saved(reconciled) = &outcome {
            self.adopt_server_blocks(reconciled);
        }
        outcome
    }

    /// Earliest pending timer deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.document.history.next_deadline(), self.persistence.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Sleep through every pending timer until none is left
    pub async fn run_until_idle(&mut self) {
        while let Some(deadline) = self.next_deadline() {
            tokio::time::sleep_until(deadline).await;
            self.tick(Instant::now()).await;
        }
    }

    /// Restore unsaved work left by a crashed session.
    ///
    /// The recovered state is applied as a normal change, so it is undoable
    /// and gets saved.
    pub fn recover_from_cache(&mut self, now: Instant) -> bool {
        let Some(snapshot) = self.persistence.recover() else {
            return false;
        };
        if snapshot == self.document.snapshot() {
            self.persistence.discard_cache();
            return false;
        }

        tracing::info!(page_id = %self.document.page_id, "recovering unsaved changes");
        self.document.replace(snapshot);
        self.prune_selection();
        self.after_change(now);
        true
    }

    pub fn tree(&self) -> Vec<BlockNode> {
        self.document.tree()
    }

    pub fn is_dirty(&self) -> bool {
        self.persistence.is_dirty()
    }

    pub fn save_status(&self) -> &SaveStatus {
        self.persistence.status()
    }

    pub fn persistence(&self) -> &PersistenceCoordinator<R, C> {
        &self.persistence
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    fn after_change(&mut self, now: Instant) {
        self.prune_selection();
        let snapshot = self.document.snapshot();
        self.persistence.on_change(&snapshot, now);
        self.document.history.schedule(snapshot, now);
    }

    fn restore(&mut self, snapshot: Snapshot, now: Instant) {
        self.document.replace(snapshot);
        self.prune_selection();
        let snapshot = self.document.snapshot();
        self.persistence.on_change(&snapshot, now);
    }

    fn prune_selection(&mut self) {
        if let Some(id) = &self.selected {
            if !self.document.contains(id) {
                self.selected = None;
            }
        }
    }

    fn adopt_server_blocks(&mut self, reconciled: &Reconciled) {
        self.selected = self.selected.as_ref().and_then(|id| reconciled.resolve(id));
        if reconciled.blocks.as_slice() != self.document.blocks() {
            self.document.set_blocks(reconciled.blocks.clone());
        }
    }
}
