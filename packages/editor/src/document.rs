//! # Page Document
//!
//! Editing state for one page.
//!
//! The flat block list is the only source of truth. Everything else the
//! document carries (clipboard, history, version) is bookkeeping around it.
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Validate → Repair → Edit → Snapshot
//!   ↓        ↓         ↓       ↓        ↓
//! Blocks  warnings  normalize Mutations History/Cache
//! ```

use pagewright_model::{tree, Block, BlockId, BlockNode, IdGenerator, PageData, TemplateRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::clipboard::Clipboard;
use crate::engine;
use crate::history::HistoryManager;
use crate::mutations::{Mutation, MutationError};
use crate::validation;

/// Value copy of the persisted document state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub page_data: PageData,
}

impl Snapshot {
    pub fn new(blocks: Vec<Block>, page_data: PageData) -> Self {
        Self { blocks, page_data }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Outcome of a successful mutation on a document
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub version: u64,
    pub created: Option<BlockId>,
}

#[derive(Debug)]
pub struct PageDocument {
    pub page_id: String,

    /// Increments on every applied change, including undo/redo
    pub version: u64,

    blocks: Vec<Block>,
    page_data: PageData,
    pub clipboard: Option<Clipboard>,
    pub history: HistoryManager,
}

impl PageDocument {
    /// Load blocks from storage, repairing what can be repaired.
    ///
    /// Violations are logged. Duplicate ids are renamed, orphans and cycle
    /// members are promoted to root, and orders are renumbered. The repaired
    /// state becomes the first history entry.
    pub fn load(
        page_id: impl Into<String>,
        blocks: Vec<Block>,
        page_data: PageData,
        ids: &mut IdGenerator,
        history: HistoryManager,
    ) -> Self {
        let page_id = page_id.into();

        let violations = validation::validate(&blocks);
        for violation in &violations {
            tracing::warn!(page_id = %page_id, %violation, "invalid block data on load");
        }

        let blocks = engine::normalize(&rename_duplicates(blocks, ids));

        let mut document = Self {
            page_id,
            version: 0,
            blocks,
            page_data,
            clipboard: None,
            history,
        };
        document.history.clear();
        document.history.commit(document.snapshot());

        tracing::info!(
            page_id = %document.page_id,
            blocks = document.blocks.len(),
            repaired = !violations.is_empty(),
            "document loaded"
        );
        document
    }

    /// Empty page, mostly for tests
    pub fn empty(page_id: impl Into<String>) -> Self {
        let page_id = page_id.into();
        let mut ids = IdGenerator::new(&page_id);
        Self::load(page_id, Vec::new(), PageData::default(), &mut ids, HistoryManager::new())
    }

    /// Apply a mutation, swapping in the new block list on success
    pub fn apply(
        &mut self,
        mutation: &Mutation,
        ids: &mut IdGenerator,
        templates: &TemplateRegistry,
    ) -> Result<MutationResult, MutationError> {
        let applied = mutation.apply(&self.blocks, ids, templates)?;
        self.blocks = applied.blocks;
        self.version += 1;

        tracing::debug!(
            page_id = %self.page_id,
            mutation = mutation.name(),
            version = self.version,
            "mutation applied"
        );

        Ok(MutationResult {
            version: self.version,
            created: applied.created,
        })
    }

    /// Replace blocks and page data wholesale (undo, redo, recovery)
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.blocks = snapshot.blocks;
        self.page_data = snapshot.page_data;
        self.version += 1;
    }

    /// Adopt an already-normalized block list (server reconciliation)
    pub fn set_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        self.version += 1;
    }

    pub fn set_page_data(&mut self, page_data: PageData) {
        self.page_data = page_data;
        self.version += 1;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn page_data(&self) -> &PageData {
        &self.page_data
    }

    /// Derived tree for rendering
    pub fn tree(&self) -> Vec<BlockNode> {
        tree::build(&self.blocks)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.blocks.clone(), self.page_data.clone())
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        tree::contains(&self.blocks, id)
    }
}

/// Give every repeated id after the first a fresh one
fn rename_duplicates(mut blocks: Vec<Block>, ids: &mut IdGenerator) -> Vec<Block> {
    let mut taken: HashSet<BlockId> = blocks.iter().map(|b| b.id.clone()).collect();
    let mut seen: HashSet<BlockId> = HashSet::new();

    for block in blocks.iter_mut() {
        if seen.insert(block.id.clone()) {
            continue;
        }
        let fresh = ids.next_unused(&taken);
        tracing::warn!(old = %block.id, new = %fresh, "renamed duplicate block id");
        taken.insert(fresh.clone());
        block.id = fresh;
    }
    blocks
}
