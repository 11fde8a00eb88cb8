//! # Pagewright Editor
//!
//! Editing engine for block-tree pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: flat blocks + derived tree           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session + mutations                 │
//! │  - Validate and apply intents               │
//! │  - Drag-drop legality                       │
//! │  - Debounced undo/redo history              │
//! │  - Local cache + debounced autosave         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ remote store: save page, sync blocks        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Flat list is source of truth**: the tree is a derived view
//! 2. **Pure mutations**: every operation returns a new normalized list or fails untouched
//! 3. **Explicit timers**: deadlines fire from `tick`, never from background tasks
//! 4. **Server authority**: the list returned by a save replaces the local one
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagewright_editor::{EditSession, EditorConfig, Mutation};
//!
//! let config = EditorConfig::load(".")?;
//! let mut session = EditSession::open("home", blocks, page_data, templates, remote, cache, &config);
//!
//! let id = session.add_block("text", ContainerType::Block, Some(section_id), Instant::now())?;
//! session.apply(Mutation::ToggleVisibility { block_id: id }, Instant::now())?;
//!
//! // Fire history commit and autosave when due
//! session.run_until_idle().await;
//! ```

mod clipboard;
mod config;
mod debounce;
mod document;
pub mod drag_drop;
pub mod engine;
mod errors;
mod history;
mod mutations;
mod persistence;
pub mod reconcile;
mod session;
pub mod validation;

pub use clipboard::Clipboard;
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use debounce::Debouncer;
pub use document::{MutationResult, PageDocument, Snapshot};
pub use drag_drop::{can_drop_into, is_same_level, resolve_drop, DropKind, DropTarget, DropZone};
pub use engine::ConfigSection;
pub use errors::EditorError;
pub use history::{HistoryEntry, HistoryManager, DEFAULT_HISTORY_DEBOUNCE, DEFAULT_HISTORY_LIMIT};
pub use mutations::{Applied, Mutation, MutationError};
pub use persistence::{
    PersistenceCoordinator, RemoteError, RemoteStore, SaveOutcome, SaveStatus, DEFAULT_AUTOSAVE_DEBOUNCE,
};
pub use reconcile::Reconciled;
pub use session::EditSession;
pub use validation::Violation;

// Re-export model types for convenience
pub use pagewright_common::{FileCache, LocalCache, MemoryCache};
pub use pagewright_model::{
    tree, Block, BlockId, BlockNode, BlockTemplate, ConfigMap, ContainerType, IdGenerator, LayoutSettings,
    PageData, TemplateDefaults, TemplateRegistry,
};
