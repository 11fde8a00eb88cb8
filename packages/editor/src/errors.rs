//! Error types for the editor

use pagewright_model::BlockId;
use thiserror::Error;

use crate::mutations::MutationError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),

    #[error("Clipboard is empty")]
    EmptyClipboard,

    #[error("Clipboard holds {found}, expected {expected}")]
    ClipboardMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Generic(String),
}
