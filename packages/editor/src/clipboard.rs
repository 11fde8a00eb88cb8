//! Single-slot editor clipboard.
//!
//! Copies are value snapshots: later edits to the source never show through.

use pagewright_model::{Block, BlockId, ConfigMap};
use serde::{Deserialize, Serialize};

use crate::engine;
use crate::mutations::MutationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Clipboard {
    /// A block followed by its descendants
    Block { blocks: Vec<Block> },
    #[serde(rename_all = "camelCase")]
    Style { style_config: ConfigMap },
}

impl Clipboard {
    pub fn copy_block(blocks: &[Block], id: &BlockId) -> Result<Self, MutationError> {
        Ok(Clipboard::Block {
            blocks: engine::subtree(blocks, id)?,
        })
    }

    pub fn copy_style(blocks: &[Block], id: &BlockId) -> Result<Self, MutationError> {
        let block = engine::require(blocks, id)?;
        Ok(Clipboard::Style {
            style_config: block.style_config.clone(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Clipboard::Block { .. } => "block",
            Clipboard::Style { .. } => "style",
        }
    }
}
