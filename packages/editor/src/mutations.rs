//! # Block Mutations
//!
//! Intent-level operations on a page document.
//!
//! A `Mutation` is what the UI produces: "add a text block here", "move
//! this section there". Each variant validates its preconditions against the
//! current block list and then delegates to the pure functions in
//! [`crate::engine`].
//!
//! ## Mutation Semantics
//!
//! ### MoveBlock
//! - Relocates one block; descendants follow through their parent pointers
//! - Fails if the target parent is missing or is not a container
//! - Fails if the target is the block itself or one of its descendants
//!
//! ### RemoveBlock
//! - Removes the block and all descendants
//! - Never reparents children
//!
//! ### UpdateConfig
//! - Key-level merge into one config map
//! - `null` removes a key

use pagewright_model::{
    tree, Block, BlockId, ConfigMap, ContainerType, IdGenerator, LayoutSettings, TemplateRegistry,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::engine::{self, ConfigSection};

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Create a block from a template, seeded with its default config
    AddBlock {
        template_id: String,
        container_type: ContainerType,
        parent_id: Option<BlockId>,
        order: Option<usize>,
    },

    /// Insert a fully formed block
    InsertBlock {
        block: Block,
        parent_id: Option<BlockId>,
        order: Option<usize>,
    },

    /// Move a block to a new parent at an index
    MoveBlock {
        block_id: BlockId,
        new_parent_id: Option<BlockId>,
        new_order: usize,
    },

    /// Deep-clone a block right after itself
    DuplicateBlock { block_id: BlockId },

    /// Remove a block and its subtree
    RemoveBlock { block_id: BlockId },

    /// Array move inside one sibling group
    ReorderBlocks {
        parent_id: Option<BlockId>,
        from_index: usize,
        to_index: usize,
    },

    UpdateConfig {
        block_id: BlockId,
        section: ConfigSection,
        values: ConfigMap,
    },

    ToggleVisibility { block_id: BlockId },

    SetLayout {
        block_id: BlockId,
        layout: LayoutSettings,
    },

    /// Insert a copied subtree (root first) with fresh ids, appended to the
    /// parent's group
    PasteBlocks {
        blocks: Vec<Block>,
        parent_id: Option<BlockId>,
    },

    /// Replace a block's style map wholesale
    ReplaceStyle {
        block_id: BlockId,
        style_config: ConfigMap,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Parent not found: {0}")]
    ParentNotFound(BlockId),

    #[error("Block {0} cannot have children")]
    NotAContainer(BlockId),

    #[error("Duplicate block id: {0}")]
    DuplicateId(BlockId),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Index {index} out of range for group of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Template not found: {0}")]
    MissingTemplate(String),

    #[error("Layout settings do not apply to block {0}")]
    LayoutNotSupported(BlockId),

    #[error("Nothing to insert")]
    EmptySubtree,

    #[error("Block {0} does not hang off an earlier block of the copied subtree")]
    OutsideSubtree(BlockId),
}

/// Result of a successful mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub blocks: Vec<Block>,
    /// Root id of a block created by this mutation
    pub created: Option<BlockId>,
}

impl Applied {
    fn modified(blocks: Vec<Block>) -> Self {
        Self { blocks, created: None }
    }

    fn created(blocks: Vec<Block>, id: BlockId) -> Self {
        Self {
            blocks,
            created: Some(id),
        }
    }
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddBlock { .. } => "add_block",
            Mutation::InsertBlock { .. } => "insert_block",
            Mutation::MoveBlock { .. } => "move_block",
            Mutation::DuplicateBlock { .. } => "duplicate_block",
            Mutation::RemoveBlock { .. } => "remove_block",
            Mutation::ReorderBlocks { .. } => "reorder_blocks",
            Mutation::UpdateConfig { .. } => "update_config",
            Mutation::ToggleVisibility { .. } => "toggle_visibility",
            Mutation::SetLayout { .. } => "set_layout",
            Mutation::PasteBlocks { .. } => "paste_blocks",
            Mutation::ReplaceStyle { .. } => "replace_style",
        }
    }

    /// Apply mutation to the block list with validation
    pub fn apply(
        &self,
        blocks: &[Block],
        ids: &mut IdGenerator,
        templates: &TemplateRegistry,
    ) -> Result<Applied, MutationError> {
        self.validate(blocks, templates)?;

        match self {
            Mutation::AddBlock {
                template_id,
                container_type,
                parent_id,
                order,
            } => {
                let taken: HashSet<BlockId> = blocks.iter().map(|b| b.id.clone()).collect();
                let id = ids.next_unused(&taken);
                let mut block = Block::new(id.clone(), template_id.clone(), *container_type);
                if let Some(template) = templates.get(template_id) {
                    block.content_config = template.default_config.content.clone();
                    block.style_config = template.default_config.style.clone();
                    block.advanced_config = template.default_config.advanced.clone();
                }
                let next = engine::insert(blocks, block, parent_id.as_ref(), *order)?;
                Ok(Applied::created(next, id))
            }

            Mutation::InsertBlock {
                block,
                parent_id,
                order,
            } => {
                let id = block.id.clone();
                let next = engine::insert(blocks, block.clone(), parent_id.as_ref(), *order)?;
                Ok(Applied::created(next, id))
            }

            Mutation::MoveBlock {
                block_id,
                new_parent_id,
                new_order,
            } => engine::move_block(blocks, block_id, new_parent_id.as_ref(), *new_order)
                .map(Applied::modified),

            Mutation::DuplicateBlock { block_id } => {
                let (next, copy) = engine::duplicate(blocks, block_id, ids)?;
                Ok(Applied::created(next, copy))
            }

            Mutation::RemoveBlock { block_id } => engine::remove(blocks, block_id).map(Applied::modified),

            Mutation::ReorderBlocks {
                parent_id,
                from_index,
                to_index,
            } => engine::reorder(blocks, parent_id.as_ref(), *from_index, *to_index).map(Applied::modified),

            Mutation::UpdateConfig {
                block_id,
                section,
                values,
            } => engine::update_config(blocks, block_id, *section, values).map(Applied::modified),

            Mutation::ToggleVisibility { block_id } => {
                engine::toggle_visibility(blocks, block_id).map(Applied::modified)
            }

            Mutation::SetLayout { block_id, layout } => {
                engine::set_layout(blocks, block_id, layout).map(Applied::modified)
            }

            Mutation::PasteBlocks {
                blocks: copied,
                parent_id,
            } => {
                let mut taken: HashSet<BlockId> = blocks.iter().map(|b| b.id.clone()).collect();
                let fresh = engine::clone_with_fresh_ids(copied, &mut taken, ids);
                let root = fresh[0].id.clone();
                let next = engine::insert_subtree(blocks, fresh, parent_id.as_ref(), None)?;
                Ok(Applied::created(next, root))
            }

            Mutation::ReplaceStyle { block_id, style_config } => {
                engine::replace_style(blocks, block_id, style_config).map(Applied::modified)
            }
        }
    }

    /// Check preconditions without applying
    pub fn validate(&self, blocks: &[Block], templates: &TemplateRegistry) -> Result<(), MutationError> {
        match self {
            Mutation::AddBlock {
                template_id,
                container_type,
                parent_id,
                ..
            } => {
                if container_type.is_container() && !templates.contains(template_id) {
                    return Err(MutationError::MissingTemplate(template_id.clone()));
                }
                engine::check_parent(blocks, parent_id.as_ref())
            }

            Mutation::InsertBlock { block, parent_id, .. } => {
                if tree::contains(blocks, &block.id) {
                    return Err(MutationError::DuplicateId(block.id.clone()));
                }
                engine::check_layout(block)?;
                engine::check_parent(blocks, parent_id.as_ref())
            }

            Mutation::MoveBlock {
                block_id,
                new_parent_id,
                ..
            } => {
                engine::require(blocks, block_id)?;
                engine::check_parent(blocks, new_parent_id.as_ref())?;
                if let Some(parent_id) = new_parent_id {
                    if parent_id == block_id || tree::is_descendant(blocks, block_id, parent_id) {
                        return Err(MutationError::CycleDetected);
                    }
                }
                Ok(())
            }

            Mutation::ReorderBlocks {
                parent_id,
                from_index,
                ..
            } => {
                if let Some(parent_id) = parent_id {
                    if !tree::contains(blocks, parent_id) {
                        return Err(MutationError::ParentNotFound(parent_id.clone()));
                    }
                }
                let len = tree::children_of(blocks, parent_id.as_ref()).len();
                if *from_index >= len {
                    return Err(MutationError::IndexOutOfRange {
                        index: *from_index,
                        len,
                    });
                }
                Ok(())
            }

            Mutation::SetLayout { block_id, layout } => {
                let block = engine::require(blocks, block_id)?;
                if !layout.matches(block.container_type) {
                    return Err(MutationError::LayoutNotSupported(block_id.clone()));
                }
                Ok(())
            }

            Mutation::PasteBlocks { blocks: copied, parent_id } => {
                engine::check_subtree(copied)?;
                engine::check_parent(blocks, parent_id.as_ref())
            }

            Mutation::DuplicateBlock { block_id }
            | Mutation::RemoveBlock { block_id }
            | Mutation::UpdateConfig { block_id, .. }
            | Mutation::ToggleVisibility { block_id }
            | Mutation::ReplaceStyle { block_id, .. } => engine::require(blocks, block_id).map(|_| ()),
        }
    }
}
