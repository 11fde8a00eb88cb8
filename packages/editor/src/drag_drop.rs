//! Drag-and-drop legality and drop-target resolution.
//!
//! Two questions are asked while a block is dragged over another:
//! can the dragged block become a child of the hovered one, and are the two
//! siblings? `resolve_drop` turns the answers plus the hovered zone into a
//! concrete placement, or `None` when the drop must be refused.

use pagewright_model::{tree, Block, BlockId};
use serde::{Deserialize, Serialize};

/// Where over the hovered block the pointer is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropZone {
    Before,
    After,
    /// The empty drop area inside a container
    EmptyRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DropKind {
    Reorder,
    Reparent,
}

/// Resolved placement for a drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    pub parent_id: Option<BlockId>,
    pub order: usize,
    pub kind: DropKind,
}

/// Whether `dragged_id` may become a child of `target_id`.
///
/// False when the target is missing, is not a container, is the dragged
/// block itself, or sits inside the dragged block's subtree.
pub fn can_drop_into(blocks: &[Block], dragged_id: &BlockId, target_id: &BlockId) -> bool {
    let Some(target) = tree::find_by_id(blocks, target_id) else {
        return false;
    };
    if !target.is_container() || dragged_id == target_id {
        return false;
    }
    !tree::is_descendant(blocks, dragged_id, target_id)
}

/// Whether both blocks exist and share a parent (root counts as a parent)
pub fn is_same_level(blocks: &[Block], dragged_id: &BlockId, hovered_id: &BlockId) -> bool {
    match (
        tree::find_by_id(blocks, dragged_id),
        tree::find_by_id(blocks, hovered_id),
    ) {
        (Some(dragged), Some(hovered)) => dragged.parent_id == hovered.parent_id,
        _ => false,
    }
}

/// Pick a placement for dropping `dragged_id` onto `hovered_id`.
///
/// Reparenting goes to the end of the hovered container. When both a
/// reorder and a reparent are legal, the reparent only wins over the
/// container's empty region.
pub fn resolve_drop(
    blocks: &[Block],
    dragged_id: &BlockId,
    hovered_id: &BlockId,
    zone: DropZone,
) -> Option<DropTarget> {
    let reparent = can_drop_into(blocks, dragged_id, hovered_id);
    let same_level = dragged_id != hovered_id && is_same_level(blocks, dragged_id, hovered_id);

    let target = match (reparent, same_level) {
        (true, true) if zone == DropZone::EmptyRegion => reparent_target(blocks, dragged_id, hovered_id),
        (_, true) => reorder_target(blocks, dragged_id, hovered_id, zone),
        (true, false) => reparent_target(blocks, dragged_id, hovered_id),
        (false, false) => None,
    };

    if target.is_none() {
        tracing::debug!(dragged = %dragged_id, hovered = %hovered_id, ?zone, "drop rejected");
    }
    target
}

fn reparent_target(blocks: &[Block], dragged_id: &BlockId, container_id: &BlockId) -> Option<DropTarget> {
    let order = tree::children_of(blocks, Some(container_id))
        .iter()
        .filter(|b| &b.id != dragged_id)
        .count();
    Some(DropTarget {
        parent_id: Some(container_id.clone()),
        order,
        kind: DropKind::Reparent,
    })
}

fn reorder_target(blocks: &[Block], dragged_id: &BlockId, hovered_id: &BlockId, zone: DropZone) -> Option<DropTarget> {
    let hovered = tree::find_by_id(blocks, hovered_id)?;
    let position = tree::siblings(blocks, hovered_id)
        .into_iter()
        .filter(|b| &b.id != dragged_id)
        .position(|b| &b.id == hovered_id)?;

    let order = match zone {
        DropZone::Before => position,
        DropZone::After | DropZone::EmptyRegion => position + 1,
    };
    Some(DropTarget {
        parent_id: hovered.parent_id.clone(),
        order,
        kind: DropKind::Reorder,
    })
}
