//! # Block Tree
//!
//! Derived hierarchy over the flat block list.
//!
//! The flat `Vec<Block>` is the only stored form of a page. Parent/child
//! relationships live in `parent_id`; the nested [`BlockNode`] view is rebuilt
//! on demand and never written back as a second source of truth.
//!
//! ```text
//! [A, B(parent A), C(parent A), D]  --build-->  A ─┬─ B
//!                                                  └─ C
//!                                               D
//! ```
//!
//! Every function here is linear (or linear times depth) in the number of
//! blocks. Pages hold tens to low hundreds of blocks, so no index is kept.

use std::collections::{HashMap, HashSet};

use crate::block::{Block, BlockId, BlockNode};

/// Rebuild the hierarchy from `parent_id` pointers.
///
/// Recovery rules for data that did not come from the engine:
/// - a block whose parent id is not in the list is promoted to root
/// - blocks unreachable from any root (a parent cycle) are promoted to root,
///   which breaks the cycle at the first member in array order
///
/// Promoted blocks have `parent_id` cleared in the returned nodes.
/// Each sibling group is sorted by `order`; ties keep array order.
pub fn build(blocks: &[Block]) -> Vec<BlockNode> {
    let ids: HashSet<&BlockId> = blocks.iter().map(|b| &b.id).collect();

    let mut groups: HashMap<Option<&BlockId>, Vec<usize>> = HashMap::new();
    let mut orphaned: HashSet<usize> = HashSet::new();

    for (idx, block) in blocks.iter().enumerate() {
        let key = match &block.parent_id {
            Some(parent) if ids.contains(parent) => Some(parent),
            Some(parent) => {
                tracing::warn!(
                    block_id = %block.id,
                    parent_id = %parent,
                    "parent missing, promoting block to root"
                );
                orphaned.insert(idx);
                None
            }
            None => None,
        };
        groups.entry(key).or_default().push(idx);
    }

    for group in groups.values_mut() {
        group.sort_by_key(|&idx| blocks[idx].order);
    }

    let mut visited = vec![false; blocks.len()];
    let mut roots: Vec<BlockNode> = Vec::new();

    if let Some(root_indices) = groups.get(&None) {
        for &idx in root_indices {
            if let Some(node) = build_node(idx, blocks, &groups, &mut visited, orphaned.contains(&idx)) {
                roots.push(node);
            }
        }
    }

    // Anything left is only reachable through a cycle
    for idx in 0..blocks.len() {
        if visited[idx] {
            continue;
        }
        tracing::warn!(
            block_id = %blocks[idx].id,
            "block is part of a parent cycle, promoting to root"
        );
        if let Some(node) = build_node(idx, blocks, &groups, &mut visited, true) {
            roots.push(node);
        }
    }

    roots.sort_by_key(|node| node.block.order);
    roots
}

fn build_node(
    idx: usize,
    blocks: &[Block],
    groups: &HashMap<Option<&BlockId>, Vec<usize>>,
    visited: &mut [bool],
    promote: bool,
) -> Option<BlockNode> {
    if visited[idx] {
        return None;
    }
    visited[idx] = true;

    let mut block = blocks[idx].clone();
    if promote {
        block.parent_id = None;
    }

    let mut children = Vec::new();
    if let Some(child_indices) = groups.get(&Some(&blocks[idx].id)) {
        for &child in child_indices {
            if let Some(node) = build_node(child, blocks, groups, visited, false) {
                children.push(node);
            }
        }
    }

    Some(BlockNode { block, children })
}

/// Inverse of [`build`]: pre-order flat list without derived children
pub fn flatten(roots: &[BlockNode]) -> Vec<Block> {
    let mut out = Vec::with_capacity(roots.iter().map(BlockNode::size).sum());
    for root in roots {
        flatten_into(root, &mut out);
    }
    out
}

fn flatten_into(node: &BlockNode, out: &mut Vec<Block>) {
    out.push(node.block.clone());
    for child in &node.children {
        flatten_into(child, out);
    }
}

pub fn find_by_id<'a>(blocks: &'a [Block], id: &BlockId) -> Option<&'a Block> {
    blocks.iter().find(|b| &b.id == id)
}

pub fn contains(blocks: &[Block], id: &BlockId) -> bool {
    blocks.iter().any(|b| &b.id == id)
}

pub fn find_parent<'a>(blocks: &'a [Block], id: &BlockId) -> Option<&'a Block> {
    let parent_id = find_by_id(blocks, id)?.parent_id.as_ref()?;
    find_by_id(blocks, parent_id)
}

/// Sibling group under `parent_id` (`None` = roots), sorted by `order`
pub fn children_of<'a>(blocks: &'a [Block], parent_id: Option<&BlockId>) -> Vec<&'a Block> {
    let mut children: Vec<&Block> = blocks
        .iter()
        .filter(|b| b.parent_id.as_ref() == parent_id)
        .collect();
    children.sort_by_key(|b| b.order);
    children
}

/// The sibling group `id` belongs to, including itself
pub fn siblings<'a>(blocks: &'a [Block], id: &BlockId) -> Vec<&'a Block> {
    match find_by_id(blocks, id) {
        Some(block) => children_of(blocks, block.parent_id.as_ref()),
        None => Vec::new(),
    }
}

/// Ancestors ordered from the root down to the immediate parent.
///
/// Stops early if the parent chain loops or leaves the list.
pub fn ancestors<'a>(blocks: &'a [Block], id: &BlockId) -> Vec<&'a Block> {
    let mut chain = Vec::new();
    let mut seen: HashSet<&BlockId> = HashSet::new();
    seen.insert(id);

    let mut current = find_parent(blocks, id);
    while let Some(parent) = current {
        if !seen.insert(&parent.id) {
            break;
        }
        chain.push(parent);
        current = parent.parent_id.as_ref().and_then(|pid| find_by_id(blocks, pid));
    }

    chain.reverse();
    chain
}

/// All descendants in pre-order (children sorted by `order`), excluding self
pub fn descendants<'a>(blocks: &'a [Block], id: &BlockId) -> Vec<&'a Block> {
    let mut out = Vec::new();
    let mut seen: HashSet<&BlockId> = HashSet::new();
    collect_descendants(blocks, id, id, &mut seen, &mut out);
    out
}

fn collect_descendants<'a>(
    blocks: &'a [Block],
    root: &BlockId,
    id: &BlockId,
    seen: &mut HashSet<&'a BlockId>,
    out: &mut Vec<&'a Block>,
) {
    for child in children_of(blocks, Some(id)) {
        if &child.id == root || !seen.insert(&child.id) {
            continue;
        }
        out.push(child);
        collect_descendants(blocks, root, &child.id, seen, out);
    }
}

/// True if `candidate` sits somewhere below `ancestor`
pub fn is_descendant(blocks: &[Block], ancestor: &BlockId, candidate: &BlockId) -> bool {
    ancestors(blocks, candidate).iter().any(|b| &b.id == ancestor)
}

/// Depth of the deepest branch: 0 for an empty page, 1 for roots only
pub fn max_depth(blocks: &[Block]) -> usize {
    fn depth(node: &BlockNode) -> usize {
        1 + node.children.iter().map(depth).max().unwrap_or(0)
    }

    build(blocks).iter().map(depth).max().unwrap_or(0)
}
