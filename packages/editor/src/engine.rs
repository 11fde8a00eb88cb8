//! # Mutation Engine
//!
//! Pure structural operations on the flat block list.
//!
//! Every operation takes `&[Block]` and returns a fresh, normalized
//! `Vec<Block>`, or an error before anything is written. Callers swap the
//! result in as the new document state.
//!
//! ## Placement
//!
//! Inserting, moving, duplicating and pasting all end in the same step: the
//! block is spliced into its sibling group at an explicit index, the group
//! is renumbered, and the whole document is normalized. Explicit splicing
//! means an incoming block never ties with an existing sibling on `order`.
//!
//! ## Removal
//!
//! Removing a block deletes its whole subtree. Children are never
//! reparented to the grandparent.

use pagewright_common::{walk_siblings_mut, VisitorMut};
use pagewright_model::{
    tree, Block, BlockId, BlockNode, ConfigMap, IdGenerator, LayoutSettings,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::mutations::MutationError;

/// Which of a block's three config maps an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigSection {
    Content,
    Style,
    Advanced,
}

/// Reassigns `order` to the positional index in every sibling group
struct OrderNormalizer;

impl VisitorMut for OrderNormalizer {
    fn visit_siblings_mut(&mut self, siblings: &mut Vec<BlockNode>) {
        siblings.sort_by_key(|node| node.block.order);
        for (index, node) in siblings.iter_mut().enumerate() {
            node.block.order = index;
        }
        walk_siblings_mut(self, siblings);
    }
}

/// Rewrite `order` to `0..n` in every sibling group, keeping relative order.
///
/// Output is in pre-order. Orphans and cycle members are promoted to root
/// by [`tree::build`]. Idempotent.
pub fn normalize(blocks: &[Block]) -> Vec<Block> {
    let mut roots = tree::build(blocks);
    OrderNormalizer.visit_roots_mut(&mut roots);
    tree::flatten(&roots)
}

/// Check that `parent_id` can own children
pub(crate) fn check_parent(blocks: &[Block], parent_id: Option<&BlockId>) -> Result<(), MutationError> {
    if let Some(parent_id) = parent_id {
        let parent = tree::find_by_id(blocks, parent_id)
            .ok_or_else(|| MutationError::ParentNotFound(parent_id.clone()))?;
        if !parent.is_container() {
            return Err(MutationError::NotAContainer(parent_id.clone()));
        }
    }
    Ok(())
}

pub(crate) fn require<'a>(blocks: &'a [Block], id: &BlockId) -> Result<&'a Block, MutationError> {
    tree::find_by_id(blocks, id).ok_or_else(|| MutationError::BlockNotFound(id.clone()))
}

/// Layout settings are only carried by flexbox and grid containers of the
/// matching kind
pub(crate) fn check_layout(block: &Block) -> Result<(), MutationError> {
    match &block.layout_settings {
        Some(layout) if !layout.matches(block.container_type) => {
            Err(MutationError::LayoutNotSupported(block.id.clone()))
        }
        _ => Ok(()),
    }
}

/// Check that a detached subtree (root first) stands on its own.
///
/// Ids must be unique within it, and every entry after the root must hang
/// off an earlier container entry. The root's own `parent_id` is ignored.
pub(crate) fn check_subtree(subtree: &[Block]) -> Result<(), MutationError> {
    if subtree.is_empty() {
        return Err(MutationError::EmptySubtree);
    }

    let mut seen: HashMap<&BlockId, &Block> = HashMap::with_capacity(subtree.len());
    for (i, block) in subtree.iter().enumerate() {
        check_layout(block)?;
        if i > 0 {
            let parent = block
                .parent_id
                .as_ref()
                .and_then(|pid| seen.get(pid))
                .ok_or_else(|| MutationError::OutsideSubtree(block.id.clone()))?;
            if !parent.is_container() {
                return Err(MutationError::NotAContainer(parent.id.clone()));
            }
        }
        if seen.insert(&block.id, block).is_some() {
            return Err(MutationError::DuplicateId(block.id.clone()));
        }
    }
    Ok(())
}

/// Splice `id` into its current sibling group at `index` (clamped), renumber
/// that group, and normalize the document
fn place(mut blocks: Vec<Block>, id: &BlockId, index: usize) -> Vec<Block> {
    let parent = tree::find_by_id(&blocks, id).and_then(|b| b.parent_id.clone());

    let mut group: Vec<BlockId> = tree::children_of(&blocks, parent.as_ref())
        .into_iter()
        .filter(|b| &b.id != id)
        .map(|b| b.id.clone())
        .collect();
    let at = index.min(group.len());
    group.insert(at, id.clone());

    let positions: HashMap<BlockId, usize> = group
        .into_iter()
        .enumerate()
        .map(|(position, id)| (id, position))
        .collect();

    for block in blocks.iter_mut() {
        if block.parent_id != parent {
            continue;
        }
        if let Some(&position) = positions.get(&block.id) {
            block.order = position;
        }
    }

    normalize(&blocks)
}

fn position_in_group(blocks: &[Block], id: &BlockId) -> Option<usize> {
    tree::siblings(blocks, id).iter().position(|b| &b.id == id)
}

/// Insert a single block under `parent_id`.
///
/// `index` defaults to the end of the sibling group.
pub fn insert(
    blocks: &[Block],
    mut block: Block,
    parent_id: Option<&BlockId>,
    index: Option<usize>,
) -> Result<Vec<Block>, MutationError> {
    if tree::contains(blocks, &block.id) {
        return Err(MutationError::DuplicateId(block.id));
    }
    check_layout(&block)?;
    check_parent(blocks, parent_id)?;

    let group_len = tree::children_of(blocks, parent_id).len();
    let index = index.unwrap_or(group_len);

    block.parent_id = parent_id.cloned();
    let id = block.id.clone();

    let mut next = blocks.to_vec();
    next.push(block);
    Ok(place(next, &id, index))
}

/// Insert a detached subtree (root first) under `parent_id`.
///
/// Parent pointers inside the subtree are kept; the root is attached to
/// `parent_id`. Used by paste and duplicate.
pub fn insert_subtree(
    blocks: &[Block],
    subtree: Vec<Block>,
    parent_id: Option<&BlockId>,
    index: Option<usize>,
) -> Result<Vec<Block>, MutationError> {
    check_subtree(&subtree)?;
    let root_id = subtree[0].id.clone();

    let existing: HashSet<&BlockId> = blocks.iter().map(|b| &b.id).collect();
    if let Some(clash) = subtree.iter().find(|b| existing.contains(&b.id)) {
        return Err(MutationError::DuplicateId(clash.id.clone()));
    }
    check_parent(blocks, parent_id)?;

    let group_len = tree::children_of(blocks, parent_id).len();
    let index = index.unwrap_or(group_len);

    let mut next = blocks.to_vec();
    for (i, mut block) in subtree.into_iter().enumerate() {
        if i == 0 {
            block.parent_id = parent_id.cloned();
        }
        next.push(block);
    }
    Ok(place(next, &root_id, index))
}

/// Move a block (and implicitly its subtree) under a new parent at `new_order`
pub fn move_block(
    blocks: &[Block],
    id: &BlockId,
    new_parent_id: Option<&BlockId>,
    new_order: usize,
) -> Result<Vec<Block>, MutationError> {
    require(blocks, id)?;
    check_parent(blocks, new_parent_id)?;

    if let Some(parent_id) = new_parent_id {
        if parent_id == id || tree::is_descendant(blocks, id, parent_id) {
            return Err(MutationError::CycleDetected);
        }
    }

    let mut next = blocks.to_vec();
    for block in next.iter_mut() {
        if &block.id == id {
            block.parent_id = new_parent_id.cloned();
        }
    }
    Ok(place(next, id, new_order))
}

/// Delete a block and all of its descendants
pub fn remove(blocks: &[Block], id: &BlockId) -> Result<Vec<Block>, MutationError> {
    require(blocks, id)?;

    let mut doomed: HashSet<BlockId> = tree::descendants(blocks, id)
        .into_iter()
        .map(|b| b.id.clone())
        .collect();
    doomed.insert(id.clone());

    let remaining: Vec<Block> = blocks
        .iter()
        .filter(|b| !doomed.contains(&b.id))
        .cloned()
        .collect();
    Ok(normalize(&remaining))
}

/// Clone a subtree (root first) giving every node a fresh id.
///
/// Parent pointers inside the subtree are remapped to the new ids; the
/// root keeps its original parent. New ids are added to `taken`.
pub fn clone_with_fresh_ids(
    subtree: &[Block],
    taken: &mut HashSet<BlockId>,
    ids: &mut IdGenerator,
) -> Vec<Block> {
    let mut remap: HashMap<BlockId, BlockId> = HashMap::new();
    for block in subtree {
        let fresh = ids.next_unused(taken);
        taken.insert(fresh.clone());
        remap.insert(block.id.clone(), fresh);
    }

    subtree
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let mut copy = block.clone();
            copy.id = remap[&block.id].clone();
            if i > 0 {
                copy.parent_id = block
                    .parent_id
                    .as_ref()
                    .and_then(|pid| remap.get(pid).cloned())
                    .or_else(|| block.parent_id.clone());
            }
            copy
        })
        .collect()
}

/// The block followed by all of its descendants, as owned values
pub fn subtree(blocks: &[Block], id: &BlockId) -> Result<Vec<Block>, MutationError> {
    let root = require(blocks, id)?;
    let mut out = vec![root.clone()];
    out.extend(tree::descendants(blocks, id).into_iter().cloned());
    Ok(out)
}

/// Deep-clone a block and its subtree right after the source.
///
/// Returns the new document and the id of the clone's root.
pub fn duplicate(
    blocks: &[Block],
    id: &BlockId,
    ids: &mut IdGenerator,
) -> Result<(Vec<Block>, BlockId), MutationError> {
    let source = subtree(blocks, id)?;
    let parent_id = source[0].parent_id.clone();
    let index = position_in_group(blocks, id).map_or(0, |p| p + 1);

    let mut taken: HashSet<BlockId> = blocks.iter().map(|b| b.id.clone()).collect();
    let copy = clone_with_fresh_ids(&source, &mut taken, ids);
    let copy_id = copy[0].id.clone();

    let next = insert_subtree(blocks, copy, parent_id.as_ref(), Some(index))?;
    Ok((next, copy_id))
}

/// Move the block at `from_index` to `to_index` within one sibling group.
///
/// `to_index` is clamped to the group; moving across groups goes through
/// [`move_block`].
pub fn reorder(
    blocks: &[Block],
    parent_id: Option<&BlockId>,
    from_index: usize,
    to_index: usize,
) -> Result<Vec<Block>, MutationError> {
    if let Some(parent_id) = parent_id {
        require(blocks, parent_id).map_err(|_| MutationError::ParentNotFound(parent_id.clone()))?;
    }

    let group = tree::children_of(blocks, parent_id);
    let moved = group
        .get(from_index)
        .map(|b| b.id.clone())
        .ok_or(MutationError::IndexOutOfRange {
            index: from_index,
            len: group.len(),
        })?;

    Ok(place(blocks.to_vec(), &moved, to_index))
}

fn edit_block<F>(blocks: &[Block], id: &BlockId, edit: F) -> Result<Vec<Block>, MutationError>
where
    F: FnOnce(&mut Block) -> Result<(), MutationError>,
{
    let mut next = blocks.to_vec();
    let block = next
        .iter_mut()
        .find(|b| &b.id == id)
        .ok_or_else(|| MutationError::BlockNotFound(id.clone()))?;
    edit(block)?;
    Ok(next)
}

/// Merge `values` into one config map. A JSON `null` removes the key.
pub fn update_config(
    blocks: &[Block],
    id: &BlockId,
    section: ConfigSection,
    values: &ConfigMap,
) -> Result<Vec<Block>, MutationError> {
    edit_block(blocks, id, |block| {
        let target = match section {
            ConfigSection::Content => &mut block.content_config,
            ConfigSection::Style => &mut block.style_config,
            ConfigSection::Advanced => &mut block.advanced_config,
        };
        for (key, value) in values {
            if value.is_null() {
                target.remove(key);
            } else {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    })
}

/// Replace a block's style map wholesale (style paste)
pub fn replace_style(blocks: &[Block], id: &BlockId, style: &ConfigMap) -> Result<Vec<Block>, MutationError> {
    edit_block(blocks, id, |block| {
        block.style_config = style.clone();
        Ok(())
    })
}

pub fn toggle_visibility(blocks: &[Block], id: &BlockId) -> Result<Vec<Block>, MutationError> {
    edit_block(blocks, id, |block| {
        block.is_visible = !block.is_visible;
        Ok(())
    })
}

/// Replace layout settings on a flexbox or grid container
pub fn set_layout(blocks: &[Block], id: &BlockId, layout: &LayoutSettings) -> Result<Vec<Block>, MutationError> {
    edit_block(blocks, id, |block| {
        if !layout.matches(block.container_type) {
            return Err(MutationError::LayoutNotSupported(block.id.clone()));
        }
        block.layout_settings = Some(layout.clone());
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewright_model::ContainerType;

    fn id(s: &str) -> BlockId {
        BlockId::from(s)
    }

    fn section(name: &str, order: usize) -> Block {
        Block::new(name, "section", ContainerType::Section).with_order(order)
    }

    fn leaf(name: &str, parent: &str, order: usize) -> Block {
        Block::new(name, "text", ContainerType::Block)
            .with_parent(parent)
            .with_order(order)
    }

    /// s1[a, b, c], s2[row[x]]
    fn page() -> Vec<Block> {
        vec![
            section("s1", 0),
            leaf("a", "s1", 0),
            leaf("b", "s1", 1),
            leaf("c", "s1", 2),
            section("s2", 1),
            Block::new("row", "row", ContainerType::Flexbox)
                .with_parent("s2")
                .with_order(0),
            leaf("x", "row", 0),
        ]
    }

    fn group<'a>(blocks: &'a [Block], parent: Option<&str>) -> Vec<(&'a str, usize)> {
        let parent = parent.map(BlockId::from);
        tree::children_of(blocks, parent.as_ref())
            .into_iter()
            .map(|b| (b.id.as_str(), b.order))
            .collect()
    }

    fn names<'a>(pairs: &[(&'a str, usize)]) -> Vec<&'a str> {
        pairs.iter().map(|(n, _)| *n).collect()
    }

    #[test]
    fn test_normalize_makes_groups_dense() {
        let blocks = vec![
            section("s1", 4),
            section("s2", 9),
            leaf("a", "s1", 7),
            leaf("b", "s1", 3),
        ];

        let normalized = normalize(&blocks);
        assert_eq!(group(&normalized, None), vec![("s1", 0), ("s2", 1)]);
        assert_eq!(group(&normalized, Some("s1")), vec![("b", 0), ("a", 1)]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(&[section("s1", 3), leaf("a", "s1", 5), section("s0", 1)]);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_insert_defaults_to_end() {
        let next = insert(&page(), Block::new("d", "text", ContainerType::Block), Some(&id("s1")), None).unwrap();
        assert_eq!(names(&group(&next, Some("s1"))), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_insert_at_index_shifts_siblings() {
        let next = insert(&page(), Block::new("d", "text", ContainerType::Block), Some(&id("s1")), Some(1)).unwrap();
        assert_eq!(
            group(&next, Some("s1")),
            vec![("a", 0), ("d", 1), ("b", 2), ("c", 3)]
        );
    }

    #[test]
    fn test_insert_rejects_leaf_parent_and_duplicates() {
        let err = insert(&page(), Block::new("d", "text", ContainerType::Block), Some(&id("a")), None);
        assert_eq!(err, Err(MutationError::NotAContainer(id("a"))));

        let err = insert(&page(), Block::new("a", "text", ContainerType::Block), None, None);
        assert_eq!(err, Err(MutationError::DuplicateId(id("a"))));

        let err = insert(&page(), Block::new("d", "text", ContainerType::Block), Some(&id("ghost")), None);
        assert_eq!(err, Err(MutationError::ParentNotFound(id("ghost"))));
    }

    #[test]
    fn test_move_between_groups() {
        let next = move_block(&page(), &id("b"), Some(&id("row")), 0).unwrap();

        assert_eq!(group(&next, Some("s1")), vec![("a", 0), ("c", 1)]);
        assert_eq!(group(&next, Some("row")), vec![("b", 0), ("x", 1)]);
    }

    #[test]
    fn test_move_container_carries_subtree() {
        let next = move_block(&page(), &id("row"), Some(&id("s1")), 1).unwrap();

        assert_eq!(names(&group(&next, Some("s1"))), vec!["a", "row", "b", "c"]);
        assert_eq!(tree::find_parent(&next, &id("x")).unwrap().id, id("row"));
        assert!(group(&next, Some("s2")).is_empty());
    }

    #[test]
    fn test_move_within_group_and_to_root() {
        let next = move_block(&page(), &id("a"), Some(&id("s1")), 5).unwrap();
        assert_eq!(names(&group(&next, Some("s1"))), vec!["b", "c", "a"]);

        let next = move_block(&page(), &id("x"), None, 0).unwrap();
        assert_eq!(names(&group(&next, None)), vec!["x", "s1", "s2"]);
    }

    #[test]
    fn test_move_rejects_cycles() {
        assert_eq!(
            move_block(&page(), &id("s2"), Some(&id("row")), 0),
            Err(MutationError::CycleDetected)
        );
        assert_eq!(
            move_block(&page(), &id("s2"), Some(&id("s2")), 0),
            Err(MutationError::CycleDetected)
        );
    }

    #[test]
    fn test_remove_cascades() {
        let next = remove(&page(), &id("s2")).unwrap();

        assert_eq!(next.len(), 4);
        assert!(!tree::contains(&next, &id("row")));
        assert!(!tree::contains(&next, &id("x")));
        assert_eq!(group(&next, None), vec![("s1", 0)]);
    }

    #[test]
    fn test_remove_renormalizes_former_group() {
        let next = remove(&page(), &id("a")).unwrap();
        assert_eq!(group(&next, Some("s1")), vec![("b", 0), ("c", 1)]);
    }

    #[test]
    fn test_duplicate_lands_after_source_with_fresh_ids() {
        let mut ids = IdGenerator::from_seed("dup");
        let (next, copy_id) = duplicate(&page(), &id("s2"), &mut ids).unwrap();

        assert_eq!(next.len(), page().len() + 2);
        assert_eq!(names(&group(&next, None)), vec!["s1", "s2", copy_id.as_str()]);

        let copied = tree::descendants(&next, &copy_id);
        assert_eq!(copied.len(), 2);
        for block in copied {
            assert!(block.id.as_str().starts_with("dup-"));
        }
    }

    #[test]
    fn test_duplicate_in_middle_of_group() {
        let mut ids = IdGenerator::from_seed("dup");
        let (next, copy_id) = duplicate(&page(), &id("a"), &mut ids).unwrap();

        assert_eq!(names(&group(&next, Some("s1"))), vec!["a", copy_id.as_str(), "b", "c"]);
    }

    #[test]
    fn test_reorder_within_group() {
        let next = reorder(&page(), Some(&id("s1")), 0, 2).unwrap();
        assert_eq!(
            group(&next, Some("s1")),
            vec![("b", 0), ("c", 1), ("a", 2)]
        );

        let next = reorder(&page(), Some(&id("s1")), 2, 0).unwrap();
        assert_eq!(names(&group(&next, Some("s1"))), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reorder_out_of_range() {
        assert_eq!(
            reorder(&page(), Some(&id("s1")), 3, 0),
            Err(MutationError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_update_config_merges_and_removes() {
        let mut values = ConfigMap::new();
        values.insert("text".into(), serde_json::json!("Hello"));
        let next = update_config(&page(), &id("a"), ConfigSection::Content, &values).unwrap();
        assert_eq!(tree::find_by_id(&next, &id("a")).unwrap().content_config["text"], "Hello");

        let mut values = ConfigMap::new();
        values.insert("text".into(), serde_json::Value::Null);
        let next = update_config(&next, &id("a"), ConfigSection::Content, &values).unwrap();
        assert!(tree::find_by_id(&next, &id("a")).unwrap().content_config.is_empty());
    }

    #[test]
    fn test_toggle_visibility() {
        let next = toggle_visibility(&page(), &id("a")).unwrap();
        assert!(!tree::find_by_id(&next, &id("a")).unwrap().is_visible);
        let next = toggle_visibility(&next, &id("a")).unwrap();
        assert!(tree::find_by_id(&next, &id("a")).unwrap().is_visible);
    }

    #[test]
    fn test_set_layout_only_on_matching_container() {
        let grid = LayoutSettings::default_for(ContainerType::Grid).unwrap();
        assert_eq!(
            set_layout(&page(), &id("row"), &grid),
            Err(MutationError::LayoutNotSupported(id("row")))
        );
        assert_eq!(
            set_layout(&page(), &id("s1"), &grid),
            Err(MutationError::LayoutNotSupported(id("s1")))
        );

        let flex = LayoutSettings::default_for(ContainerType::Flexbox).unwrap();
        assert!(set_layout(&page(), &id("row"), &flex).is_ok());
    }

    #[test]
    fn test_insert_rejects_layout_on_wrong_container() {
        let mut block = Block::new("x", "section", ContainerType::Section);
        block.layout_settings = LayoutSettings::default_for(ContainerType::Grid);

        let err = insert(&page(), block, None, None);
        assert_eq!(err, Err(MutationError::LayoutNotSupported(id("x"))));

        let mut grid = Block::new("g", "grid", ContainerType::Grid);
        grid.layout_settings = LayoutSettings::default_for(ContainerType::Grid);
        let next = insert(&page(), grid, Some(&id("s2")), None).unwrap();
        assert!(crate::validation::is_valid(&next));
    }

    #[test]
    fn test_insert_subtree_rejects_internal_duplicates() {
        let subtree = vec![
            Block::new("c", "section", ContainerType::Section),
            leaf("t", "c", 0),
            leaf("t", "c", 1),
        ];
        let err = insert_subtree(&page(), subtree, None, None);
        assert_eq!(err, Err(MutationError::DuplicateId(id("t"))));
    }

    #[test]
    fn test_check_subtree_requires_entries_inside_the_copy() {
        let detached = vec![
            Block::new("c", "section", ContainerType::Section),
            leaf("t", "elsewhere", 0),
        ];
        assert_eq!(check_subtree(&detached), Err(MutationError::OutsideSubtree(id("t"))));

        let stray_root = vec![
            Block::new("c", "section", ContainerType::Section),
            Block::new("t", "text", ContainerType::Block),
        ];
        assert_eq!(check_subtree(&stray_root), Err(MutationError::OutsideSubtree(id("t"))));

        let under_leaf = vec![leaf("a", "s1", 0), leaf("b", "a", 0)];
        assert_eq!(check_subtree(&under_leaf), Err(MutationError::NotAContainer(id("a"))));

        assert_eq!(check_subtree(&[]), Err(MutationError::EmptySubtree));
        assert_eq!(check_subtree(&subtree(&page(), &id("s2")).unwrap()), Ok(()));
    }
}
