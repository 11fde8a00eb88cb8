//! Property tests for the derived tree view.
//!
//! 1. flatten(build(blocks)) keeps every id, parent and order.
//! 2. build never loses or duplicates a block, even for damaged input.
//! 3. ancestors/descendants agree with each other.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::block::{Block, BlockId, ContainerType};
use crate::tree::{ancestors, build, descendants, flatten};

/// A valid, normalized page in shuffled array order
fn valid_page(max_len: usize) -> impl Strategy<Value = Vec<Block>> {
    proptest::collection::vec((0u8..4, any::<u32>()), 0..=max_len)
        .prop_map(|specs| {
            let mut blocks: Vec<Block> = Vec::new();
            let mut containers: Vec<BlockId> = Vec::new();
            let mut next_order: HashMap<Option<BlockId>, usize> = HashMap::new();

            for (i, (kind, pick)) in specs.into_iter().enumerate() {
                let container_type = match kind {
                    0 => ContainerType::Block,
                    1 => ContainerType::Section,
                    2 => ContainerType::Flexbox,
                    _ => ContainerType::Grid,
                };
                let slot = pick as usize % (containers.len() + 1);
                let parent = if slot == 0 { None } else { Some(containers[slot - 1].clone()) };

                let order = next_order.entry(parent.clone()).or_insert(0);
                let mut block = Block::new(format!("b{}", i), "tpl", container_type).with_order(*order);
                *order += 1;
                block.parent_id = parent;

                if container_type.is_container() {
                    containers.push(block.id.clone());
                }
                blocks.push(block);
            }
            blocks
        })
        .prop_shuffle()
}

fn keyed(blocks: &[Block]) -> Vec<(BlockId, Option<BlockId>, usize)> {
    let mut rows: Vec<_> = blocks
        .iter()
        .map(|b| (b.id.clone(), b.parent_id.clone(), b.order))
        .collect();
    rows.sort();
    rows
}

proptest! {
    #[test]
    fn flatten_build_round_trip(blocks in valid_page(40)) {
        let flat = flatten(&build(&blocks));
        prop_assert_eq!(keyed(&flat), keyed(&blocks));
    }

    #[test]
    fn build_keeps_every_block_of_damaged_input(
        blocks in valid_page(30),
        rewires in proptest::collection::vec((any::<usize>(), any::<usize>()), 0..5),
    ) {
        let mut damaged = blocks.clone();
        if !damaged.is_empty() {
            let n = damaged.len();
            for (from, to) in rewires {
                let target = damaged[to % n].id.clone();
                damaged[from % n].parent_id = Some(target);
            }
        }

        let flat = flatten(&build(&damaged));
        let mut before: Vec<&str> = damaged.iter().map(|b| b.id.as_str()).collect();
        let mut after: Vec<&str> = flat.iter().map(|b| b.id.as_str()).collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn ancestors_and_descendants_agree(blocks in valid_page(30)) {
        for block in &blocks {
            for ancestor in ancestors(&blocks, &block.id) {
                let below = descendants(&blocks, &ancestor.id);
                prop_assert!(below.iter().any(|d| d.id == block.id));
            }
        }
    }
}
