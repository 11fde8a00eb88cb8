//! Structural checks over a flat block list.
//!
//! `validate` reports every violation it finds and never fails. Most checks
//! run on the raw list rather than the built tree, so problems `tree::build`
//! would silently repair still show up.

use pagewright_common::{walk_node, Visitor};
use pagewright_model::{tree, Block, BlockId, BlockNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Violation {
    DuplicateId { id: BlockId },
    /// `id` is part of a parent-pointer cycle
    Cycle { id: BlockId },
    ChildrenOnLeaf { id: BlockId },
    /// The group under `parent_id` does not number `0..n`
    NonDenseOrder { parent_id: Option<BlockId> },
    OrphanedParent { id: BlockId, parent_id: BlockId },
    LayoutOnNonLayoutContainer { id: BlockId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateId { id } => write!(f, "duplicate id {}", id),
            Violation::Cycle { id } => write!(f, "block {} is part of a parent cycle", id),
            Violation::ChildrenOnLeaf { id } => write!(f, "leaf block {} has children", id),
            Violation::NonDenseOrder { parent_id: Some(parent) } => {
                write!(f, "children of {} are not numbered 0..n", parent)
            }
            Violation::NonDenseOrder { parent_id: None } => write!(f, "root blocks are not numbered 0..n"),
            Violation::OrphanedParent { id, parent_id } => {
                write!(f, "block {} points at missing parent {}", id, parent_id)
            }
            Violation::LayoutOnNonLayoutContainer { id } => {
                write!(f, "block {} carries layout settings it cannot use", id)
            }
        }
    }
}

/// Collects leaves that ended up with children in the built tree
#[derive(Default)]
struct LeafChildren(Vec<Violation>);

impl Visitor for LeafChildren {
    fn visit_node(&mut self, node: &BlockNode) {
        if !node.block.is_container() && !node.children.is_empty() {
            self.0.push(Violation::ChildrenOnLeaf { id: node.id().clone() });
        }
        walk_node(self, node);
    }
}

/// Report every structural violation in `blocks`
pub fn validate(blocks: &[Block]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut seen: HashSet<&BlockId> = HashSet::new();
    for block in blocks {
        if !seen.insert(&block.id) {
            violations.push(Violation::DuplicateId { id: block.id.clone() });
        }
    }

    let by_id: HashMap<&BlockId, &Block> = blocks.iter().map(|b| (&b.id, b)).collect();

    for block in blocks {
        if let Some(parent_id) = &block.parent_id {
            if !by_id.contains_key(parent_id) {
                violations.push(Violation::OrphanedParent {
                    id: block.id.clone(),
                    parent_id: parent_id.clone(),
                });
            }
        }

        if block.layout_settings.is_some() && !block.container_type.has_layout() {
            violations.push(Violation::LayoutOnNonLayoutContainer { id: block.id.clone() });
        }
    }

    for block in blocks {
        if on_cycle(&by_id, &block.id) {
            violations.push(Violation::Cycle { id: block.id.clone() });
        }
    }

    let mut leaves = LeafChildren::default();
    leaves.visit_roots(&tree::build(blocks));
    let mut reported: HashSet<BlockId> = leaves
        .0
        .iter()
        .filter_map(|v| match v {
            Violation::ChildrenOnLeaf { id } => Some(id.clone()),
            _ => None,
        })
        .collect();
    violations.extend(leaves.0);

    // Cycle members are re-rooted by `build`, so their leaf parents only
    // show up on the raw list.
    for block in blocks {
        let Some(parent_id) = &block.parent_id else {
            continue;
        };
        if let Some(parent) = by_id.get(parent_id) {
            if !parent.is_container() && reported.insert(parent_id.clone()) {
                violations.push(Violation::ChildrenOnLeaf { id: parent_id.clone() });
            }
        }
    }

    let mut groups: BTreeMap<Option<&BlockId>, Vec<usize>> = BTreeMap::new();
    for block in blocks {
        groups.entry(block.parent_id.as_ref()).or_default().push(block.order);
    }
    for (parent_id, mut orders) in groups {
        orders.sort_unstable();
        if orders.iter().enumerate().any(|(index, &order)| index != order) {
            violations.push(Violation::NonDenseOrder {
                parent_id: parent_id.cloned(),
            });
        }
    }

    violations
}

pub fn is_valid(blocks: &[Block]) -> bool {
    validate(blocks).is_empty()
}

/// Whether following parent pointers from `id` leads back to `id`
fn on_cycle(by_id: &HashMap<&BlockId, &Block>, id: &BlockId) -> bool {
    let mut visited: HashSet<&BlockId> = HashSet::new();
    let mut cursor = by_id.get(id).and_then(|b| b.parent_id.as_ref());

    while let Some(current) = cursor {
        if current == id {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        cursor = by_id.get(current).and_then(|b| b.parent_id.as_ref());
    }
    false
}
