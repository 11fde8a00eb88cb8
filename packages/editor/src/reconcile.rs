//! Fold a server-returned block list back into the editor.
//!
//! The server list replaces the local one wholesale. The only work is
//! figuring out which local id each server block corresponds to, so that
//! editor state keyed by id (the selection) can follow it. Blocks keep their
//! id when the server echoed it back; blocks the server re-identified are
//! matched on `(template_id, order)`, preferring a candidate under the same
//! parent.

use pagewright_model::{Block, BlockId};
use std::collections::{HashMap, HashSet};

use crate::engine;

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Normalized server list
    pub blocks: Vec<Block>,
    /// Local id -> server id, only for blocks whose id changed
    pub id_map: HashMap<BlockId, BlockId>,
}

impl Reconciled {
    /// Where a local id lives now, if the block survived
    pub fn resolve(&self, local: &BlockId) -> Option<BlockId> {
        if let Some(mapped) = self.id_map.get(local) {
            return Some(mapped.clone());
        }
        self.blocks
            .iter()
            .any(|b| &b.id == local)
            .then(|| local.clone())
    }
}

pub fn reconcile(local: &[Block], server: Vec<Block>) -> Reconciled {
    let server_ids: HashSet<&BlockId> = server.iter().map(|b| &b.id).collect();
    let local_ids: HashSet<&BlockId> = local.iter().map(|b| &b.id).collect();

    let unmatched_local: Vec<&Block> = local.iter().filter(|b| !server_ids.contains(&b.id)).collect();
    let mut unmatched_server: Vec<&Block> = server.iter().filter(|b| !local_ids.contains(&b.id)).collect();

    let mut id_map: HashMap<BlockId, BlockId> = HashMap::new();

    // Parents first, so a child's parent is already mapped when it is matched
    let mut pending: Vec<&Block> = unmatched_local;
    pending.sort_by_key(|b| depth(local, &b.id));

    for block in pending {
        let expected_parent = block
            .parent_id
            .as_ref()
            .map(|pid| id_map.get(pid).cloned().unwrap_or_else(|| pid.clone()));

        let same_key = |candidate: &&Block| candidate.template_id == block.template_id && candidate.order == block.order;

        let found = unmatched_server
            .iter()
            .position(|c| same_key(c) && c.parent_id == expected_parent)
            .or_else(|| unmatched_server.iter().position(same_key));

        if let Some(index) = found {
            let matched = unmatched_server.remove(index);
            id_map.insert(block.id.clone(), matched.id.clone());
        }
    }

    if !id_map.is_empty() {
        tracing::debug!(remapped = id_map.len(), "server replaced block ids");
    }

    Reconciled {
        blocks: engine::normalize(&server),
        id_map,
    }
}

fn depth(blocks: &[Block], id: &BlockId) -> usize {
    pagewright_model::tree::ancestors(blocks, id).len()
}
