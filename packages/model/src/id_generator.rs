use crc32fast::Hasher;
use std::collections::HashSet;

use crate::block::BlockId;

/// Stable seed for a page id using CRC32
pub fn get_page_seed(page_id: &str) -> String {
    let mut buff = String::from(page_id);
    if !page_id.starts_with("page://") {
        buff = format!("page://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential block id generator for one editing session.
///
/// Ids look like `{page-seed}{session-salt}-{n}`. The salt keeps ids from two
/// sessions on the same page apart; `next_unused` additionally skips any id
/// already present in the document.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(page_id: &str) -> Self {
        let salt = chrono::Utc::now().timestamp_millis();
        Self {
            seed: format!("{}{:x}", get_page_seed(page_id), salt),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn new_id(&mut self) -> BlockId {
        self.count += 1;
        BlockId::new(format!("{}-{}", self.seed, self.count))
    }

    /// Generate the next id that is not in `taken`
    pub fn next_unused(&mut self, taken: &HashSet<BlockId>) -> BlockId {
        loop {
            let id = self.new_id();
            if !taken.contains(&id) {
                return id;
            }
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
