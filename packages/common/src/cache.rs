//! Local durable cache for unsaved page snapshots.
//!
//! Holds the latest not-yet-synced snapshot of each page so an editing
//! session can be recovered after a crash. Cleared once the remote save
//! succeeds. Values are opaque JSON strings keyed by page id.

use pagewright_model::get_page_seed;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::CommonResult;

/// Key-value store for crash-recovery snapshots
pub trait LocalCache {
    /// Store the snapshot for a page, replacing any previous one
    fn write(&mut self, page_id: &str, snapshot: &str) -> CommonResult<()>;

    /// Read the snapshot for a page, if one exists
    fn read(&self, page_id: &str) -> CommonResult<Option<String>>;

    /// Drop the snapshot for a page. Missing entries are not an error.
    fn clear(&mut self, page_id: &str) -> CommonResult<()>;
}

/// Cache backed by one JSON file per page in a directory
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names come from the page seed so arbitrary page ids are safe
    fn entry_path(&self, page_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", get_page_seed(page_id)))
    }
}

impl LocalCache for FileCache {
    fn write(&mut self, page_id: &str, snapshot: &str) -> CommonResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.entry_path(page_id), snapshot)?;
        Ok(())
    }

    fn read(&self, page_id: &str) -> CommonResult<Option<String>> {
        let path = self.entry_path(page_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn clear(&mut self, page_id: &str) -> CommonResult<()> {
        match std::fs::remove_file(self.entry_path(page_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory cache for tests and for sessions without a cache directory
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: HashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalCache for MemoryCache {
    fn write(&mut self, page_id: &str, snapshot: &str) -> CommonResult<()> {
        self.entries.insert(page_id.to_string(), snapshot.to_string());
        Ok(())
    }

    fn read(&self, page_id: &str) -> CommonResult<Option<String>> {
        Ok(self.entries.get(page_id).cloned())
    }

    fn clear(&mut self, page_id: &str) -> CommonResult<()> {
        self.entries.remove(page_id);
        Ok(())
    }
}

impl<C: LocalCache + ?Sized> LocalCache for Box<C> {
    fn write(&mut self, page_id: &str, snapshot: &str) -> CommonResult<()> {
        (**self).write(page_id, snapshot)
    }

    fn read(&self, page_id: &str) -> CommonResult<Option<String>> {
        (**self).read(page_id)
    }

    fn clear(&mut self, page_id: &str) -> CommonResult<()> {
        (**self).clear(page_id)
    }
}
