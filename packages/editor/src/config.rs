use pagewright_common::FileCache;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "pagewright.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo steps kept
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Quiet period before a burst of edits becomes one undo step
    #[serde(default = "default_history_debounce_ms")]
    pub history_debounce_ms: u64,

    /// Quiet period before unsaved changes are sent to the server
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,

    /// Directory for crash-recovery snapshots; in-memory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
}

fn default_history_limit() -> usize {
    50
}

fn default_history_debounce_ms() -> u64 {
    500
}

fn default_autosave_debounce_ms() -> u64 {
    2000
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn history_debounce(&self) -> Duration {
        Duration::from_millis(self.history_debounce_ms)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    /// File cache under `cache_dir`, resolved against `base`
    pub fn file_cache(&self, base: impl AsRef<Path>) -> Option<FileCache> {
        self.cache_dir
            .as_ref()
            .map(|dir| FileCache::new(base.as_ref().join(PathBuf::from(dir))))
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            history_debounce_ms: default_history_debounce_ms(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            cache_dir: None,
        }
    }
}
