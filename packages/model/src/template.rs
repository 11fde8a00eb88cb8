//! Template registry types.
//!
//! Templates are defined outside the editing engine. The engine only looks
//! them up to seed default config on insert and to refuse creating a
//! container from a template that does not exist.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::block::ConfigMap;

/// Default config copied into a new block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDefaults {
    #[serde(default)]
    pub content: ConfigMap,
    #[serde(default)]
    pub style: ConfigMap,
    #[serde(default)]
    pub advanced: ConfigMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTemplate {
    pub id: String,
    pub slug: String,
    pub category: String,
    /// Field definitions for the config widgets. Opaque here.
    #[serde(default)]
    pub config_schema: serde_json::Value,
    #[serde(default)]
    pub default_config: TemplateDefaults,
}

impl BlockTemplate {
    pub fn new(id: impl Into<String>, slug: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            category: category.into(),
            config_schema: serde_json::Value::Null,
            default_config: TemplateDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: TemplateDefaults) -> Self {
        self.default_config = defaults;
        self
    }
}

/// Lookup of templates by id
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, BlockTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, template: BlockTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&BlockTemplate> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<BlockTemplate> for TemplateRegistry {
    fn from_iter<I: IntoIterator<Item = BlockTemplate>>(iter: I) -> Self {
        let mut registry = Self::new();
        for template in iter {
            registry.register(template);
        }
        registry
    }
}
