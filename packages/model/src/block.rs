use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Opaque key/value configuration owned by a single block.
///
/// Ordered so that serialized snapshots of equal documents are byte-equal.
pub type ConfigMap = BTreeMap<String, serde_json::Value>;

/// Globally unique block identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Structural role of a block. Everything except `Block` may own children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    Block,
    Section,
    Flexbox,
    Grid,
}

impl ContainerType {
    pub fn is_container(self) -> bool {
        !matches!(self, ContainerType::Block)
    }

    /// Flexbox and grid containers carry layout settings
    pub fn has_layout(self) -> bool {
        matches!(self, ContainerType::Flexbox | ContainerType::Grid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerType::Block => "BLOCK",
            ContainerType::Section => "SECTION",
            ContainerType::Flexbox => "FLEXBOX",
            ContainerType::Grid => "GRID",
        }
    }
}

impl FromStr for ContainerType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BLOCK" => Ok(ContainerType::Block),
            "SECTION" => Ok(ContainerType::Section),
            "FLEXBOX" => Ok(ContainerType::Flexbox),
            "GRID" => Ok(ContainerType::Grid),
            _ => Err(ModelError::UnknownContainerType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlexDirection {
    Row,
    RowReverse,
    Column,
    ColumnReverse,
}

/// Layout parameters for flexbox and grid containers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LayoutSettings {
    #[serde(rename_all = "camelCase")]
    Flexbox {
        direction: FlexDirection,
        justify: String,
        align: String,
        wrap: bool,
        gap: u32,
    },
    #[serde(rename_all = "camelCase")]
    Grid {
        columns: u32,
        rows: u32,
        column_gap: u32,
        row_gap: u32,
    },
}

impl LayoutSettings {
    /// Default layout for a container type, `None` for types without layout
    pub fn default_for(container_type: ContainerType) -> Option<Self> {
        match container_type {
            ContainerType::Flexbox => Some(LayoutSettings::Flexbox {
                direction: FlexDirection::Row,
                justify: "flex-start".to_string(),
                align: "stretch".to_string(),
                wrap: false,
                gap: 16,
            }),
            ContainerType::Grid => Some(LayoutSettings::Grid {
                columns: 2,
                rows: 1,
                column_gap: 16,
                row_gap: 16,
            }),
            ContainerType::Block | ContainerType::Section => None,
        }
    }

    pub fn matches(&self, container_type: ContainerType) -> bool {
        matches!(
            (self, container_type),
            (LayoutSettings::Flexbox { .. }, ContainerType::Flexbox)
                | (LayoutSettings::Grid { .. }, ContainerType::Grid)
        )
    }
}

/// One node of the page document.
///
/// Blocks are stored flat; hierarchy is expressed only through `parent_id`.
/// See [`crate::tree`] for the derived tree view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    pub template_id: String,
    pub container_type: ContainerType,
    #[serde(default)]
    pub parent_id: Option<BlockId>,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub content_config: ConfigMap,
    #[serde(default)]
    pub style_config: ConfigMap,
    #[serde(default)]
    pub advanced_config: ConfigMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_settings: Option<LayoutSettings>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Block {
    /// Create a root-level block with empty config
    pub fn new(id: impl Into<BlockId>, template_id: impl Into<String>, container_type: ContainerType) -> Self {
        Self {
            id: id.into(),
            template_id: template_id.into(),
            container_type,
            parent_id: None,
            order: 0,
            content_config: ConfigMap::new(),
            style_config: ConfigMap::new(),
            advanced_config: ConfigMap::new(),
            layout_settings: LayoutSettings::default_for(container_type),
            is_visible: true,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<BlockId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn is_container(&self) -> bool {
        self.container_type.is_container()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Decode a flat block list, e.g. a remote or cached payload
    pub fn list_from_json(json: &str) -> ModelResult<Vec<Block>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Derived tree view of a block and its children.
///
/// Never persisted; rebuilt from the flat list by [`crate::tree::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub block: Block,
    pub children: Vec<BlockNode>,
}

impl BlockNode {
    pub fn leaf(block: Block) -> Self {
        Self {
            block,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &BlockId {
        &self.block.id
    }

    /// Number of nodes in this subtree, including self
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(BlockNode::size).sum::<usize>()
    }
}

/// Page-level metadata (title, slug, SEO). Carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub meta: ConfigMap,
}

impl PageData {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            meta: ConfigMap::new(),
        }
    }
}
