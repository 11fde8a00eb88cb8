//! # Pagewright Model
//!
//! Data model for block-based pages: the flat block list, the derived tree
//! view, id generation, and template registry types.

pub mod block;
pub mod error;
pub mod id_generator;
pub mod template;
pub mod tree;

pub use block::{
    Block, BlockId, BlockNode, ConfigMap, ContainerType, FlexDirection, LayoutSettings, PageData,
};
pub use error::{ModelError, ModelResult};
pub use id_generator::{get_page_seed, IdGenerator};
pub use template::{BlockTemplate, TemplateDefaults, TemplateRegistry};

#[cfg(test)]
mod proptests;
