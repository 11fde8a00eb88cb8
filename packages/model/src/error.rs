use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid block data: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unknown container type: {0}")]
    UnknownContainerType(String),
}
