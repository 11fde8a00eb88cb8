use thiserror::Error;

/// Failure of a local cache backend
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CommonResult<T> = Result<T, CommonError>;
