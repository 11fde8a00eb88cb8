pub mod cache;
pub mod error;
pub mod visitor;

pub use cache::*;
pub use error::*;
pub use visitor::*;
