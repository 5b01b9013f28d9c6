use thiserror::Error;

/// Error for cache backend operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cached value could not be (de)serialized: {0}")]
    Serialization(String),
}
