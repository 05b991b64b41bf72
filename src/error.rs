//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror. A cache miss is not an
//! error: lookups return `Option` and only misuse or caller-supplied failures
//! end up here.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// TTL or window duration was zero or too large to schedule
    #[error("TTL must be greater than zero and within the clock's range")]
    InvalidTtl,

    /// Invalid key, pattern or argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Caller-supplied loader failed; nothing was cached
    #[error("Loader failed for key '{key}': {source}")]
    Load {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Caller-supplied writer failed; the cache was left untouched
    #[error("Writer failed for key '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Value could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Returns true for errors caused by the caller passing bad arguments.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CacheError::InvalidTtl | CacheError::InvalidArgument(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
