//! Error types for the index coordination layer.

use thiserror::Error;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur in index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Invalid caller input. Surfaced synchronously, never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Store failure other than an expected absence.
    #[error("store error: {0}")]
    Store(#[from] stowage_store::StoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
