//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist. Expected for lazily-created keys;
    /// callers decide whether absence is an error.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Backend I/O failure (network, service error, corrupt response).
    #[error("store operation failed: {0}")]
    Backend(String),
}
