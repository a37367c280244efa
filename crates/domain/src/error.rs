//! Storage error type shared by every repository backend.

use thiserror::Error;

/// Errors surfaced by repository implementations.
///
/// Kept backend-agnostic: concrete stores map their driver errors into
/// `Backend` so the traits in this crate never leak an engine type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage engine failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Uniqueness violation (duplicate key, duplicate period)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Record rejected before reaching the backend
    #[error("invalid record: {0}")]
    Validation(String),

    /// I/O errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;
