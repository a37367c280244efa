//! Error types for settlement operations.

use capstream_domain::StoreError;
use thiserror::Error;

/// Errors reported synchronously to the settlement caller. A failed
/// settlement never partially persists.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The (month, year) pair has already been settled
    #[error("revenue period {month} {year} already exists")]
    DuplicatePeriod { month: String, year: i32 },

    /// Revenue figure out of range
    #[error("invalid revenue: {0}")]
    InvalidRevenue(String),

    /// Malformed or missing request fields
    #[error("invalid request: {0}")]
    Validation(String),

    /// Repository failure
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl SettlementError {
    /// HTTP status code this failure maps to at the service boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            SettlementError::DuplicatePeriod { .. }
            | SettlementError::InvalidRevenue(_)
            | SettlementError::Validation(_) => 400,
            SettlementError::Store(_) => 500,
        }
    }
}

/// Result type for settlement operations.
pub type SettlementResult<T> = Result<T, SettlementError>;
