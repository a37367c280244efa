//! Error types for Capstream authentication operations.

use capstream_domain::StoreError;
use thiserror::Error;

/// Errors that can occur across both authentication protocols and the
/// session lifecycle. Every failure is terminal for the request; nothing in
/// this crate retries.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A signature did not verify, or a required signature was missing
    #[error("invalid signature")]
    InvalidSignature,

    /// Assertion timestamp outside the freshness window
    #[error("assertion timestamp too old or in future")]
    StaleAssertion,

    /// Assertion purpose code is not the HTTP-auth constant
    #[error("wrong assertion kind for HTTP auth")]
    WrongPurpose,

    /// No challenge outstanding for the presented key
    #[error("challenge not found")]
    ChallengeNotFound,

    /// The outstanding challenge expired before completion
    #[error("challenge expired")]
    ChallengeExpired,

    /// The presented key does not belong to any registered investor
    #[error("no investor matches the presented key")]
    UnknownIdentity,

    /// No valid session backs the request
    #[error("not authenticated")]
    Unauthenticated,

    /// The session existed but its expiry has passed
    #[error("session expired")]
    SessionExpired,

    /// Malformed or missing request fields
    #[error("invalid request: {0}")]
    Validation(String),

    /// Repository failure
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Unexpected internal fault
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status code this failure maps to at the service boundary.
    ///
    /// Unknown identity is deliberately distinguishable from a bad
    /// credential; acceptable for an internal operator tool, not for a
    /// public-facing identity provider.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 400,
            AuthError::UnknownIdentity => 404,
            AuthError::Store(_) | AuthError::Internal(_) => 500,
            _ => 401,
        }
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
