//! Stateless signed-assertion verification.
//!
//! An assertion is a self-contained identity statement: a public key, an
//! issued-at timestamp, a purpose code and a Schnorr signature over the
//! assertion's canonical serialization. Verification is a pure function of
//! the assertion and the current time; no state is consulted or mutated.
//!
//! Passing verification does not authenticate anyone by itself. The caller
//! must still resolve the embedded key to a registered investor.
//!
//! # Verification Order
//!
//! 1. Canonical digest matches and the signature verifies for the embedded key
//! 2. Issued-at is within ±300 seconds of now
//! 3. Purpose code equals the reserved HTTP-auth constant (27235)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use k256::schnorr::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AuthError, AuthResult};

/// Reserved purpose code for HTTP authentication assertions.
pub const HTTP_AUTH_KIND: u32 = 27235;

/// Maximum allowed clock skew between issuer and verifier, seconds.
pub const FRESHNESS_WINDOW_SECS: u64 = 300;

/// Bearer scheme prefix for header-delivered assertions.
const BEARER_SCHEME: &str = "Nostr ";

/// A signed identity assertion as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityAssertion {
    /// Hex SHA-256 of the canonical serialization
    pub id: String,
    /// Hex x-only secp256k1 public key (32 bytes)
    pub pubkey: String,
    /// Unix seconds at which the assertion was issued
    pub created_at: u64,
    /// Purpose code; must equal [`HTTP_AUTH_KIND`]
    pub kind: u32,
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    #[serde(default)]
    pub content: String,
    /// Hex Schnorr signature (64 bytes) over the canonical digest
    pub sig: String,
}

impl IdentityAssertion {
    /// Parse an assertion delivered as a bearer-style header value
    /// (`Nostr <base64 JSON>`).
    pub fn from_bearer_header(header: &str) -> AuthResult<Self> {
        let encoded = header
            .strip_prefix(BEARER_SCHEME)
            .ok_or_else(|| AuthError::Validation("missing assertion authorization header".to_string()))?;
        let raw = BASE64
            .decode(encoded.trim())
            .map_err(|e| AuthError::Validation(format!("assertion is not valid base64: {e}")))?;
        serde_json::from_slice(&raw)
            .map_err(|e| AuthError::Validation(format!("assertion is not valid JSON: {e}")))
    }

    /// Parse an assertion delivered in a JSON request body under `event`.
    pub fn from_body(body: &serde_json::Value) -> AuthResult<Self> {
        let event = body
            .get("event")
            .ok_or_else(|| AuthError::Validation("event is required".to_string()))?;
        serde_json::from_value(event.clone())
            .map_err(|e| AuthError::Validation(format!("event is malformed: {e}")))
    }
}

/// Canonical digest of an assertion's signed fields.
///
/// The serialization is the fixed-order array
/// `[0, pubkey, created_at, kind, tags, content]`, hashed with SHA-256.
/// Exposed so clients (and tests) can produce signable assertions.
pub fn canonical_digest(
    pubkey: &str,
    created_at: u64,
    kind: u32,
    tags: &[Vec<String>],
    content: &str,
) -> AuthResult<[u8; 32]> {
    let canonical = serde_json::json!([0, pubkey, created_at, kind, tags, content]);
    let bytes = serde_json::to_vec(&canonical)
        .map_err(|e| AuthError::Internal(format!("canonical serialization failed: {e}")))?;
    Ok(Sha256::digest(&bytes).into())
}

/// Verify an assertion against the current clock.
pub fn verify(assertion: &IdentityAssertion) -> AuthResult<()> {
    verify_at(assertion, capstream_core::time::unix_now())
}

/// Verify an assertion against an explicit clock. Pure function of its
/// inputs; used directly by tests.
pub fn verify_at(assertion: &IdentityAssertion, now: u64) -> AuthResult<()> {
    let digest = canonical_digest(
        &assertion.pubkey,
        assertion.created_at,
        assertion.kind,
        &assertion.tags,
        &assertion.content,
    )?;

    // The advertised id must be the digest actually signed; a mismatch means
    // the signature covers different bytes than the ones presented.
    if !assertion.id.eq_ignore_ascii_case(&hex::encode(digest)) {
        return Err(AuthError::InvalidSignature);
    }

    let key_bytes = hex::decode(&assertion.pubkey).map_err(|_| AuthError::InvalidSignature)?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|_| AuthError::InvalidSignature)?;

    let sig_bytes = hex::decode(&assertion.sig).map_err(|_| AuthError::InvalidSignature)?;
    let signature =
        Signature::try_from(sig_bytes.as_slice()).map_err(|_| AuthError::InvalidSignature)?;

    verifying_key
        .verify_raw(&digest, &signature)
        .map_err(|_| AuthError::InvalidSignature)?;

    if now.abs_diff(assertion.created_at) > FRESHNESS_WINDOW_SECS {
        return Err(AuthError::StaleAssertion);
    }

    if assertion.kind != HTTP_AUTH_KIND {
        return Err(AuthError::WrongPurpose);
    }

    Ok(())
}
