//! Signed, time-bounded challenge envelopes.
//!
//! The challenge protocol frames its nonce inside a transaction-like payload
//! the client counter-signs: the envelope names the claimed key as subject,
//! embeds the registry nonce and a validity window, and carries two signature
//! slots (server first, then subject). Its outer encoding is an external
//! protocol detail hidden behind [`EnvelopeCodec`]; the authenticator only
//! ever handles the decoded structure.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Envelope protocol version.
pub const ENVELOPE_VERSION: u32 = 1;

/// The challenge payload both parties sign.
///
/// Both signatures cover [`signing_bytes`](ChallengeEnvelope::signing_bytes),
/// the canonical serialization with the signature slots cleared, so the
/// subject's counter-signature attests to exactly what the server issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeEnvelope {
    /// Protocol version (must equal [`ENVELOPE_VERSION`])
    pub version: u32,
    /// Hex ed25519 key the server signed with
    pub server_key: String,
    /// Hex ed25519 key the caller claims to control
    pub subject_key: String,
    /// Base64 registry nonce
    pub nonce: String,
    /// Network identifier the envelope is scoped to
    pub network_passphrase: String,
    /// Validity window, unix seconds
    pub min_time: u64,
    pub max_time: u64,
    /// Hex server signature over the signing bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_signature: Option<String>,
    /// Hex counter-signature from the subject key over the signing bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_signature: Option<String>,
}

impl ChallengeEnvelope {
    /// Canonical bytes both signatures are computed over.
    pub fn signing_bytes(&self) -> AuthResult<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.server_signature = None;
        unsigned.subject_signature = None;
        serde_json::to_vec(&unsigned)
            .map_err(|e| AuthError::Internal(format!("envelope serialization failed: {e}")))
    }

    /// Decode the embedded nonce.
    pub fn nonce_bytes(&self) -> AuthResult<Vec<u8>> {
        BASE64
            .decode(&self.nonce)
            .map_err(|e| AuthError::Validation(format!("envelope nonce is not valid base64: {e}")))
    }
}

/// Pluggable outer encoding for challenge envelopes.
///
/// The registry, signature checks and identity resolution never parse wire
/// encodings themselves; swapping the codec swaps the external framing.
pub trait EnvelopeCodec: Send + Sync {
    fn encode(&self, envelope: &ChallengeEnvelope) -> AuthResult<String>;
    fn decode(&self, raw: &str) -> AuthResult<ChallengeEnvelope>;
}

/// Default framing: compact JSON wrapped in standard base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64JsonCodec;

impl EnvelopeCodec for Base64JsonCodec {
    fn encode(&self, envelope: &ChallengeEnvelope) -> AuthResult<String> {
        let raw = serde_json::to_vec(envelope)
            .map_err(|e| AuthError::Internal(format!("envelope serialization failed: {e}")))?;
        Ok(BASE64.encode(raw))
    }

    fn decode(&self, raw: &str) -> AuthResult<ChallengeEnvelope> {
        let bytes = BASE64
            .decode(raw.trim())
            .map_err(|e| AuthError::Validation(format!("payload is not valid base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::Validation(format!("payload is not a challenge envelope: {e}")))
    }
}
