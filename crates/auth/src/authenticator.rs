//! Challenge-response authentication flow.
//!
//! # Protocol Flow
//!
//! 1. Caller claims an account key; the server issues a signed envelope
//!    embedding a single-use nonce and a validity window
//! 2. Caller counter-signs the envelope with the claimed key
//! 3. Server consumes the outstanding challenge, verifies both signatures
//!    over the same bytes, and resolves the key to an investor
//!
//! Consumption happens before signature verification, so a payload is dead
//! the moment it is presented: a replay finds no registry entry regardless
//! of how the first attempt ended.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use std::sync::Arc;

use crate::challenge::ChallengeRegistry;
use crate::envelope::{ChallengeEnvelope, EnvelopeCodec, ENVELOPE_VERSION};
use crate::error::{AuthError, AuthResult};
use crate::server_key::ServerKeypair;
use capstream_core::time::unix_now;
use capstream_domain::{Investor, InvestorDirectory, KeyKind};

/// What `begin` hands back to the caller: the opaque signed payload to
/// counter-sign, plus the network it is scoped to.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedChallenge {
    pub transaction: String,
    pub network_passphrase: String,
}

/// Orchestrates challenge issuance and verification.
pub struct ChallengeAuthenticator {
    registry: ChallengeRegistry,
    server_key: ServerKeypair,
    codec: Box<dyn EnvelopeCodec>,
    directory: Arc<dyn InvestorDirectory>,
    network_passphrase: String,
}

impl ChallengeAuthenticator {
    pub fn new(
        registry: ChallengeRegistry,
        server_key: ServerKeypair,
        codec: Box<dyn EnvelopeCodec>,
        directory: Arc<dyn InvestorDirectory>,
        network_passphrase: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            server_key,
            codec,
            directory,
            network_passphrase: network_passphrase.into(),
        }
    }

    pub fn server_key_id(&self) -> &str {
        self.server_key.key_id()
    }

    /// Issue a challenge envelope for the claimed account key.
    ///
    /// Any prior outstanding challenge for the same key is invalidated.
    pub fn begin(&self, claimed_key: &str) -> AuthResult<IssuedChallenge> {
        decode_account_key(claimed_key)?;

        let challenge = self.registry.issue(claimed_key)?;
        let mut envelope = ChallengeEnvelope {
            version: ENVELOPE_VERSION,
            server_key: self.server_key.public_key_hex(),
            subject_key: claimed_key.to_string(),
            nonce: BASE64.encode(challenge.nonce),
            network_passphrase: self.network_passphrase.clone(),
            min_time: unix_now(),
            max_time: challenge.expires_at,
            server_signature: None,
            subject_signature: None,
        };

        let bytes = envelope.signing_bytes()?;
        envelope.server_signature = Some(hex::encode(self.server_key.sign(&bytes).to_bytes()));

        let transaction = self.codec.encode(&envelope)?;
        tracing::info!(
            key = %claimed_key,
            server_key_id = %self.server_key.key_id(),
            "challenge issued"
        );

        Ok(IssuedChallenge {
            transaction,
            network_passphrase: self.network_passphrase.clone(),
        })
    }

    /// Verify a counter-signed envelope and resolve the investor it claims.
    pub fn complete(&self, signed_payload: &str) -> AuthResult<Investor> {
        let envelope = self.codec.decode(signed_payload)?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(AuthError::Validation(format!(
                "unsupported envelope version {}",
                envelope.version
            )));
        }

        let challenge = self.registry.consume(&envelope.subject_key)?;

        // An envelope carrying any nonce other than the outstanding one is
        // stale; the consume above already burned the outstanding entry.
        if envelope.nonce_bytes()?.as_slice() != challenge.nonce.as_slice() {
            return Err(AuthError::ChallengeNotFound);
        }

        if envelope.server_key != self.server_key.public_key_hex() {
            return Err(AuthError::InvalidSignature);
        }

        let bytes = envelope.signing_bytes()?;

        let server_signature = decode_signature(envelope.server_signature.as_deref())?;
        self.server_key
            .verifying_key()
            .verify(&bytes, &server_signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let subject_key =
            decode_account_key(&envelope.subject_key).map_err(|_| AuthError::InvalidSignature)?;
        let subject_signature = decode_signature(envelope.subject_signature.as_deref())?;
        subject_key
            .verify(&bytes, &subject_signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let investor = self
            .directory
            .investor_by_key(KeyKind::Account, &envelope.subject_key)?
            .ok_or(AuthError::UnknownIdentity)?;

        tracing::info!(investor_id = %investor.id, "challenge completed");
        Ok(investor)
    }

    /// Drop expired registry entries.
    pub fn sweep_expired(&self) -> usize {
        self.registry.sweep_expired()
    }
}

fn decode_account_key(key_hex: &str) -> AuthResult<VerifyingKey> {
    let bytes = hex::decode(key_hex)
        .map_err(|_| AuthError::Validation("public key is not valid hex".to_string()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| AuthError::Validation("public key must be 32 bytes".to_string()))?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| AuthError::Validation("public key is not a valid ed25519 point".to_string()))
}

fn decode_signature(signature_hex: Option<&str>) -> AuthResult<Signature> {
    let signature_hex = signature_hex.ok_or(AuthError::InvalidSignature)?;
    let bytes = hex::decode(signature_hex).map_err(|_| AuthError::InvalidSignature)?;
    let bytes: [u8; 64] = bytes.try_into().map_err(|_| AuthError::InvalidSignature)?;
    Ok(Signature::from_bytes(&bytes))
}
