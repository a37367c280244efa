//! Single-use challenge registry.
//!
//! Challenges are ephemeral, in-memory entries keyed by the claimed account
//! key. At most one challenge is outstanding per key; issuing a second
//! overwrites the first. Consumption is atomic check-and-remove, so a payload
//! that already verified once can never verify again.

use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{AuthError, AuthResult};
use capstream_core::time::unix_now;

/// Challenge validity window, seconds.
pub const CHALLENGE_TTL_SECS: u64 = 300;

/// Nonce entropy, bytes.
pub const NONCE_LEN: usize = 32;

/// An outstanding challenge for one claimed account key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// The key the caller claims to control
    pub account_key: String,
    /// Server-issued random nonce
    pub nonce: [u8; NONCE_LEN],
    /// Unix seconds after which the challenge is dead
    pub expires_at: u64,
}

impl Challenge {
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }
}

/// In-memory registry of outstanding challenges.
///
/// A single mutex guards the map; every issue/consume is one atomic
/// read-modify-write with respect to concurrent requests for the same key.
pub struct ChallengeRegistry {
    entries: Mutex<HashMap<String, Challenge>>,
    ttl_secs: u64,
}

impl ChallengeRegistry {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_secs,
        }
    }

    /// Issue a challenge for the claimed key, overwriting any prior entry.
    pub fn issue(&self, claimed_key: &str) -> AuthResult<Challenge> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let challenge = Challenge {
            account_key: claimed_key.to_string(),
            nonce,
            expires_at: unix_now() + self.ttl_secs,
        };

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuthError::Internal("challenge registry lock poisoned".to_string()))?;
        entries.insert(claimed_key.to_string(), challenge.clone());

        tracing::debug!(key = %claimed_key, "challenge issued");
        Ok(challenge)
    }

    /// Atomically remove and return the outstanding challenge for a key.
    ///
    /// Expired entries are deleted on detection and reported as such; they
    /// are never handed back to callers.
    pub fn consume(&self, claimed_key: &str) -> AuthResult<Challenge> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuthError::Internal("challenge registry lock poisoned".to_string()))?;

        let challenge = entries
            .remove(claimed_key)
            .ok_or(AuthError::ChallengeNotFound)?;

        if challenge.is_expired(unix_now()) {
            tracing::debug!(key = %claimed_key, "expired challenge dropped on consume");
            return Err(AuthError::ChallengeExpired);
        }

        Ok(challenge)
    }

    /// Drop every expired entry. Correctness never depends on this; it only
    /// bounds memory when issued challenges are abandoned.
    pub fn sweep_expired(&self) -> usize {
        let now = unix_now();
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(_) => return 0,
        };
        let before = entries.len();
        entries.retain(|_, challenge| !challenge.is_expired(now));
        before - entries.len()
    }

    /// Number of outstanding challenges (live and not-yet-swept expired).
    pub fn outstanding(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}
