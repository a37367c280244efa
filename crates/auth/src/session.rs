//! Authenticated session store.
//!
//! Sessions are opaque server-side records: an unguessable identifier, the
//! investor it belongs to, the method that established it, and an expiry.
//! They never cache investor attributes; every resolve goes back to the
//! directory, so a session can outlive edits to the investor record without
//! serving stale data.
//!
//! The backing map is an injected store object guarded by an `RwLock`;
//! swapping it for a persistent backend is a construction-time decision.

use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{AuthError, AuthResult};
use capstream_core::time::unix_now;
use capstream_domain::{AuthMethod, Investor, InvestorDirectory, InvestorId};

/// Default session lifetime: 24 hours.
pub const SESSION_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone)]
struct SessionRecord {
    investor_id: InvestorId,
    method: AuthMethod,
    expires_at: u64,
}

/// Store of live sessions keyed by session identifier.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    directory: Arc<dyn InvestorDirectory>,
    ttl_secs: u64,
}

impl SessionStore {
    pub fn new(directory: Arc<dyn InvestorDirectory>, ttl_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            directory,
            ttl_secs,
        }
    }

    /// Create a session for an authenticated investor and return its id.
    pub fn create(&self, investor_id: &InvestorId, method: AuthMethod) -> AuthResult<String> {
        let session_id = new_session_id();
        let record = SessionRecord {
            investor_id: investor_id.clone(),
            method,
            expires_at: unix_now() + self.ttl_secs,
        };

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AuthError::Internal("session store lock poisoned".to_string()))?;
        sessions.insert(session_id.clone(), record);

        tracing::debug!(investor_id = %investor_id, method = method.as_str(), "session created");
        Ok(session_id)
    }

    /// Resolve a session back to its investor.
    ///
    /// Expired sessions are deleted on detection: the first resolve after
    /// expiry reports `SessionExpired`, every later one `Unauthenticated`.
    pub fn resolve(&self, session_id: &str) -> AuthResult<Investor> {
        let record = {
            let sessions = self
                .sessions
                .read()
                .map_err(|_| AuthError::Internal("session store lock poisoned".to_string()))?;
            sessions
                .get(session_id)
                .cloned()
                .ok_or(AuthError::Unauthenticated)?
        };

        if unix_now() > record.expires_at {
            self.destroy(session_id);
            return Err(AuthError::SessionExpired);
        }

        self.directory
            .investor_by_id(&record.investor_id)?
            .ok_or(AuthError::UnknownIdentity)
    }

    /// The method a live session was established with.
    pub fn method_of(&self, session_id: &str) -> Option<AuthMethod> {
        let sessions = self.sessions.read().ok()?;
        let record = sessions.get(session_id)?;
        if unix_now() > record.expires_at {
            return None;
        }
        Some(record.method)
    }

    /// Delete a session. Absence is not an error.
    pub fn destroy(&self, session_id: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(session_id);
        }
    }

    /// Drop every expired session; bounds memory, not correctness.
    pub fn sweep_expired(&self) -> usize {
        let now = unix_now();
        let mut sessions = match self.sessions.write() {
            Ok(sessions) => sessions,
            Err(_) => return 0,
        };
        let before = sessions.len();
        sessions.retain(|_, record| now <= record.expires_at);
        before - sessions.len()
    }

    /// Number of stored sessions (live and not-yet-swept expired).
    pub fn active(&self) -> usize {
        self.sessions.read().map(|sessions| sessions.len()).unwrap_or(0)
    }
}

/// Unguessable session identifier: uuid plus 32 bytes of OS entropy.
fn new_session_id() -> String {
    let mut entropy = [0u8; 32];
    OsRng.fill_bytes(&mut entropy);
    format!("{}-{}", uuid::Uuid::new_v4(), hex::encode(entropy))
}
