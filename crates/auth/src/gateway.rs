//! Authentication gateway: the composition root for both login protocols
//! and the session guard protecting every authenticated read.
//!
//! Dispatch is by protocol, not by identity type: stateless assertions go
//! through signature verification plus a directory lookup on the assertion
//! key; challenge completions go through the authenticator. Both end in the
//! same place, a session materialized against the resolved investor.

use serde::Serialize;
use std::sync::Arc;

use crate::assertion::{self, IdentityAssertion};
use crate::authenticator::{ChallengeAuthenticator, IssuedChallenge};
use crate::error::{AuthError, AuthResult};
use crate::session::SessionStore;
use capstream_domain::{AuthMethod, Investor, InvestorDirectory, InvestorId, KeyKind};

/// The subset of investor fields login and status responses expose.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestorSummary {
    pub id: InvestorId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub investment_amount: f64,
}

impl From<&Investor> for InvestorSummary {
    fn from(investor: &Investor) -> Self {
        Self {
            id: investor.id.clone(),
            name: investor.name.clone(),
            email: investor.email.clone(),
            investment_amount: investor.investment_amount,
        }
    }
}

/// A successful login: the session to hand back to the caller's transport
/// (cookie), plus a summary of who authenticated.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub session_id: String,
    pub method: AuthMethod,
    pub investor: InvestorSummary,
}

/// Point-in-time answer to "is this session valid"; never an error.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub method: Option<AuthMethod>,
    pub investor: Option<InvestorSummary>,
}

/// Counts from one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub challenges: usize,
    pub sessions: usize,
}

/// Routes credentials to the right verification path and guards protected
/// operations.
pub struct AuthGateway {
    directory: Arc<dyn InvestorDirectory>,
    authenticator: ChallengeAuthenticator,
    sessions: SessionStore,
}

impl AuthGateway {
    pub fn new(
        directory: Arc<dyn InvestorDirectory>,
        authenticator: ChallengeAuthenticator,
        sessions: SessionStore,
    ) -> Self {
        Self {
            directory,
            authenticator,
            sessions,
        }
    }

    /// Stateless-protocol login: verify the assertion, resolve its key,
    /// materialize a session.
    pub fn login_with_assertion(&self, assertion: &IdentityAssertion) -> AuthResult<LoginOutcome> {
        assertion::verify(assertion)?;

        let investor = self
            .directory
            .investor_by_key(KeyKind::Assertion, &assertion.pubkey)?
            .ok_or(AuthError::UnknownIdentity)?;

        self.establish(investor, AuthMethod::Assertion)
    }

    /// First half of the challenge protocol.
    pub fn begin_challenge(&self, claimed_key: &str) -> AuthResult<IssuedChallenge> {
        self.authenticator.begin(claimed_key)
    }

    /// Second half of the challenge protocol: verify the counter-signed
    /// payload and materialize a session.
    pub fn complete_challenge(&self, signed_payload: &str) -> AuthResult<LoginOutcome> {
        let investor = self.authenticator.complete(signed_payload)?;
        self.establish(investor, AuthMethod::Challenge)
    }

    fn establish(&self, investor: Investor, method: AuthMethod) -> AuthResult<LoginOutcome> {
        let session_id = self.sessions.create(&investor.id, method)?;
        tracing::info!(
            investor_id = %investor.id,
            method = method.as_str(),
            "investor authenticated"
        );
        Ok(LoginOutcome {
            session_id,
            method,
            investor: InvestorSummary::from(&investor),
        })
    }

    /// Guard for protected operations. Every failure path, whatever its
    /// cause, surfaces as `Unauthenticated`; garbage input never faults.
    pub fn require_session(&self, session_id: &str) -> AuthResult<Investor> {
        self.sessions.resolve(session_id).map_err(|e| {
            tracing::debug!(error = %e, "session guard rejected request");
            AuthError::Unauthenticated
        })
    }

    /// Destroy a session. Idempotent; logging out twice is not an error.
    pub fn logout(&self, session_id: &str) {
        self.sessions.destroy(session_id);
    }

    /// Non-failing status probe for the caller's current session.
    pub fn session_status(&self, session_id: &str) -> SessionStatus {
        let method = self.sessions.method_of(session_id);
        match self.sessions.resolve(session_id) {
            Ok(investor) => SessionStatus {
                authenticated: true,
                method,
                investor: Some(InvestorSummary::from(&investor)),
            },
            Err(_) => SessionStatus {
                authenticated: false,
                method: None,
                investor: None,
            },
        }
    }

    /// Drop expired challenges and sessions.
    pub fn sweep_expired(&self) -> SweepReport {
        let report = SweepReport {
            challenges: self.authenticator.sweep_expired(),
            sessions: self.sessions.sweep_expired(),
        };
        if report.challenges > 0 || report.sessions > 0 {
            tracing::debug!(
                challenges = report.challenges,
                sessions = report.sessions,
                "expired auth state swept"
            );
        }
        report
    }
}
