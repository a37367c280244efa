//! Dual-protocol investor authentication for Capstream.
//!
//! Two unrelated identity protocols establish who an investor is:
//!
//! - **Signed assertions**: a self-contained, Schnorr-signed statement bound
//!   to a purpose code and a freshness window. Verification is stateless.
//! - **Challenge-response**: the server issues a signed, time-bounded payload
//!   embedding a single-use nonce; the client counter-signs it with their
//!   account key. Both signatures must verify.
//!
//! Either path resolves to the same investor directory and, on success,
//! materializes a server-side session. Sessions and challenges carry no
//! business data; the investor record is re-resolved on every protected
//! request.
//!
//! # Security Model
//!
//! - Challenges are single use: consumption removes the registry entry, so
//!   replaying an already-verified payload fails
//! - At most one challenge is outstanding per account key (last write wins)
//! - All expirations are data; expired entries self-delete on detection
//! - Session identifiers carry 32 bytes of OS entropy
//! - Authentication state is injected store objects, never ambient globals

pub mod assertion;
pub mod authenticator;
pub mod challenge;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod server_key;
pub mod session;

#[cfg(test)]
pub(crate) mod testkit;

pub use assertion::{IdentityAssertion, HTTP_AUTH_KIND};
pub use authenticator::{ChallengeAuthenticator, IssuedChallenge};
pub use challenge::{Challenge, ChallengeRegistry, CHALLENGE_TTL_SECS};
pub use envelope::{Base64JsonCodec, ChallengeEnvelope, EnvelopeCodec, ENVELOPE_VERSION};
pub use error::{AuthError, AuthResult};
pub use gateway::{AuthGateway, InvestorSummary, LoginOutcome, SessionStatus, SweepReport};
pub use server_key::ServerKeypair;
pub use session::{SessionStore, SESSION_TTL_SECS};
