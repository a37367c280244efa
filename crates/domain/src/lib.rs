//! Domain model for the Capstream investor platform.
//!
//! Investors are the root entity; every other record points back at them by
//! identifier. A single investor may hold either or both of two unrelated
//! public keys: an assertion key (stateless signed-assertion protocol) and an
//! account key (challenge-response protocol). Revenue periods and payouts are
//! owned by the settlement subsystem and reference investors one-way.
//!
//! This crate also defines the narrow repository traits the rest of the
//! system talks to storage through, keeping the storage engine swappable and
//! the core testable.

pub mod error;
pub mod model;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use model::{
    AuthMethod, Investor, InvestorId, InvestorUpdate, KeyKind, NewInvestor, NewPayout,
    NewRevenuePeriod, Payout, PayoutDetail, PayoutStatus, RevenuePeriod,
};
pub use repository::{InvestorDirectory, SettlementLedger};
