//! Revenue settlement for Capstream.
//!
//! Settlement turns one period's revenue figure into a persisted
//! `RevenuePeriod` and one `Payout` per registered investor, each sized by
//! the investor's share of the total investment pool. The computation is
//! deterministic double-precision arithmetic with no intermediate rounding;
//! only display layers round.
//!
//! The read side ([`report`]) joins payout history with periods and investor
//! data for dashboards and history views.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::{PayoutEngine, SettlementOutcome, SettlementRequest};
pub use error::{SettlementError, SettlementResult};
pub use report::{Dashboard, PayoutHistory, ReportService, RevenueOverview};
