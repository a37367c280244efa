//! Narrow repository traits the core talks to storage through.
//!
//! Each method is one logical operation with all-or-nothing semantics; no
//! partial failure is ever exposed to callers. Implementations must be safe
//! to share across threads behind an `Arc`.

use crate::error::StoreResult;
use crate::model::{
    Investor, InvestorId, InvestorUpdate, KeyKind, NewInvestor, NewPayout, NewRevenuePeriod,
    Payout, PayoutDetail, PayoutStatus, RevenuePeriod,
};

/// Lookup and administration of investor identity records.
pub trait InvestorDirectory: Send + Sync {
    /// Resolve an investor by one of their public keys.
    fn investor_by_key(&self, kind: KeyKind, key: &str) -> StoreResult<Option<Investor>>;

    /// Resolve an investor by identifier.
    fn investor_by_id(&self, id: &InvestorId) -> StoreResult<Option<Investor>>;

    /// All registered investors.
    fn list_investors(&self) -> StoreResult<Vec<Investor>>;

    /// Administrative creation. Validates fields and enforces key uniqueness.
    fn create_investor(&self, investor: NewInvestor) -> StoreResult<Investor>;

    /// Explicit field updates; public keys are immutable.
    fn update_investor(&self, id: &InvestorId, update: InvestorUpdate) -> StoreResult<Investor>;
}

/// Persistence for revenue periods and their payout sets.
pub trait SettlementLedger: Send + Sync {
    /// Look up a period by its unique (month, year) pair.
    fn find_revenue_period(&self, month: &str, year: i32) -> StoreResult<Option<RevenuePeriod>>;

    /// All periods, newest first.
    fn list_revenue_periods(&self) -> StoreResult<Vec<RevenuePeriod>>;

    /// Persist a period together with its full payout set in a single
    /// transaction. A concurrent write for the same (month, year) pair
    /// surfaces as `StoreError::Conflict` and leaves nothing behind.
    fn record_settlement(
        &self,
        period: NewRevenuePeriod,
        payouts: Vec<NewPayout>,
    ) -> StoreResult<(RevenuePeriod, Vec<Payout>)>;

    /// An investor's payouts joined with their periods, newest first.
    fn payouts_for_investor(&self, id: &InvestorId) -> StoreResult<Vec<PayoutDetail>>;

    /// Status transition driven by the external settlement process; the only
    /// mutation a payout record ever sees.
    fn update_payout_status(
        &self,
        payout_id: i64,
        status: PayoutStatus,
        settlement_ref: Option<String>,
    ) -> StoreResult<()>;
}
