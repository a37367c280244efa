//! The payout engine.
//!
//! # Algorithm
//!
//! For a settlement request with revenue `R`, pool share `s`, and total
//! investment pool `P`:
//!
//! - investor pool payout: `R × s / 100`
//! - per investor with investment `a`: share = `a / P × 100` percent,
//!   payout = pool payout × share / 100
//!
//! Every investor registered at settlement time receives exactly one
//! `Pending` payout, zero-amount included; investors added afterwards get
//! nothing for the period. Amounts are plain `f64` with no intermediate
//! rounding, so the payout sum matches the pool payout only up to
//! floating-point error; no remainder redistribution is performed.
//!
//! # Atomicity
//!
//! The duplicate-period check, period creation and payout creation form one
//! unit: a mutex serializes settlements within the process and the ledger
//! writes the period plus its payout set in a single transaction. Of two
//! concurrent calls for the same period, exactly one succeeds; the other
//! observes `DuplicatePeriod`.

use std::sync::{Arc, Mutex};

use crate::error::{SettlementError, SettlementResult};
use capstream_domain::{
    InvestorDirectory, NewPayout, NewRevenuePeriod, Payout, RevenuePeriod, SettlementLedger,
    StoreError,
};

/// One settlement trigger: the period, its revenue, and the sharing terms in
/// force when it was triggered.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementRequest {
    pub month: String,
    pub year: i32,
    pub total_revenue: f64,
    /// Percentage of revenue flowing to the investor pool
    pub share_percentage: f64,
    /// Total capital raised; denominator for every investor's share
    pub investment_pool: f64,
}

/// The persisted result of a settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementOutcome {
    pub period: RevenuePeriod,
    pub payouts: Vec<Payout>,
}

/// Computes and records proportional payouts for revenue periods.
pub struct PayoutEngine {
    ledger: Arc<dyn SettlementLedger>,
    directory: Arc<dyn InvestorDirectory>,
    settle_lock: Mutex<()>,
}

impl PayoutEngine {
    pub fn new(ledger: Arc<dyn SettlementLedger>, directory: Arc<dyn InvestorDirectory>) -> Self {
        Self {
            ledger,
            directory,
            settle_lock: Mutex::new(()),
        }
    }

    /// Settle one revenue period.
    pub fn settle(&self, request: SettlementRequest) -> SettlementResult<SettlementOutcome> {
        validate(&request)?;

        let _guard = self
            .settle_lock
            .lock()
            .map_err(|_| StoreError::Backend("settlement lock poisoned".to_string()))?;

        if self
            .ledger
            .find_revenue_period(&request.month, request.year)?
            .is_some()
        {
            return Err(SettlementError::DuplicatePeriod {
                month: request.month,
                year: request.year,
            });
        }

        let investor_pool_payout = request.total_revenue * request.share_percentage / 100.0;

        let investors = self.directory.list_investors()?;
        let payouts: Vec<NewPayout> = investors
            .iter()
            .map(|investor| {
                let share_percentage =
                    investor.investment_amount / request.investment_pool * 100.0;
                NewPayout {
                    investor_id: investor.id.clone(),
                    amount: investor_pool_payout * share_percentage / 100.0,
                    share_percentage,
                }
            })
            .collect();

        let period = NewRevenuePeriod {
            month: request.month.clone(),
            year: request.year,
            total_revenue: request.total_revenue,
            investor_share_percentage: request.share_percentage,
            total_investor_payout: investor_pool_payout,
        };

        let (period, payouts) = self
            .ledger
            .record_settlement(period, payouts)
            .map_err(|e| match e {
                // Lost a race with a concurrent settlement for the same pair.
                StoreError::Conflict(_) => SettlementError::DuplicatePeriod {
                    month: request.month.clone(),
                    year: request.year,
                },
                other => SettlementError::Store(other),
            })?;

        tracing::info!(
            month = %period.month,
            year = period.year,
            total_revenue = period.total_revenue,
            investor_pool_payout = period.total_investor_payout,
            payout_count = payouts.len(),
            "revenue period settled"
        );

        Ok(SettlementOutcome { period, payouts })
    }
}

fn validate(request: &SettlementRequest) -> SettlementResult<()> {
    if request.month.is_empty() {
        return Err(SettlementError::Validation("month is required".to_string()));
    }
    if !request.total_revenue.is_finite() || request.total_revenue < 0.0 {
        return Err(SettlementError::InvalidRevenue(format!(
            "total_revenue must be a non-negative number, got {}",
            request.total_revenue
        )));
    }
    if !request.share_percentage.is_finite()
        || !(0.0..=100.0).contains(&request.share_percentage)
    {
        return Err(SettlementError::Validation(
            "share_percentage must be between 0 and 100".to_string(),
        ));
    }
    if !request.investment_pool.is_finite() || request.investment_pool <= 0.0 {
        return Err(SettlementError::Validation(
            "investment_pool must be positive".to_string(),
        ));
    }
    Ok(())
}
