//! Read models joining payouts, periods and investor data.
//!
//! Nothing here mutates state; every view is recomputed from the ledger on
//! demand.

use serde::Serialize;
use std::sync::Arc;

use crate::error::SettlementResult;
use capstream_domain::{Investor, PayoutDetail, PayoutStatus, RevenuePeriod, SettlementLedger};

/// Periods considered "recent" when sizing the dashboard.
const RECENT_PERIOD_WINDOW: usize = 12;
const DASHBOARD_PERIOD_LIMIT: usize = 6;
const DASHBOARD_PAYOUT_LIMIT: usize = 10;

/// Investor-facing dashboard slice.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub investor: DashboardInvestor,
    pub stats: DashboardStats,
    pub recent_periods: Vec<RevenuePeriod>,
    pub recent_payouts: Vec<PayoutDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardInvestor {
    pub name: Option<String>,
    pub investment_amount: f64,
    pub investment_date: String,
    pub share_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_investment_pool: f64,
    pub total_payouts_received: f64,
    pub expected_monthly_payout: f64,
    pub total_payouts_count: usize,
    pub pending_payouts_count: usize,
}

/// An investor's complete payout history.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutHistory {
    pub payouts: Vec<PayoutDetail>,
    pub total_count: usize,
    pub total_completed_amount: f64,
}

/// All settled periods with running totals.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueOverview {
    pub periods: Vec<RevenuePeriod>,
    pub total_count: usize,
    pub total_revenue: f64,
    pub total_investor_payouts: f64,
}

/// Read-side queries over the settlement ledger.
pub struct ReportService {
    ledger: Arc<dyn SettlementLedger>,
    total_investment_pool: f64,
}

impl ReportService {
    pub fn new(ledger: Arc<dyn SettlementLedger>, total_investment_pool: f64) -> Self {
        Self {
            ledger,
            total_investment_pool,
        }
    }

    /// Dashboard for one investor: pool share, payout totals, and the
    /// expected payout if the latest period's terms repeated.
    pub fn dashboard(&self, investor: &Investor) -> SettlementResult<Dashboard> {
        let share_percentage =
            investor.investment_amount / self.total_investment_pool * 100.0;

        let mut periods = self.ledger.list_revenue_periods()?;
        periods.truncate(RECENT_PERIOD_WINDOW);

        let payouts = self.ledger.payouts_for_investor(&investor.id)?;

        let total_payouts_received = completed_total(&payouts);
        let pending_payouts_count = payouts
            .iter()
            .filter(|detail| detail.payout.status == PayoutStatus::Pending)
            .count();

        let expected_monthly_payout = periods
            .first()
            .map(|latest| latest.total_investor_payout * share_percentage / 100.0)
            .unwrap_or(0.0);

        let stats = DashboardStats {
            total_investment_pool: self.total_investment_pool,
            total_payouts_received,
            expected_monthly_payout,
            total_payouts_count: payouts.len(),
            pending_payouts_count,
        };

        let mut recent_periods = periods;
        recent_periods.truncate(DASHBOARD_PERIOD_LIMIT);
        let mut recent_payouts = payouts;
        recent_payouts.truncate(DASHBOARD_PAYOUT_LIMIT);

        Ok(Dashboard {
            investor: DashboardInvestor {
                name: investor.name.clone(),
                investment_amount: investor.investment_amount,
                investment_date: investor.investment_date.clone(),
                share_percentage,
            },
            stats,
            recent_periods,
            recent_payouts,
        })
    }

    /// Full payout history for one investor.
    pub fn payout_history(&self, investor: &Investor) -> SettlementResult<PayoutHistory> {
        let payouts = self.ledger.payouts_for_investor(&investor.id)?;
        let total_completed_amount = completed_total(&payouts);
        Ok(PayoutHistory {
            total_count: payouts.len(),
            total_completed_amount,
            payouts,
        })
    }

    /// Every settled period, with aggregate totals.
    pub fn revenue_overview(&self) -> SettlementResult<RevenueOverview> {
        let periods = self.ledger.list_revenue_periods()?;
        let total_revenue = periods.iter().map(|p| p.total_revenue).sum();
        let total_investor_payouts = periods.iter().map(|p| p.total_investor_payout).sum();
        Ok(RevenueOverview {
            total_count: periods.len(),
            total_revenue,
            total_investor_payouts,
            periods,
        })
    }
}

fn completed_total(payouts: &[PayoutDetail]) -> f64 {
    payouts
        .iter()
        .filter(|detail| detail.payout.status == PayoutStatus::Completed)
        .map(|detail| detail.payout.amount)
        .sum()
}
