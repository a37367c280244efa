//! Entity types for investors, revenue periods and payouts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, opaque investor identifier. Generated once at creation and never
/// reused; payout history references it forever.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestorId(String);

impl InvestorId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for InvestorId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for InvestorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which of the two public-key namespaces a lookup targets.
///
/// The two namespaces are unrelated protocols that happen to map onto one
/// investor record; dispatch is by which field is populated, never by a
/// polymorphic identity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    /// Stateless signed-assertion protocol key (hex, x-only secp256k1)
    Assertion,
    /// Challenge-response account key (hex, ed25519)
    Account,
}

/// How a session was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Assertion,
    Challenge,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Assertion => "assertion",
            AuthMethod::Challenge => "challenge",
        }
    }
}

/// An investor identity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub id: InvestorId,
    /// Signed-assertion protocol public key (unique if present)
    pub assertion_key: Option<String>,
    /// Challenge-response account public key (unique if present)
    pub account_key: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub investment_amount: f64,
    /// ISO-8601 date of the investment
    pub investment_date: String,
    /// Unix seconds
    pub created_at: u64,
}

/// Input for the administrative investor-creation operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvestor {
    pub assertion_key: Option<String>,
    pub account_key: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub investment_amount: f64,
    pub investment_date: String,
}

impl NewInvestor {
    /// Field validation performed before any record reaches storage.
    ///
    /// At least one of the two public keys must be present; the investment
    /// amount must be strictly positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.assertion_key.is_none() && self.account_key.is_none() {
            return Err("either assertion_key or account_key is required".to_string());
        }
        if let Some(key) = &self.assertion_key {
            if key.is_empty() {
                return Err("assertion_key must not be empty".to_string());
            }
        }
        if let Some(key) = &self.account_key {
            if key.is_empty() {
                return Err("account_key must not be empty".to_string());
            }
        }
        if !(self.investment_amount > 0.0) {
            return Err("investment_amount must be positive".to_string());
        }
        if self.investment_date.is_empty() {
            return Err("investment_date is required".to_string());
        }
        Ok(())
    }
}

/// Explicit field updates for an existing investor. Keys are immutable once
/// assigned; only descriptive fields and the investment position change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestorUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub investment_amount: Option<f64>,
    pub investment_date: Option<String>,
}

impl InvestorUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.investment_amount.is_none()
            && self.investment_date.is_none()
    }
}

/// One settlement unit per (month, year) pair. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePeriod {
    pub id: i64,
    pub month: String,
    pub year: i32,
    pub total_revenue: f64,
    pub investor_share_percentage: f64,
    /// revenue × share percentage / 100, fixed at creation
    pub total_investor_payout: f64,
    pub created_at: u64,
}

/// Input form of a revenue period, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRevenuePeriod {
    pub month: String,
    pub year: i32,
    pub total_revenue: f64,
    pub investor_share_percentage: f64,
    pub total_investor_payout: f64,
}

/// Lifecycle of a payout record. Status transitions are driven by an
/// external settlement process; this core only ever creates `Pending` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(PayoutStatus::Pending),
            "completed" => Some(PayoutStatus::Completed),
            "failed" => Some(PayoutStatus::Failed),
            _ => None,
        }
    }
}

/// One payout record per (investor, revenue period) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: i64,
    pub investor_id: InvestorId,
    pub revenue_period_id: i64,
    pub amount: f64,
    /// The investor's pool-share percentage at computation time
    pub share_percentage: f64,
    pub status: PayoutStatus,
    /// Reference recorded by the external settlement process
    pub settlement_ref: Option<String>,
    pub created_at: u64,
}

/// Input form of a payout; status starts `Pending` and the store assigns
/// id, period reference and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayout {
    pub investor_id: InvestorId,
    pub amount: f64,
    pub share_percentage: f64,
}

/// A payout joined with the fields of the period it settled, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutDetail {
    pub payout: Payout,
    pub month: String,
    pub year: i32,
    pub total_revenue: f64,
    pub total_investor_payout: f64,
}
