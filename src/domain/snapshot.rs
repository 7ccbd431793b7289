//! Snapshot Builder
//!
//! Applies the requested account-type filter and computes portfolio totals
//! over the merged position set. Filtering happens before the totals, so a
//! filtered snapshot's summary matches exactly the holdings it contains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::position::{AccountType, ResolvedPosition};

/// Account-type filter requested for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountFilter {
    All,
    Individual,
    Retirement,
}

impl AccountFilter {
    /// Strict tag match; `All` passes everything, including `Unknown`.
    pub fn matches(&self, account_type: AccountType) -> bool {
        match self {
            AccountFilter::All => true,
            AccountFilter::Individual => account_type == AccountType::Individual,
            AccountFilter::Retirement => account_type == AccountType::Retirement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountFilter::All => "all",
            AccountFilter::Individual => "individual",
            AccountFilter::Retirement => "retirement",
        }
    }
}

impl fmt::Display for AccountFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(AccountFilter::All),
            "individual" => Ok(AccountFilter::Individual),
            "retirement" => Ok(AccountFilter::Retirement),
            other => Err(format!(
                "unknown account filter {other:?}, expected all, individual, or retirement"
            )),
        }
    }
}

/// One stored and reported holding row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub account_type: AccountType,
}

impl Holding {
    /// Per-share gain percent for display; 0 when the cost basis is unknown.
    pub fn gain_pct(&self) -> f64 {
        if self.avg_cost > 0.0 {
            (self.current_price - self.avg_cost) / self.avg_cost * 100.0
        } else {
            0.0
        }
    }
}

/// Complete reconciled snapshot with summary totals. The only artifact that
/// leaves a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingsSnapshot {
    pub account_type: AccountFilter,
    pub holdings: Vec<Holding>,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain: f64,
    pub gain_percent: f64,
    pub timestamp: DateTime<Utc>,
}

/// Build a snapshot from merged positions: filter first, then total.
///
/// gain_percent is defined as 0 when total cost is 0; an all-gift or
/// cost-unknown portfolio is not an error condition.
pub fn build_snapshot(positions: &[ResolvedPosition], filter: AccountFilter) -> HoldingsSnapshot {
    let holdings: Vec<Holding> = positions
        .iter()
        .filter(|position| filter.matches(position.account_type))
        .map(|position| Holding {
            ticker: position.ticker.clone(),
            quantity: position.quantity,
            avg_cost: position.avg_cost,
            current_price: position.current_price,
            market_value: position.market_value(),
            account_type: position.account_type,
        })
        .collect();

    let total_value: f64 = holdings.iter().map(|h| h.market_value).sum();
    let total_cost: f64 = holdings.iter().map(|h| h.quantity * h.avg_cost).sum();
    let total_gain = total_value - total_cost;
    let gain_percent = if total_cost > 0.0 {
        total_gain / total_cost * 100.0
    } else {
        0.0
    };

    HoldingsSnapshot {
        account_type: filter,
        holdings,
        total_value,
        total_cost,
        total_gain,
        gain_percent,
        timestamp: Utc::now(),
    }
}
