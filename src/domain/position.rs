//! Position Model
//!
//! Raw and resolved position types that flow through one reconciliation run.
//! `RawPosition` is whatever a probe strategy could extract from the wire;
//! `ResolvedPosition` adds the ticker, price, and account classification the
//! rest of the pipeline keys on. Both are discarded when the run ends; only
//! the snapshot crosses the persistence boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ticker used when a pre-resolved source row carries an empty symbol.
pub const UNKNOWN_TICKER: &str = "UNKNOWN";

/// Which probe strategy produced a raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeSource {
    /// Primary aggregate-holdings endpoint.
    AggregateHoldings,
    /// Generic all-positions endpoint.
    AllPositions,
    /// Account enumeration plus per-account positions sub-calls.
    AccountEnumeration,
    /// Speculative retirement endpoint scan.
    RetirementScan,
}

impl ProbeSource {
    pub fn name(&self) -> &'static str {
        match self {
            ProbeSource::AggregateHoldings => "aggregate_holdings",
            ProbeSource::AllPositions => "all_positions",
            ProbeSource::AccountEnumeration => "account_enumeration",
            ProbeSource::RetirementScan => "retirement_scan",
        }
    }
}

/// Opaque instrument reference as a source reported it.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentRef {
    /// The source already reported a ticker symbol.
    Symbol(String),
    /// The source reported an instrument URL that needs a lookup.
    Url(String),
}

/// One position record as extracted from a single source, before resolution.
#[derive(Debug, Clone)]
pub struct RawPosition {
    pub instrument: InstrumentRef,
    /// Share count; probes discard rows where this is not > 0.
    pub quantity: f64,
    pub avg_cost: f64,
    /// Opaque account reference the classifier keys on.
    pub account_ref: String,
    /// Price already supplied by the source, if any.
    pub price: Option<f64>,
    /// Market value supplied by the source; trusted over quantity * price.
    pub equity: Option<f64>,
    pub source: ProbeSource,
}

/// Custodial account classification, inferred heuristically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Individual,
    Retirement,
    Unknown,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Individual => "individual",
            AccountType::Retirement => "retirement",
            AccountType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "individual" => Ok(AccountType::Individual),
            "retirement" => Ok(AccountType::Retirement),
            "unknown" => Ok(AccountType::Unknown),
            other => Err(format!(
                "unknown account type {other:?}, expected individual, retirement, or unknown"
            )),
        }
    }
}

/// A position with ticker, price, and account classification attached.
#[derive(Debug, Clone)]
pub struct ResolvedPosition {
    pub ticker: String,
    pub quantity: f64,
    pub avg_cost: f64,
    /// 0.0 when the quote lookup failed (soft-degraded record).
    pub current_price: f64,
    pub account_type: AccountType,
    /// Source-supplied market value, if any.
    pub equity: Option<f64>,
    pub source: ProbeSource,
}

impl ResolvedPosition {
    /// Market value: the source's own equity figure when present, otherwise
    /// quantity * current price.
    pub fn market_value(&self) -> f64 {
        self.equity.unwrap_or(self.quantity * self.current_price)
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.avg_cost
    }

    /// Merge key: the same ticker may appear once per account type.
    pub fn key(&self) -> (String, AccountType) {
        (self.ticker.clone(), self.account_type)
    }
}
