//! Brokerage Gateway Port
//!
//! The endpoint surface the probe chain consumes, abstracted behind a trait
//! so strategies can be exercised against scripted gateways in tests. Every
//! method maps to one upstream call and returns typed records; a
//! response-shape surprise surfaces as `BrokerageError`, never as a silent
//! default.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerageError {
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("Unexpected response shape: {0}")]
    MalformedResponse(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Endpoint not available: {0}")]
    EndpointUnavailable(String),
}

impl From<reqwest::Error> for BrokerageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BrokerageError::RequestFailed(format!("request timed out: {e}"))
        } else {
            BrokerageError::RequestFailed(e.to_string())
        }
    }
}

/// One row from the aggregate-holdings endpoint (already symbol-keyed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateHolding {
    pub symbol: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub price: Option<f64>,
    /// The source's own market value; authoritative when present.
    pub equity: Option<f64>,
    pub account_ref: String,
}

/// One row from a positions-style endpoint (instrument referenced by URL).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub instrument_url: String,
    pub quantity: f64,
    pub average_buy_price: f64,
    pub account_ref: String,
}

/// One row from the account-enumeration endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_number: String,
    pub url: String,
    /// Account type hint as reported upstream, e.g. "roth_ira".
    pub kind: Option<String>,
}

impl AccountRecord {
    /// Reference string handed to the classifier: the account URL, annotated
    /// with the upstream type hint when one exists.
    pub fn classification_ref(&self) -> String {
        match &self.kind {
            Some(kind) if !kind.is_empty() => format!("{} type={}", self.url, kind),
            _ => self.url.clone(),
        }
    }
}

/// The brokerage's overlapping, partially reliable endpoint surface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerageGateway: Send + Sync {
    /// Primary aggregate-holdings call.
    async fn aggregate_holdings(&self) -> Result<Vec<AggregateHolding>, BrokerageError>;

    /// Generic all-positions call.
    async fn all_positions(&self) -> Result<Vec<PositionRecord>, BrokerageError>;

    /// Account enumeration.
    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, BrokerageError>;

    /// Positions scoped to one discovered account.
    async fn account_positions(
        &self,
        account_number: &str,
    ) -> Result<Vec<PositionRecord>, BrokerageError>;

    /// Positions from a speculative relative path that may not exist at all.
    async fn positions_at(&self, path: &str) -> Result<Vec<PositionRecord>, BrokerageError>;

    /// Resolve an instrument URL to its ticker symbol, if the lookup knows one.
    async fn instrument_symbol(
        &self,
        instrument_url: &str,
    ) -> Result<Option<String>, BrokerageError>;

    /// Latest quoted price for a symbol, if a quote exists.
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>, BrokerageError>;
}
