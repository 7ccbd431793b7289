//! Run Report Envelopes
//!
//! The exact JSON documents the process emits: one success envelope with the
//! snapshot embedded, or one error envelope with the failure message.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::snapshot::{AccountFilter, Holding, HoldingsSnapshot};

/// Success envelope written to stdout after a completed sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub status: &'static str,
    pub account_type: AccountFilter,
    pub holdings_count: usize,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain: f64,
    pub gain_percent: f64,
    pub holdings: Vec<Holding>,
    pub timestamp: DateTime<Utc>,
}

impl From<HoldingsSnapshot> for SyncReport {
    fn from(snapshot: HoldingsSnapshot) -> Self {
        Self {
            status: "success",
            account_type: snapshot.account_type,
            holdings_count: snapshot.holdings.len(),
            total_value: snapshot.total_value,
            total_cost: snapshot.total_cost,
            total_gain: snapshot.total_gain,
            gain_percent: snapshot.gain_percent,
            holdings: snapshot.holdings,
            timestamp: snapshot.timestamp,
        }
    }
}

/// Error envelope written to stderr when a run aborts.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub status: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
