//! CSV Holdings Import
//!
//! Imports manually tracked holdings (the ones no probe can reach) from a
//! `ticker,quantity[,avg_cost[,current_price[,account_type]]]` file.
//! Malformed rows are skipped with a logged warning, never aborting the
//! import; a header row and `#` comment lines are ignored.

use std::path::Path;

use thiserror::Error;

use crate::domain::position::AccountType;
use crate::domain::snapshot::Holding;
use crate::ports::store::{SnapshotStore, StoreError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read import file: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Import holdings from `path`, upserting each row keyed on
/// (ticker, account type).
pub fn import_csv(path: &Path, store: &dyn SnapshotStore) -> Result<ImportSummary, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)?;

    let mut summary = ImportSummary::default();

    for (index, row) in reader.records().enumerate() {
        let line = index + 2; // header occupies line 1

        let record = match row {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping line {line}: {e}");
                summary.skipped += 1;
                continue;
            }
        };

        match parse_row(&record) {
            Some(holding) => {
                store.upsert_holding(&holding)?;
                tracing::info!("Imported {}: {} shares", holding.ticker, holding.quantity);
                summary.imported += 1;
            }
            None => {
                tracing::warn!("Skipping line {line}: invalid format");
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

fn parse_row(record: &csv::StringRecord) -> Option<Holding> {
    let ticker = record.get(0)?.to_uppercase();
    if ticker.is_empty() {
        return None;
    }

    let quantity: f64 = record.get(1)?.parse().ok()?;
    if quantity <= 0.0 {
        return None;
    }

    // Cost, price, and account type are optional; missing or unparseable
    // trailing columns degrade to defaults, matching manual entry.
    let avg_cost = record
        .get(2)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0.0);
    let current_price = record
        .get(3)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0.0);
    let account_type = record
        .get(4)
        .and_then(|value| value.parse().ok())
        .unwrap_or(AccountType::Individual);

    Some(Holding {
        market_value: quantity * current_price,
        ticker,
        quantity,
        avg_cost,
        current_price,
        account_type,
    })
}
