//! Deduplicating Merger
//!
//! Folds resolved positions from every probe strategy into one collection
//! with a unique (ticker, account type) key. First-seen wins: probes run in
//! priority order, so the earliest source to report a key is authoritative
//! for it. The same ticker held under two account types stays as two
//! entries; a stock in both a taxable and a retirement account is not a
//! duplicate.

use std::collections::HashSet;

use crate::domain::position::{AccountType, ResolvedPosition};

/// Merge positions in probe order, dropping exact (ticker, account type)
/// duplicates. Input order is preserved for the survivors, so the result is
/// deterministic for deterministic upstream responses.
pub fn merge_positions(positions: Vec<ResolvedPosition>) -> Vec<ResolvedPosition> {
    let mut seen: HashSet<(String, AccountType)> = HashSet::with_capacity(positions.len());
    let mut merged = Vec::with_capacity(positions.len());

    for position in positions {
        if seen.insert(position.key()) {
            merged.push(position);
        } else {
            tracing::debug!(
                "Discarding duplicate {} ({}) reported by {}",
                position.ticker,
                position.account_type,
                position.source.name()
            );
        }
    }

    merged
}
