//! Snapshot Store Port
//!
//! Persistence contract for the holdings table. The reconciler only needs
//! "replace the whole snapshot transactionally"; the operator commands add
//! upsert/load/clear over the same table.

use thiserror::Error;

use crate::domain::snapshot::Holding;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open holdings store: {0}")]
    Open(String),
    #[error("Holdings write failed: {0}")]
    Write(String),
    #[error("Holdings read failed: {0}")]
    Read(String),
}

pub trait SnapshotStore: Send + Sync {
    /// Atomically replace the stored snapshot with `holdings`. On failure
    /// the previously stored snapshot must remain intact.
    fn replace_holdings(&self, holdings: &[Holding]) -> Result<usize, StoreError>;

    /// Load the stored snapshot, largest market value first.
    fn load_holdings(&self) -> Result<Vec<Holding>, StoreError>;

    /// Insert or update a single manually entered holding, keyed on
    /// (ticker, account type).
    fn upsert_holding(&self, holding: &Holding) -> Result<(), StoreError>;

    /// Delete everything; returns the number of removed rows.
    fn clear_holdings(&self) -> Result<usize, StoreError>;
}
