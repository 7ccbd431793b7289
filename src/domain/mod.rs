//! Domain Layer - pure reconciliation logic
//!
//! No I/O here: the position model, account classification, the
//! deduplicating merge, and snapshot totals. External interactions happen
//! through the ports layer.

pub mod classifier;
pub mod merge;
pub mod position;
pub mod snapshot;

pub use classifier::classify_account_ref;
pub use merge::merge_positions;
pub use position::{
    AccountType, InstrumentRef, ProbeSource, RawPosition, ResolvedPosition, UNKNOWN_TICKER,
};
pub use snapshot::{build_snapshot, AccountFilter, Holding, HoldingsSnapshot};
