//! SQLite Adapter
//!
//! Local holdings persistence behind the `SnapshotStore` port.

mod store;

pub use store::SqliteStore;
