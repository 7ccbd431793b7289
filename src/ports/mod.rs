//! Ports Layer - trait seams for external dependencies
//!
//! Following the hexagonal layout, adapters implement these traits:
//! - `BrokerageGateway`: the brokerage's overlapping HTTP endpoint surface
//! - `SnapshotStore`: transactional holdings persistence

pub mod brokerage;
pub mod store;

pub use brokerage::{
    AccountRecord, AggregateHolding, BrokerageError, BrokerageGateway, PositionRecord,
};
pub use store::{SnapshotStore, StoreError};
