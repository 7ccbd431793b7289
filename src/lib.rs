//! Holdsync - Robinhood Holdings Reconciliation
//!
//! Probes the brokerage's overlapping position endpoints, resolves opaque
//! instrument references to tickers and live prices, deduplicates across
//! sources, and syncs one consistent holdings snapshot to the local store.
//!
//! # Modules
//!
//! - `domain`: Core reconciliation logic (positions, classifier, merge, snapshot)
//! - `ports`: Trait abstractions (BrokerageGateway, SnapshotStore)
//! - `adapters`: External implementations (Robinhood API, SQLite, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Probe chain, resolver, reconciler, importer

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
