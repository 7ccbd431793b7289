//! Reconciler
//!
//! Drives one reconciliation run: probe every source, resolve and classify
//! each raw record, merge with first-seen-wins, build the snapshot, and hand
//! it to the store. Only configuration, authentication, and persistence
//! problems abort a run; source and resolution failures degrade the data
//! quality of the snapshot without failing it.

use thiserror::Error;

use super::probes::run_probe_chain;
use super::resolver::resolve_position;
use crate::config::ConfigError;
use crate::domain::merge::merge_positions;
use crate::domain::snapshot::{build_snapshot, AccountFilter, HoldingsSnapshot};
use crate::ports::brokerage::{BrokerageError, BrokerageGateway};
use crate::ports::store::{SnapshotStore, StoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Brokerage unreachable: {0}")]
    Gateway(String),
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

impl From<ConfigError> for SyncError {
    fn from(e: ConfigError) -> Self {
        SyncError::Config(e.to_string())
    }
}

impl From<BrokerageError> for SyncError {
    fn from(e: BrokerageError) -> Self {
        match e {
            BrokerageError::AuthenticationFailed(message) => SyncError::Authentication(message),
            other => SyncError::Gateway(other.to_string()),
        }
    }
}

/// One-shot reconciliation over a gateway and a store.
pub struct Reconciler<'a> {
    gateway: &'a dyn BrokerageGateway,
    store: &'a dyn SnapshotStore,
    filter: AccountFilter,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        gateway: &'a dyn BrokerageGateway,
        store: &'a dyn SnapshotStore,
        filter: AccountFilter,
    ) -> Self {
        Self {
            gateway,
            store,
            filter,
        }
    }

    /// Run one reconciliation and persist the resulting snapshot.
    ///
    /// An empty snapshot is a valid outcome, not an error: when every source
    /// fails, the run still succeeds if the (empty) replace commits.
    pub async fn run(&self) -> Result<HoldingsSnapshot, SyncError> {
        let raw = run_probe_chain(self.gateway).await;
        tracing::info!("Probe chain produced {} raw records", raw.len());

        let mut resolved = Vec::with_capacity(raw.len());
        for record in raw {
            if let Some(position) = resolve_position(self.gateway, record).await {
                resolved.push(position);
            }
        }

        let merged = merge_positions(resolved);
        let snapshot = build_snapshot(&merged, self.filter);

        let stored = self.store.replace_holdings(&snapshot.holdings)?;
        tracing::info!(
            "Stored {} holdings, total value {:.2}",
            stored,
            snapshot.total_value
        );

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStore;
    use crate::domain::position::AccountType;
    use crate::domain::snapshot::Holding;
    use crate::ports::brokerage::{AggregateHolding, MockBrokerageGateway, PositionRecord};
    use approx::assert_relative_eq;

    fn all_probes_empty(gateway: &mut MockBrokerageGateway) {
        gateway.expect_aggregate_holdings().returning(|| Ok(vec![]));
        gateway.expect_all_positions().returning(|| Ok(vec![]));
        gateway.expect_list_accounts().returning(|| Ok(vec![]));
        gateway
            .expect_positions_at()
            .returning(|path| Err(BrokerageError::EndpointUnavailable(path.to_string())));
    }

    /// Source A (aggregate): AAPL individual. Source B (all positions): AAPL
    /// under a Roth account. Both must survive as separate entries.
    fn two_account_type_gateway() -> MockBrokerageGateway {
        let mut gateway = MockBrokerageGateway::new();
        gateway.expect_aggregate_holdings().returning(|| {
            Ok(vec![AggregateHolding {
                symbol: "AAPL".to_string(),
                quantity: 10.0,
                avg_cost: 100.0,
                price: Some(150.0),
                equity: None,
                account_ref: "https://api.robinhood.com/accounts/5RT12345/".to_string(),
            }])
        });
        gateway.expect_all_positions().returning(|| {
            Ok(vec![PositionRecord {
                instrument_url: "https://api.robinhood.com/instruments/abc/".to_string(),
                quantity: 5.0,
                average_buy_price: 90.0,
                account_ref: "https://api.robinhood.com/accounts/ROTH9876/".to_string(),
            }])
        });
        gateway.expect_list_accounts().returning(|| Ok(vec![]));
        gateway
            .expect_positions_at()
            .returning(|path| Err(BrokerageError::EndpointUnavailable(path.to_string())));
        gateway
            .expect_instrument_symbol()
            .returning(|_| Ok(Some("AAPL".to_string())));
        gateway
            .expect_latest_price()
            .returning(|_| Ok(Some(150.0)));
        gateway
    }

    #[tokio::test]
    async fn test_same_ticker_in_two_account_types_yields_two_entries() {
        let gateway = two_account_type_gateway();
        let store = SqliteStore::open_in_memory().unwrap();

        let snapshot = Reconciler::new(&gateway, &store, AccountFilter::All)
            .run()
            .await
            .unwrap();

        assert_eq!(snapshot.holdings.len(), 2);

        let individual = snapshot
            .holdings
            .iter()
            .find(|h| h.account_type == AccountType::Individual)
            .unwrap();
        let retirement = snapshot
            .holdings
            .iter()
            .find(|h| h.account_type == AccountType::Retirement)
            .unwrap();

        assert_relative_eq!(individual.market_value, 1500.0);
        assert_relative_eq!(retirement.market_value, 750.0);
        assert_relative_eq!(snapshot.total_value, 2250.0);
    }

    #[tokio::test]
    async fn test_first_seen_wins_across_sources() {
        let mut gateway = MockBrokerageGateway::new();
        gateway.expect_aggregate_holdings().returning(|| {
            Ok(vec![AggregateHolding {
                symbol: "AAPL".to_string(),
                quantity: 10.0,
                avg_cost: 100.0,
                price: Some(150.0),
                equity: None,
                account_ref: "https://api.robinhood.com/accounts/5RT12345/".to_string(),
            }])
        });
        // Lower-priority source reports the same position with stale cost.
        gateway.expect_all_positions().returning(|| {
            Ok(vec![PositionRecord {
                instrument_url: "https://api.robinhood.com/instruments/abc/".to_string(),
                quantity: 10.0,
                average_buy_price: 80.0,
                account_ref: "https://api.robinhood.com/accounts/5RT12345/".to_string(),
            }])
        });
        gateway.expect_list_accounts().returning(|| Ok(vec![]));
        gateway
            .expect_positions_at()
            .returning(|path| Err(BrokerageError::EndpointUnavailable(path.to_string())));
        gateway
            .expect_instrument_symbol()
            .returning(|_| Ok(Some("AAPL".to_string())));
        gateway
            .expect_latest_price()
            .returning(|_| Ok(Some(150.0)));

        let store = SqliteStore::open_in_memory().unwrap();
        let snapshot = Reconciler::new(&gateway, &store, AccountFilter::All)
            .run()
            .await
            .unwrap();

        assert_eq!(snapshot.holdings.len(), 1);
        assert_relative_eq!(snapshot.holdings[0].avg_cost, 100.0);
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_an_empty_success() {
        let mut gateway = MockBrokerageGateway::new();
        gateway
            .expect_aggregate_holdings()
            .returning(|| Err(BrokerageError::RequestFailed("down".into())));
        gateway
            .expect_all_positions()
            .returning(|| Err(BrokerageError::RequestFailed("down".into())));
        gateway
            .expect_list_accounts()
            .returning(|| Err(BrokerageError::RequestFailed("down".into())));
        gateway
            .expect_positions_at()
            .returning(|path| Err(BrokerageError::EndpointUnavailable(path.to_string())));

        let store = SqliteStore::open_in_memory().unwrap();
        let snapshot = Reconciler::new(&gateway, &store, AccountFilter::All)
            .run()
            .await
            .unwrap();

        assert!(snapshot.holdings.is_empty());
        assert_relative_eq!(snapshot.total_value, 0.0);
        assert_relative_eq!(snapshot.total_cost, 0.0);
        assert_relative_eq!(snapshot.gain_percent, 0.0);
        assert!(store.load_holdings().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconciliation_is_idempotent() {
        let gateway = two_account_type_gateway();
        let store = SqliteStore::open_in_memory().unwrap();

        let first = Reconciler::new(&gateway, &store, AccountFilter::All)
            .run()
            .await
            .unwrap();
        let second = Reconciler::new(&gateway, &store, AccountFilter::All)
            .run()
            .await
            .unwrap();

        assert_eq!(first.holdings, second.holdings);
        assert_relative_eq!(first.total_value, second.total_value);
        assert_relative_eq!(first.total_cost, second.total_cost);
        assert_eq!(
            store.load_holdings().unwrap().len(),
            second.holdings.len()
        );
    }

    #[tokio::test]
    async fn test_filter_is_applied_before_totals_and_persistence() {
        let gateway = two_account_type_gateway();
        let store = SqliteStore::open_in_memory().unwrap();

        let snapshot = Reconciler::new(&gateway, &store, AccountFilter::Retirement)
            .run()
            .await
            .unwrap();

        assert_eq!(snapshot.holdings.len(), 1);
        assert_eq!(snapshot.holdings[0].account_type, AccountType::Retirement);
        assert_relative_eq!(snapshot.total_value, 750.0);
        assert_relative_eq!(snapshot.total_cost, 450.0);
        assert_eq!(store.load_holdings().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolution_failure_drops_only_that_position() {
        let mut gateway = MockBrokerageGateway::new();
        gateway.expect_aggregate_holdings().returning(|| Ok(vec![]));
        gateway.expect_all_positions().returning(|| {
            Ok(vec![
                PositionRecord {
                    instrument_url: "https://api.robinhood.com/instruments/gone/".to_string(),
                    quantity: 3.0,
                    average_buy_price: 10.0,
                    account_ref: String::new(),
                },
                PositionRecord {
                    instrument_url: "https://api.robinhood.com/instruments/abc/".to_string(),
                    quantity: 5.0,
                    average_buy_price: 90.0,
                    account_ref: "https://api.robinhood.com/accounts/5RT12345/".to_string(),
                },
            ])
        });
        gateway.expect_list_accounts().returning(|| Ok(vec![]));
        gateway
            .expect_positions_at()
            .returning(|path| Err(BrokerageError::EndpointUnavailable(path.to_string())));
        gateway
            .expect_instrument_symbol()
            .withf(|url| url.contains("/gone/"))
            .returning(|_| Ok(None));
        gateway
            .expect_instrument_symbol()
            .withf(|url| url.contains("/abc/"))
            .returning(|_| Ok(Some("AAPL".to_string())));
        gateway
            .expect_latest_price()
            .returning(|_| Ok(Some(150.0)));

        let store = SqliteStore::open_in_memory().unwrap();
        let snapshot = Reconciler::new(&gateway, &store, AccountFilter::All)
            .run()
            .await
            .unwrap();

        assert_eq!(snapshot.holdings.len(), 1);
        assert_eq!(snapshot.holdings[0].ticker, "AAPL");
    }

    #[tokio::test]
    async fn test_persistence_failure_is_fatal() {
        struct FailingStore;

        impl SnapshotStore for FailingStore {
            fn replace_holdings(&self, _holdings: &[Holding]) -> Result<usize, StoreError> {
                Err(StoreError::Write("disk full".into()))
            }
            fn load_holdings(&self) -> Result<Vec<Holding>, StoreError> {
                Ok(vec![])
            }
            fn upsert_holding(&self, _holding: &Holding) -> Result<(), StoreError> {
                Ok(())
            }
            fn clear_holdings(&self) -> Result<usize, StoreError> {
                Ok(0)
            }
        }

        let mut gateway = MockBrokerageGateway::new();
        all_probes_empty(&mut gateway);

        let store = FailingStore;
        let result = Reconciler::new(&gateway, &store, AccountFilter::All)
            .run()
            .await;

        assert!(matches!(result, Err(SyncError::Persistence(_))));
    }
}
