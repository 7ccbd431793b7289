//! Source Probe Chain
//!
//! An ordered list of independent fetch strategies. Every strategy runs on
//! every reconciliation, regardless of earlier successes: the narrower
//! strategies exist to surface accounts (retirement, mostly) the primary
//! call omits. A strategy failure is logged and yields zero records; it
//! never aborts the chain. The chain is a visible data structure so tests
//! can assert the fallback policy directly instead of poking at nested
//! error handling.

use crate::domain::position::{InstrumentRef, ProbeSource, RawPosition};
use crate::ports::brokerage::{
    AccountRecord, AggregateHolding, BrokerageError, BrokerageGateway, PositionRecord,
};

/// Speculative retirement endpoints, tried in order as a last resort for
/// the undocumented retirement API. The sub-chain stops at the first path
/// that yields usable records.
pub const SPECULATIVE_RETIREMENT_PATHS: &[&str] = &[
    "positions/?nonzero=true&type=retirement",
    "retirement/positions/",
    "ira/positions/",
];

/// One fetch strategy in the fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStrategy {
    AggregateHoldings,
    AllPositions,
    AccountEnumeration,
    RetirementScan,
}

impl ProbeStrategy {
    /// The chain, in priority order. Merge-time "first seen" refers to this
    /// exact order.
    pub const CHAIN: [ProbeStrategy; 4] = [
        ProbeStrategy::AggregateHoldings,
        ProbeStrategy::AllPositions,
        ProbeStrategy::AccountEnumeration,
        ProbeStrategy::RetirementScan,
    ];

    pub fn source(&self) -> ProbeSource {
        match self {
            ProbeStrategy::AggregateHoldings => ProbeSource::AggregateHoldings,
            ProbeStrategy::AllPositions => ProbeSource::AllPositions,
            ProbeStrategy::AccountEnumeration => ProbeSource::AccountEnumeration,
            ProbeStrategy::RetirementScan => ProbeSource::RetirementScan,
        }
    }

    pub fn name(&self) -> &'static str {
        self.source().name()
    }

    /// Run this strategy against the gateway.
    pub async fn collect(
        &self,
        gateway: &dyn BrokerageGateway,
    ) -> Result<Vec<RawPosition>, BrokerageError> {
        match self {
            ProbeStrategy::AggregateHoldings => collect_aggregate(gateway).await,
            ProbeStrategy::AllPositions => collect_all_positions(gateway).await,
            ProbeStrategy::AccountEnumeration => collect_by_account(gateway).await,
            ProbeStrategy::RetirementScan => collect_retirement_scan(gateway).await,
        }
    }
}

/// Run the whole chain in priority order, folding every strategy's yield
/// into one list. Failed strategies contribute nothing.
pub async fn run_probe_chain(gateway: &dyn BrokerageGateway) -> Vec<RawPosition> {
    let mut raw = Vec::new();

    for strategy in ProbeStrategy::CHAIN {
        match strategy.collect(gateway).await {
            Ok(records) => {
                tracing::info!("Probe {} yielded {} records", strategy.name(), records.len());
                raw.extend(records);
            }
            Err(e) => {
                tracing::warn!("Probe {} failed, continuing: {}", strategy.name(), e);
            }
        }
    }

    raw
}

fn from_aggregate(row: AggregateHolding) -> RawPosition {
    RawPosition {
        instrument: InstrumentRef::Symbol(row.symbol),
        quantity: row.quantity,
        avg_cost: row.avg_cost,
        account_ref: row.account_ref,
        price: row.price,
        equity: row.equity,
        source: ProbeSource::AggregateHoldings,
    }
}

fn from_position(record: PositionRecord, source: ProbeSource) -> RawPosition {
    RawPosition {
        instrument: InstrumentRef::Url(record.instrument_url),
        quantity: record.quantity,
        avg_cost: record.average_buy_price,
        account_ref: record.account_ref,
        price: None,
        equity: None,
        source,
    }
}

async fn collect_aggregate(
    gateway: &dyn BrokerageGateway,
) -> Result<Vec<RawPosition>, BrokerageError> {
    let rows = gateway.aggregate_holdings().await?;
    Ok(rows
        .into_iter()
        .filter(|row| row.quantity > 0.0)
        .map(from_aggregate)
        .collect())
}

async fn collect_all_positions(
    gateway: &dyn BrokerageGateway,
) -> Result<Vec<RawPosition>, BrokerageError> {
    let rows = gateway.all_positions().await?;
    Ok(rows
        .into_iter()
        .filter(|record| record.quantity > 0.0)
        .map(|record| from_position(record, ProbeSource::AllPositions))
        .collect())
}

async fn collect_by_account(
    gateway: &dyn BrokerageGateway,
) -> Result<Vec<RawPosition>, BrokerageError> {
    let accounts: Vec<AccountRecord> = gateway.list_accounts().await?;
    let mut raw = Vec::new();

    for account in &accounts {
        match gateway.account_positions(&account.account_number).await {
            Ok(rows) => {
                raw.extend(
                    rows.into_iter()
                        .filter(|record| record.quantity > 0.0)
                        .map(|record| {
                            let mut position =
                                from_position(record, ProbeSource::AccountEnumeration);
                            // The enumerated account knows its own type hint;
                            // prefer it over whatever the row carried.
                            position.account_ref = account.classification_ref();
                            position
                        }),
                );
            }
            Err(e) => {
                // One opaque sub-account failing only degrades that account.
                tracing::warn!(
                    "Positions for account {} failed: {}",
                    account.account_number,
                    e
                );
            }
        }
    }

    Ok(raw)
}

async fn collect_retirement_scan(
    gateway: &dyn BrokerageGateway,
) -> Result<Vec<RawPosition>, BrokerageError> {
    for path in SPECULATIVE_RETIREMENT_PATHS {
        match gateway.positions_at(path).await {
            Ok(rows) => {
                let usable: Vec<RawPosition> = rows
                    .into_iter()
                    .filter(|record| record.quantity > 0.0)
                    .map(|record| {
                        let mut position = from_position(record, ProbeSource::RetirementScan);
                        if position.account_ref.is_empty() {
                            // The endpoint path itself is the only account
                            // evidence these records carry.
                            position.account_ref = path.to_string();
                        }
                        position
                    })
                    .collect();

                if !usable.is_empty() {
                    tracing::info!(
                        "Speculative endpoint {} yielded {} records",
                        path,
                        usable.len()
                    );
                    return Ok(usable);
                }
            }
            Err(e) => {
                tracing::debug!("Speculative endpoint {} unavailable: {}", path, e);
            }
        }
    }

    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::brokerage::MockBrokerageGateway;

    fn aggregate_row(symbol: &str, quantity: f64) -> AggregateHolding {
        AggregateHolding {
            symbol: symbol.to_string(),
            quantity,
            avg_cost: 100.0,
            price: Some(150.0),
            equity: None,
            account_ref: "https://api.robinhood.com/accounts/5RT12345/".to_string(),
        }
    }

    fn position_row(instrument: &str, quantity: f64) -> PositionRecord {
        PositionRecord {
            instrument_url: instrument.to_string(),
            quantity,
            average_buy_price: 90.0,
            account_ref: String::new(),
        }
    }

    #[tokio::test]
    async fn test_failed_probe_does_not_abort_the_chain() {
        let mut gateway = MockBrokerageGateway::new();
        gateway
            .expect_aggregate_holdings()
            .returning(|| Err(BrokerageError::RequestFailed("boom".into())));
        gateway.expect_all_positions().returning(|| {
            Ok(vec![position_row(
                "https://api.robinhood.com/instruments/abc/",
                5.0,
            )])
        });
        gateway.expect_list_accounts().returning(|| Ok(vec![]));
        gateway
            .expect_positions_at()
            .returning(|path| Err(BrokerageError::EndpointUnavailable(path.to_string())));

        let raw = run_probe_chain(&gateway).await;

        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].source, ProbeSource::AllPositions);
    }

    #[tokio::test]
    async fn test_every_strategy_runs_even_when_primary_succeeds() {
        let mut gateway = MockBrokerageGateway::new();
        gateway
            .expect_aggregate_holdings()
            .times(1)
            .returning(|| Ok(vec![aggregate_row("AAPL", 10.0)]));
        gateway
            .expect_all_positions()
            .times(1)
            .returning(|| Ok(vec![]));
        gateway
            .expect_list_accounts()
            .times(1)
            .returning(|| Ok(vec![]));
        gateway
            .expect_positions_at()
            .times(SPECULATIVE_RETIREMENT_PATHS.len())
            .returning(|path| Err(BrokerageError::EndpointUnavailable(path.to_string())));

        let raw = run_probe_chain(&gateway).await;
        assert_eq!(raw.len(), 1);
    }

    #[tokio::test]
    async fn test_nonpositive_quantities_never_enter_the_pipeline() {
        let mut gateway = MockBrokerageGateway::new();
        gateway.expect_aggregate_holdings().returning(|| {
            Ok(vec![
                aggregate_row("AAPL", 10.0),
                aggregate_row("SOLD", 0.0),
                aggregate_row("SHRT", -2.0),
            ])
        });
        gateway.expect_all_positions().returning(|| {
            Ok(vec![
                position_row("https://api.robinhood.com/instruments/abc/", 0.0),
                position_row("https://api.robinhood.com/instruments/def/", 3.0),
            ])
        });
        gateway.expect_list_accounts().returning(|| Ok(vec![]));
        gateway
            .expect_positions_at()
            .returning(|path| Err(BrokerageError::EndpointUnavailable(path.to_string())));

        let raw = run_probe_chain(&gateway).await;

        assert_eq!(raw.len(), 2);
        assert!(raw.iter().all(|r| r.quantity > 0.0));
    }

    #[tokio::test]
    async fn test_account_enumeration_tags_rows_with_account_hint() {
        let mut gateway = MockBrokerageGateway::new();
        gateway.expect_list_accounts().returning(|| {
            Ok(vec![
                AccountRecord {
                    account_number: "5RT12345".to_string(),
                    url: "https://api.robinhood.com/accounts/5RT12345/".to_string(),
                    kind: None,
                },
                AccountRecord {
                    account_number: "XY111".to_string(),
                    url: "https://api.robinhood.com/accounts/XY111/".to_string(),
                    kind: Some("ira_roth".to_string()),
                },
            ])
        });
        gateway
            .expect_account_positions()
            .withf(|number| number == "5RT12345")
            .returning(|_| {
                Err(BrokerageError::RequestFailed(
                    "account endpoint flaked".into(),
                ))
            });
        gateway
            .expect_account_positions()
            .withf(|number| number == "XY111")
            .returning(|_| {
                Ok(vec![position_row(
                    "https://api.robinhood.com/instruments/abc/",
                    4.0,
                )])
            });

        let raw = ProbeStrategy::AccountEnumeration.collect(&gateway).await.unwrap();

        // The flaky account degrades alone; the survivor carries the hint.
        assert_eq!(raw.len(), 1);
        assert!(raw[0].account_ref.contains("type=ira_roth"));
    }

    #[tokio::test]
    async fn test_retirement_scan_stops_at_first_usable_path() {
        let mut gateway = MockBrokerageGateway::new();
        gateway
            .expect_positions_at()
            .withf(|path| path == SPECULATIVE_RETIREMENT_PATHS[0])
            .times(1)
            .returning(|path| Err(BrokerageError::EndpointUnavailable(path.to_string())));
        gateway
            .expect_positions_at()
            .withf(|path| path == SPECULATIVE_RETIREMENT_PATHS[1])
            .times(1)
            .returning(|_| {
                Ok(vec![position_row(
                    "https://api.robinhood.com/instruments/ret/",
                    7.0,
                )])
            });
        // No expectation for the third path: calling it would panic.

        let raw = ProbeStrategy::RetirementScan.collect(&gateway).await.unwrap();

        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].account_ref, SPECULATIVE_RETIREMENT_PATHS[1]);
    }

    #[tokio::test]
    async fn test_retirement_scan_skips_empty_yields() {
        let mut gateway = MockBrokerageGateway::new();
        gateway
            .expect_positions_at()
            .withf(|path| path == SPECULATIVE_RETIREMENT_PATHS[0])
            .times(1)
            .returning(|_| Ok(vec![]));
        gateway
            .expect_positions_at()
            .withf(|path| path == SPECULATIVE_RETIREMENT_PATHS[1])
            .times(1)
            .returning(|_| Ok(vec![]));
        gateway
            .expect_positions_at()
            .withf(|path| path == SPECULATIVE_RETIREMENT_PATHS[2])
            .times(1)
            .returning(|_| Ok(vec![]));

        let raw = ProbeStrategy::RetirementScan.collect(&gateway).await.unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn test_chain_order_is_fixed() {
        assert_eq!(
            ProbeStrategy::CHAIN,
            [
                ProbeStrategy::AggregateHoldings,
                ProbeStrategy::AllPositions,
                ProbeStrategy::AccountEnumeration,
                ProbeStrategy::RetirementScan,
            ]
        );
    }
}
