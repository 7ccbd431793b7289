//! Instrument Resolver
//!
//! Turns a raw record's opaque instrument reference into a ticker and a
//! quoted price, and attaches the account classification. Symbol resolution
//! failure drops the position (diagnostic in the log, never in the run's
//! output); a failed quote lookup soft-degrades the price to 0 and keeps
//! the position.

use crate::domain::classifier::classify_account_ref;
use crate::domain::position::{InstrumentRef, RawPosition, ResolvedPosition, UNKNOWN_TICKER};
use crate::ports::brokerage::BrokerageGateway;

/// Resolve one raw position. Returns `None` when the instrument cannot be
/// mapped to a symbol; such records never enter the merged set.
pub async fn resolve_position(
    gateway: &dyn BrokerageGateway,
    raw: RawPosition,
) -> Option<ResolvedPosition> {
    let ticker = match &raw.instrument {
        InstrumentRef::Symbol(symbol) if symbol.trim().is_empty() => UNKNOWN_TICKER.to_string(),
        InstrumentRef::Symbol(symbol) => symbol.clone(),
        InstrumentRef::Url(url) => match gateway.instrument_symbol(url).await {
            Ok(Some(symbol)) => symbol,
            Ok(None) => {
                tracing::warn!("Instrument {url} resolved to no symbol, dropping position");
                return None;
            }
            Err(e) => {
                tracing::warn!("Instrument lookup for {url} failed, dropping position: {e}");
                return None;
            }
        },
    };

    // Price comes from a separate quote lookup than the one that proved the
    // position exists; a dead quote endpoint must not kill the position.
    let current_price = match raw.price {
        Some(price) => price,
        None if ticker == UNKNOWN_TICKER => 0.0,
        None => match gateway.latest_price(&ticker).await {
            Ok(Some(price)) => price,
            Ok(None) => {
                tracing::warn!("No quote for {ticker}, keeping position at price 0");
                0.0
            }
            Err(e) => {
                tracing::warn!("Quote lookup for {ticker} failed, keeping position at price 0: {e}");
                0.0
            }
        },
    };

    Some(ResolvedPosition {
        account_type: classify_account_ref(&raw.account_ref),
        ticker,
        quantity: raw.quantity,
        avg_cost: raw.avg_cost,
        current_price,
        equity: raw.equity,
        source: raw.source,
    })
}
