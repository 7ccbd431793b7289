//! Robinhood Wire Types
//!
//! Typed response shapes for every endpoint the probe chain touches. The
//! upstream API reports numbers as decimal strings and paginates with `next`
//! URLs. Parsing is strict: a missing key or a non-numeric string becomes a
//! `BrokerageError::MalformedResponse` instead of a silent default.

use serde::Deserialize;

use crate::ports::brokerage::{AccountRecord, AggregateHolding, BrokerageError, PositionRecord};

/// Cursor-paginated envelope shared by the list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

fn parse_field(field: &'static str, raw: &str) -> Result<f64, BrokerageError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| BrokerageError::MalformedResponse(format!("{field} is not numeric: {raw:?}")))
}

fn parse_optional(
    field: &'static str,
    raw: &Option<String>,
) -> Result<Option<f64>, BrokerageError> {
    match raw {
        Some(value) if !value.trim().is_empty() => parse_field(field, value).map(Some),
        _ => Ok(None),
    }
}

/// `portfolios/holdings/` row: symbol-keyed, may carry its own valuation.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiHolding {
    pub symbol: String,
    pub quantity: String,
    pub average_buy_price: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub equity: Option<String>,
    #[serde(default)]
    pub account: String,
}

impl ApiHolding {
    pub fn into_record(self) -> Result<AggregateHolding, BrokerageError> {
        Ok(AggregateHolding {
            quantity: parse_field("quantity", &self.quantity)?,
            avg_cost: parse_field("average_buy_price", &self.average_buy_price)?,
            price: parse_optional("price", &self.price)?,
            equity: parse_optional("equity", &self.equity)?,
            symbol: self.symbol,
            account_ref: self.account,
        })
    }
}

/// `positions/` row: instrument referenced by URL only.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPosition {
    pub instrument: String,
    pub quantity: String,
    pub average_buy_price: String,
    #[serde(default)]
    pub account: String,
}

impl ApiPosition {
    pub fn into_record(self) -> Result<PositionRecord, BrokerageError> {
        Ok(PositionRecord {
            quantity: parse_field("quantity", &self.quantity)?,
            average_buy_price: parse_field("average_buy_price", &self.average_buy_price)?,
            instrument_url: self.instrument,
            account_ref: self.account,
        })
    }
}

/// `accounts/` row.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiAccount {
    pub account_number: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ApiAccount {
    pub fn into_record(self) -> AccountRecord {
        AccountRecord {
            account_number: self.account_number,
            url: self.url,
            kind: self.kind,
        }
    }
}

/// Instrument lookup response; only the symbol matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInstrument {
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Quote lookup response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiQuote {
    #[serde(default)]
    pub last_trade_price: Option<String>,
    #[serde(default)]
    pub last_extended_hours_trade_price: Option<String>,
}

impl ApiQuote {
    /// Regular-session price, falling back to the extended-hours print.
    pub fn price(&self) -> Result<Option<f64>, BrokerageError> {
        if let Some(price) = parse_optional("last_trade_price", &self.last_trade_price)? {
            return Ok(Some(price));
        }
        parse_optional(
            "last_extended_hours_trade_price",
            &self.last_extended_hours_trade_price,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paginated_positions_page() {
        let body = r#"{
            "results": [
                {
                    "instrument": "https://api.robinhood.com/instruments/abc/",
                    "quantity": "10.0000",
                    "average_buy_price": "100.0000",
                    "account": "https://api.robinhood.com/accounts/5RT12345/"
                }
            ],
            "next": "https://api.robinhood.com/positions/?cursor=xyz"
        }"#;

        let page: Paginated<ApiPosition> = serde_json::from_str(body).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(
            page.next.as_deref(),
            Some("https://api.robinhood.com/positions/?cursor=xyz")
        );

        let record = page.results[0].clone().into_record().unwrap();
        assert_eq!(record.quantity, 10.0);
        assert_eq!(record.average_buy_price, 100.0);
    }

    #[test]
    fn test_missing_required_key_is_an_error() {
        // No "quantity" field at all.
        let body = r#"{
            "instrument": "https://api.robinhood.com/instruments/abc/",
            "average_buy_price": "100.0000"
        }"#;
        assert!(serde_json::from_str::<ApiPosition>(body).is_err());
    }

    #[test]
    fn test_non_numeric_quantity_is_malformed() {
        let position = ApiPosition {
            instrument: "https://api.robinhood.com/instruments/abc/".to_string(),
            quantity: "ten".to_string(),
            average_buy_price: "100.0000".to_string(),
            account: String::new(),
        };
        let err = position.into_record().unwrap_err();
        assert!(matches!(err, BrokerageError::MalformedResponse(_)));
    }

    #[test]
    fn test_holding_optional_fields_default_to_none() {
        let body = r#"{
            "symbol": "AAPL",
            "quantity": "10.0000",
            "average_buy_price": "100.0000"
        }"#;
        let holding: ApiHolding = serde_json::from_str(body).unwrap();
        let record = holding.into_record().unwrap();
        assert_eq!(record.price, None);
        assert_eq!(record.equity, None);
        assert!(record.account_ref.is_empty());
    }

    #[test]
    fn test_holding_equity_parsed_when_present() {
        let body = r#"{
            "symbol": "AAPL",
            "quantity": "10.0000",
            "average_buy_price": "100.0000",
            "price": "150.0000",
            "equity": "1500.0000",
            "account": "https://api.robinhood.com/accounts/5RT12345/"
        }"#;
        let record = serde_json::from_str::<ApiHolding>(body)
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.price, Some(150.0));
        assert_eq!(record.equity, Some(1500.0));
    }

    #[test]
    fn test_malformed_optional_field_is_an_error_not_a_default() {
        let holding = ApiHolding {
            symbol: "AAPL".to_string(),
            quantity: "10".to_string(),
            average_buy_price: "100".to_string(),
            price: Some("n/a".to_string()),
            equity: None,
            account: String::new(),
        };
        assert!(matches!(
            holding.into_record(),
            Err(BrokerageError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_account_type_hint_rename() {
        let body = r#"{
            "account_number": "XY111",
            "url": "https://api.robinhood.com/accounts/XY111/",
            "type": "ira_roth"
        }"#;
        let account: ApiAccount = serde_json::from_str(body).unwrap();
        assert_eq!(account.kind.as_deref(), Some("ira_roth"));
    }

    #[test]
    fn test_quote_price_prefers_regular_session() {
        let quote = ApiQuote {
            last_trade_price: Some("151.20".to_string()),
            last_extended_hours_trade_price: Some("150.90".to_string()),
        };
        assert_eq!(quote.price().unwrap(), Some(151.2));

        let after_hours = ApiQuote {
            last_trade_price: None,
            last_extended_hours_trade_price: Some("150.90".to_string()),
        };
        assert_eq!(after_hours.price().unwrap(), Some(150.9));

        let empty = ApiQuote {
            last_trade_price: None,
            last_extended_hours_trade_price: None,
        };
        assert_eq!(empty.price().unwrap(), None);
    }
}
