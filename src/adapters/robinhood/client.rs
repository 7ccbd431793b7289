//! Robinhood API Client
//!
//! reqwest-backed implementation of the `BrokerageGateway` port. Wraps every
//! endpoint the probe chain consumes: aggregate holdings, the positions
//! listings, account enumeration, the speculative retirement paths, and
//! instrument/quote resolution. Requests carry the session bearer token, a
//! client-level timeout, and bounded retry with backoff on rate limits and
//! server errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::session::{self, Credentials, Session};
use super::types::{ApiAccount, ApiHolding, ApiInstrument, ApiPosition, ApiQuote, Paginated};
use crate::ports::brokerage::{
    AccountRecord, AggregateHolding, BrokerageError, BrokerageGateway, PositionRecord,
};

/// Pagination cap; a well-formed account never comes close.
const MAX_PAGES: usize = 50;

#[derive(Debug, Clone)]
pub struct RobinhoodConfig {
    /// REST API base URL.
    pub api_base_url: String,
    /// Per-request timeout; an unresponsive endpoint degrades like a failed one.
    pub timeout: Duration,
    /// Retry attempts for rate limits and server errors.
    pub max_retries: u32,
}

impl Default for RobinhoodConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.robinhood.com".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RobinhoodClient {
    config: RobinhoodConfig,
    http: Client,
    session: Session,
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl RobinhoodClient {
    /// Authenticate and build a client bound to the resulting session.
    pub async fn login(
        config: RobinhoodConfig,
        credentials: &Credentials,
    ) -> Result<Self, BrokerageError> {
        let http = Client::builder().timeout(config.timeout).build().map_err(|e| {
            BrokerageError::RequestFailed(format!("failed to create HTTP client: {e}"))
        })?;

        let session = session::login(&http, &config.api_base_url, credentials).await?;

        Ok(Self {
            config,
            http,
            session,
        })
    }

    /// Revoke the session token; errors are logged, not returned.
    pub async fn logout(&self) {
        session::logout(&self.http, &self.config.api_base_url, &self.session).await;
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.config.api_base_url, path)
    }

    /// GET a JSON document with retry on 429/5xx and typed error mapping.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BrokerageError> {
        let mut last_error: Option<BrokerageError> = None;

        for attempt in 0..self.config.max_retries {
            let result = self
                .http
                .get(url)
                .header(
                    "Authorization",
                    format!("Bearer {}", self.session.access_token),
                )
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_secs(2u64.pow(attempt + 1));
                        tracing::warn!(
                            "Rate limited (429), backing off {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            self.config.max_retries
                        );
                        last_error =
                            Some(BrokerageError::RequestFailed("rate limit exceeded".into()));
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    if status.is_server_error() {
                        last_error = Some(BrokerageError::RequestFailed(format!(
                            "server error {status} from {url}"
                        )));
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1)))
                            .await;
                        continue;
                    }

                    if status == StatusCode::NOT_FOUND {
                        return Err(BrokerageError::EndpointUnavailable(url.to_string()));
                    }

                    if !status.is_success() {
                        return Err(BrokerageError::RequestFailed(format!(
                            "{url} returned {status}"
                        )));
                    }

                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| BrokerageError::MalformedResponse(format!("{url}: {e}")));
                }
                Err(e) => {
                    last_error = Some(e.into());
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| BrokerageError::RequestFailed("max retries exceeded".into())))
    }

    /// Walk a cursor-paginated listing to the end.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        first_url: String,
    ) -> Result<Vec<T>, BrokerageError> {
        let mut rows = Vec::new();
        let mut next = Some(first_url);
        let mut pages = 0;

        while let Some(url) = next {
            if pages >= MAX_PAGES {
                tracing::warn!("Stopping pagination after {MAX_PAGES} pages at {url}");
                break;
            }
            let page: Paginated<T> = self.get_json(&url).await?;
            rows.extend(page.results);
            next = page.next;
            pages += 1;
        }

        Ok(rows)
    }
}

#[async_trait]
impl BrokerageGateway for RobinhoodClient {
    async fn aggregate_holdings(&self) -> Result<Vec<AggregateHolding>, BrokerageError> {
        let rows: Vec<ApiHolding> = self
            .get_paginated(self.endpoint("portfolios/holdings/"))
            .await?;
        rows.into_iter().map(ApiHolding::into_record).collect()
    }

    async fn all_positions(&self) -> Result<Vec<PositionRecord>, BrokerageError> {
        let rows: Vec<ApiPosition> = self
            .get_paginated(self.endpoint("positions/?nonzero=true"))
            .await?;
        rows.into_iter().map(ApiPosition::into_record).collect()
    }

    async fn list_accounts(&self) -> Result<Vec<AccountRecord>, BrokerageError> {
        let rows: Vec<ApiAccount> = self.get_paginated(self.endpoint("accounts/")).await?;
        Ok(rows.into_iter().map(ApiAccount::into_record).collect())
    }

    async fn account_positions(
        &self,
        account_number: &str,
    ) -> Result<Vec<PositionRecord>, BrokerageError> {
        let url = self.endpoint(&format!(
            "positions/?nonzero=true&account_number={account_number}"
        ));
        let rows: Vec<ApiPosition> = self.get_paginated(url).await?;
        rows.into_iter().map(ApiPosition::into_record).collect()
    }

    async fn positions_at(&self, path: &str) -> Result<Vec<PositionRecord>, BrokerageError> {
        let rows: Vec<ApiPosition> = self.get_paginated(self.endpoint(path)).await?;
        rows.into_iter().map(ApiPosition::into_record).collect()
    }

    async fn instrument_symbol(
        &self,
        instrument_url: &str,
    ) -> Result<Option<String>, BrokerageError> {
        // Instrument URLs come back absolute from the positions endpoints.
        match self.get_json::<ApiInstrument>(instrument_url).await {
            Ok(instrument) => Ok(instrument.symbol.filter(|s| !s.is_empty())),
            Err(BrokerageError::EndpointUnavailable(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>, BrokerageError> {
        let url = self.endpoint(&format!("quotes/{symbol}/"));
        match self.get_json::<ApiQuote>(&url).await {
            Ok(quote) => quote.price(),
            Err(BrokerageError::EndpointUnavailable(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
