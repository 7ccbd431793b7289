//! Robinhood Session
//!
//! OAuth password-grant login and best-effort logout. The session token is
//! the single long-lived resource of a reconciliation run and is only read
//! after login; there is no refresh path, a run is short enough to live on
//! one token.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::brokerage::BrokerageError;

/// Public OAuth client id used by the official web and mobile clients.
const OAUTH_CLIENT_ID: &str = "c82SH0WZOsabOXGP2sxqcj34FxkvfnWRZBKlBjFS";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// TOTP code for accounts with 2FA enabled.
    pub mfa_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    grant_type: &'static str,
    scope: &'static str,
    client_id: &'static str,
    device_token: String,
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mfa_code: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    /// Upstream error detail, e.g. "Unable to log in with provided credentials."
    #[serde(default)]
    detail: Option<String>,
}

/// Authenticate with the brokerage and return a bearer session.
pub async fn login(
    http: &Client,
    api_base_url: &str,
    credentials: &Credentials,
) -> Result<Session, BrokerageError> {
    let url = format!("{}/oauth2/token/", api_base_url.trim_end_matches('/'));
    let request = LoginRequest {
        grant_type: "password",
        scope: "internal",
        client_id: OAUTH_CLIENT_ID,
        device_token: uuid::Uuid::new_v4().to_string(),
        username: &credentials.username,
        password: &credentials.password,
        mfa_code: credentials.mfa_code.as_deref(),
    };

    let response = http
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(|e| BrokerageError::AuthenticationFailed(format!("login request failed: {e}")))?;

    let status = response.status();
    let body: LoginResponse = response.json().await.map_err(|e| {
        BrokerageError::AuthenticationFailed(format!("login response unreadable: {e}"))
    })?;

    match body.access_token {
        Some(token) if !token.is_empty() => {
            tracing::info!("Authenticated with brokerage");
            Ok(Session {
                access_token: token,
            })
        }
        _ => Err(BrokerageError::AuthenticationFailed(
            body.detail
                .unwrap_or_else(|| format!("login rejected with status {status}")),
        )),
    }
}

/// Revoke the session token. Failures are logged and swallowed: a stale
/// token expiring on its own is not worth failing a completed run over.
pub async fn logout(http: &Client, api_base_url: &str, session: &Session) {
    let url = format!("{}/oauth2/revoke_token/", api_base_url.trim_end_matches('/'));
    let result = http
        .post(&url)
        .form(&[
            ("client_id", OAUTH_CLIENT_ID),
            ("token", session.access_token.as_str()),
        ])
        .send()
        .await;

    match result {
        Ok(response) if !response.status().is_success() => {
            tracing::debug!("Logout returned {} (ignored)", response.status());
        }
        Ok(_) => tracing::debug!("Session token revoked"),
        Err(e) => tracing::debug!("Logout failed (ignored): {e}"),
    }
}
