//! Configuration Loader
//!
//! TOML configuration with environment overrides for everything secret.
//! Credentials never live in the file: they come from ROBINHOOD_USERNAME /
//! ROBINHOOD_PASSWORD (plus optional ROBINHOOD_TOTP), and DATABASE_URL can
//! override the holdings store location.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::adapters::robinhood::Credentials;
use crate::domain::snapshot::AccountFilter;

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub brokerage: BrokerageSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Brokerage API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerageSection {
    /// REST API base URL
    pub api_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retry attempts for rate limits and server errors
    pub max_retries: u32,
}

/// Holdings database configuration section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseSection {
    /// Database path or sqlite:// URL; DATABASE_URL overrides
    #[serde(default)]
    pub url: String,
}

impl DatabaseSection {
    /// Get the database location with environment variable override.
    /// Checks DATABASE_URL first, falls back to the config value; missing
    /// both is fatal before any network call happens.
    pub fn get_url(&self) -> Result<String, ConfigError> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                return Ok(url);
            }
        }
        if self.url.is_empty() {
            return Err(ConfigError::MissingEnv("DATABASE_URL".to_string()));
        }
        Ok(self.url.clone())
    }
}

/// Sync behavior configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSection {
    /// Default account-type filter: "all", "individual", or "retirement"
    pub account_type: String,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            account_type: "all".to_string(),
        }
    }
}

impl SyncSection {
    pub fn account_filter(&self) -> Result<AccountFilter, ConfigError> {
        self.account_type
            .parse()
            .map_err(ConfigError::Validation)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brokerage.api_url.is_empty() {
            return Err(ConfigError::Validation(
                "api_url cannot be empty".to_string(),
            ));
        }

        if self.brokerage.timeout_secs == 0 {
            return Err(ConfigError::Validation(format!(
                "timeout_secs must be > 0, got {}",
                self.brokerage.timeout_secs
            )));
        }

        if self.brokerage.max_retries == 0 {
            return Err(ConfigError::Validation(format!(
                "max_retries must be > 0, got {}",
                self.brokerage.max_retries
            )));
        }

        self.sync.account_filter()?;

        Ok(())
    }

    /// Brokerage credentials, environment-only by design.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let username = require_env("ROBINHOOD_USERNAME")?;
        let password = require_env("ROBINHOOD_PASSWORD")?;
        let mfa_code = std::env::var("ROBINHOOD_TOTP")
            .ok()
            .filter(|value| !value.is_empty());

        Ok(Credentials {
            username,
            password,
            mfa_code,
        })
    }
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name.to_string())),
    }
}
