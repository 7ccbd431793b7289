//! Configuration Module
//!
//! Loads and validates configuration from TOML files, with environment
//! overrides for credentials and the database location.

pub mod loader;

pub use loader::{load_config, Config, ConfigError};
