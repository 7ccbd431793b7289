//! CLI Command Definitions
//!
//! clap derive tree for the holdsync binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Holdsync - Robinhood holdings reconciliation
#[derive(Parser, Debug)]
#[command(
    name = "holdsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Reconciles brokerage holdings across overlapping account endpoints",
    long_about = "Holdsync probes the brokerage's overlapping position endpoints, resolves \
                  instruments to tickers and live prices, deduplicates across sources, and \
                  syncs one consistent holdings snapshot to the local store."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch, reconcile, and store the current holdings snapshot
    Sync(SyncCmd),

    /// Show the stored holdings snapshot
    Status(StatusCmd),

    /// Manually add or update one holding
    Add(AddCmd),

    /// Import holdings from a CSV file
    Import(ImportCmd),

    /// Delete all stored holdings
    Clear(ClearCmd),
}

/// Run one reconciliation and emit the snapshot as JSON on stdout
#[derive(Parser, Debug)]
pub struct SyncCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Account-type filter: all, individual, or retirement
    #[arg(short, long, value_name = "TYPE")]
    pub account_type: Option<String>,
}

/// Show stored holdings
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}

/// Manually add or update one holding, e.g. a Roth IRA position no probe
/// can fetch automatically
#[derive(Parser, Debug)]
pub struct AddCmd {
    /// Ticker symbol, e.g. AAPL
    #[arg(value_name = "TICKER")]
    pub ticker: String,

    /// Number of shares
    #[arg(value_name = "QUANTITY")]
    pub quantity: f64,

    /// Average cost per share
    #[arg(long, value_name = "PRICE", default_value = "0")]
    pub avg_cost: f64,

    /// Current price per share
    #[arg(long, value_name = "PRICE", default_value = "0")]
    pub price: f64,

    /// Account type: individual or retirement
    #[arg(long, value_name = "TYPE", default_value = "individual")]
    pub account_type: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}

/// Import holdings from CSV
#[derive(Parser, Debug)]
pub struct ImportCmd {
    /// CSV file: ticker,quantity[,avg_cost[,current_price[,account_type]]]
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}

/// Delete all stored holdings
#[derive(Parser, Debug)]
pub struct ClearCmd {
    /// Skip the confirmation requirement
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}
