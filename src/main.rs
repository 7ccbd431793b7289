//! Holdsync - Robinhood holdings reconciliation CLI
//!
//! `sync` probes the brokerage, reconciles one deduplicated snapshot, stores
//! it, and prints the JSON report; the remaining commands are operator tools
//! over the same holdings table.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use holdsync::adapters::cli::{AddCmd, ClearCmd, CliApp, Command, ImportCmd, StatusCmd, SyncCmd};
use holdsync::adapters::robinhood::{RobinhoodClient, RobinhoodConfig};
use holdsync::adapters::sqlite::SqliteStore;
use holdsync::application::{import_csv, ErrorReport, Reconciler, SyncError, SyncReport};
use holdsync::config::{load_config, Config};
use holdsync::domain::{AccountFilter, AccountType, Holding, HoldingsSnapshot};
use holdsync::ports::store::SnapshotStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present (credentials go there, never in config files)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Sync(cmd) => sync_command(cmd).await,
        Command::Status(cmd) => status_command(cmd).await,
        Command::Add(cmd) => add_command(cmd).await,
        Command::Import(cmd) => import_command(cmd).await,
        Command::Clear(cmd) => clear_command(cmd).await,
    }
}

/// Logs go to stderr: stdout carries exactly one JSON document per sync run.
fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn sync_command(cmd: SyncCmd) -> Result<()> {
    match run_sync(&cmd).await {
        Ok(snapshot) => {
            let report = SyncReport::from(snapshot);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            let report = ErrorReport::new(e.to_string());
            eprintln!("{}", serde_json::to_string(&report)?);
            std::process::exit(1);
        }
    }
}

async fn run_sync(cmd: &SyncCmd) -> Result<HoldingsSnapshot, SyncError> {
    let config = load_config(&cmd.config)?;
    let credentials = config.credentials()?;
    let database_url = config.database.get_url()?;

    let filter = match &cmd.account_type {
        Some(value) => value.parse::<AccountFilter>().map_err(SyncError::Config)?,
        None => config.sync.account_filter()?,
    };

    let store = SqliteStore::open(&database_url)?;

    let client = RobinhoodClient::login(robinhood_config(&config), &credentials).await?;

    let result = Reconciler::new(&client, &store, filter).run().await;

    // Best-effort logout, success or not.
    client.logout().await;

    result
}

fn robinhood_config(config: &Config) -> RobinhoodConfig {
    RobinhoodConfig {
        api_base_url: config.brokerage.api_url.clone(),
        timeout: Duration::from_secs(config.brokerage.timeout_secs),
        max_retries: config.brokerage.max_retries,
    }
}

async fn status_command(cmd: StatusCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let store = SqliteStore::open(&config.database.get_url()?)?;
    let holdings = store.load_holdings()?;

    if holdings.is_empty() {
        println!("No holdings found. Run 'holdsync sync' first.");
        return Ok(());
    }

    println!(
        "{:<8} {:<12} {:>12} {:>12} {:>12} {:>12} {:>9}",
        "Ticker", "Type", "Quantity", "Avg Cost", "Price", "Value", "Gain %"
    );
    println!("{}", "-".repeat(84));

    let mut total_value = 0.0;
    let mut total_cost = 0.0;
    for holding in &holdings {
        println!(
            "{:<8} {:<12} {:>12.4} {:>12.2} {:>12.2} {:>12.2} {:>8.2}%",
            holding.ticker,
            holding.account_type,
            holding.quantity,
            holding.avg_cost,
            holding.current_price,
            holding.market_value,
            holding.gain_pct()
        );
        total_value += holding.market_value;
        total_cost += holding.quantity * holding.avg_cost;
    }

    println!("{}", "-".repeat(84));
    let total_gain_pct = if total_cost > 0.0 {
        (total_value - total_cost) / total_cost * 100.0
    } else {
        0.0
    };
    println!(
        "{:<8} {:<12} {:>12} {:>12.2} {:>12} {:>12.2} {:>8.2}%",
        "TOTAL", "", "", total_cost, "", total_value, total_gain_pct
    );

    Ok(())
}

async fn add_command(cmd: AddCmd) -> Result<()> {
    let ticker = cmd.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        bail!("ticker cannot be empty");
    }
    if cmd.quantity <= 0.0 {
        bail!("quantity must be > 0, got {}", cmd.quantity);
    }

    let account_type: AccountType = cmd
        .account_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let store = SqliteStore::open(&config.database.get_url()?)?;

    let holding = Holding {
        market_value: cmd.quantity * cmd.price,
        ticker,
        quantity: cmd.quantity,
        avg_cost: cmd.avg_cost,
        current_price: cmd.price,
        account_type,
    };
    store.upsert_holding(&holding)?;

    println!(
        "Saved {} ({}): {:.4} shares @ ${:.2} = ${:.2}",
        holding.ticker,
        holding.account_type,
        holding.quantity,
        holding.current_price,
        holding.market_value
    );
    println!("Run 'holdsync status' to see all holdings.");
    Ok(())
}

async fn import_command(cmd: ImportCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let store = SqliteStore::open(&config.database.get_url()?)?;

    let summary = import_csv(&cmd.file, &store)
        .with_context(|| format!("Failed to import {}", cmd.file.display()))?;

    println!(
        "Imported {} holdings ({} rows skipped)",
        summary.imported, summary.skipped
    );
    Ok(())
}

async fn clear_command(cmd: ClearCmd) -> Result<()> {
    if !cmd.yes {
        bail!("This deletes every stored holding. Pass --yes to confirm.");
    }

    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let store = SqliteStore::open(&config.database.get_url()?)?;

    let deleted = store.clear_holdings()?;
    println!("Deleted {deleted} holdings");
    Ok(())
}
