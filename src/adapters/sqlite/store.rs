//! SQLite Holdings Store
//!
//! rusqlite-backed `SnapshotStore`. The schema is applied on open, and every
//! snapshot replace runs DELETE-all + INSERT-all inside one transaction, so
//! a failed write leaves the previous snapshot untouched.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::domain::position::AccountType;
use crate::domain::snapshot::Holding;
use crate::ports::store::{SnapshotStore, StoreError};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS holdings (
    ticker TEXT NOT NULL,
    account_type TEXT NOT NULL,
    quantity REAL NOT NULL,
    avg_cost REAL NOT NULL,
    current_price REAL NOT NULL,
    market_value REAL NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (ticker, account_type)
);
"#;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the holdings database at `database_url`. Accepts a
    /// bare path or a `sqlite://` prefixed URL.
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        let path = database_url
            .strip_prefix("sqlite://")
            .unwrap_or(database_url);
        let conn =
            Connection::open(path).map_err(|e| StoreError::Open(format!("{path}: {e}")))?;
        Self::with_connection(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| StoreError::Open(format!("schema init failed: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Write("connection mutex poisoned".into()))
    }
}

fn row_to_holding(row: &rusqlite::Row<'_>) -> rusqlite::Result<Holding> {
    let account_type: String = row.get(5)?;
    Ok(Holding {
        ticker: row.get(0)?,
        quantity: row.get(1)?,
        avg_cost: row.get(2)?,
        current_price: row.get(3)?,
        market_value: row.get(4)?,
        account_type: account_type.parse().unwrap_or(AccountType::Unknown),
    })
}

impl SnapshotStore for SqliteStore {
    fn replace_holdings(&self, holdings: &[Holding]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Write(e.to_string()))?;

        tx.execute("DELETE FROM holdings", [])
            .map_err(|e| StoreError::Write(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO holdings
                        (ticker, account_type, quantity, avg_cost, current_price, market_value, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(|e| StoreError::Write(e.to_string()))?;
            let updated_at = Utc::now().to_rfc3339();

            for holding in holdings {
                stmt.execute(params![
                    holding.ticker,
                    holding.account_type.as_str(),
                    holding.quantity,
                    holding.avg_cost,
                    holding.current_price,
                    holding.market_value,
                    updated_at,
                ])
                .map_err(|e| StoreError::Write(e.to_string()))?;
            }
        }

        tx.commit().map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(holdings.len())
    }

    fn load_holdings(&self) -> Result<Vec<Holding>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT ticker, quantity, avg_cost, current_price, market_value, account_type
                 FROM holdings
                 ORDER BY market_value DESC",
            )
            .map_err(|e| StoreError::Read(e.to_string()))?;

        let rows = stmt
            .query_map([], row_to_holding)
            .map_err(|e| StoreError::Read(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| StoreError::Read(e.to_string()))
    }

    fn upsert_holding(&self, holding: &Holding) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO holdings
                (ticker, account_type, quantity, avg_cost, current_price, market_value, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (ticker, account_type) DO UPDATE SET
                quantity = excluded.quantity,
                avg_cost = excluded.avg_cost,
                current_price = excluded.current_price,
                market_value = excluded.market_value,
                updated_at = excluded.updated_at",
            params![
                holding.ticker,
                holding.account_type.as_str(),
                holding.quantity,
                holding.avg_cost,
                holding.current_price,
                holding.market_value,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }

    fn clear_holdings(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM holdings", [])
            .map_err(|e| StoreError::Write(e.to_string()))
    }
}
