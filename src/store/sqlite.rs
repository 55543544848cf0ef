use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, WeighbridgeError};
use crate::domain::{ExtractedValue, StoredWeight, StrategyKind};
use crate::store::Store;

const INITIAL_SCHEMA: &str = "
CREATE TABLE weights (
    identifier TEXT PRIMARY KEY NOT NULL,
    value REAL,
    strategy TEXT,
    fetched_at TEXT NOT NULL
);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            WeighbridgeError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(INITIAL_SCHEMA)]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| WeighbridgeError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    fn row_to_weight(row: &Row<'_>) -> rusqlite::Result<StoredWeight> {
        let value: Option<f64> = row.get(1)?;
        let strategy: Option<String> = row.get(2)?;
        let value = match (value, strategy.and_then(|s| s.parse::<StrategyKind>().ok())) {
            (Some(value), Some(strategy)) => Some(ExtractedValue::new(value, strategy)),
            _ => None,
        };

        Ok(StoredWeight {
            identifier: row.get(0)?,
            value,
            fetched_at: row
                .get::<_, String>(3)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn insert(conn: &Connection, weight: &StoredWeight) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR IGNORE INTO weights (identifier, value, strategy, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                weight.identifier,
                weight.value.map(|v| v.value),
                weight.value.map(|v| v.strategy.as_str()),
                weight.fetched_at.to_rfc3339()
            ],
        )
    }
}

impl Store for SqliteStore {
    fn get_weight(&self, identifier: &str) -> Result<Option<StoredWeight>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                "SELECT identifier, value, strategy, fetched_at FROM weights WHERE identifier = ?1",
                params![identifier],
                Self::row_to_weight,
            )
            .optional()?;

        Ok(result)
    }

    fn get_all_weights(&self) -> Result<Vec<StoredWeight>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT identifier, value, strategy, fetched_at FROM weights ORDER BY identifier",
        )?;
        let weights = stmt
            .query_map([], Self::row_to_weight)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(weights)
    }

    fn add_weight(&self, weight: &StoredWeight) -> Result<bool> {
        let conn = self.conn()?;
        Ok(Self::insert(&conn, weight)? > 0)
    }

    fn add_weights(&self, weights: &[StoredWeight]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for weight in weights {
            count += Self::insert(&tx, weight)?;
        }

        tx.commit()?;
        Ok(count)
    }

    fn delete_weight(&self, identifier: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM weights WHERE identifier = ?1",
            params![identifier],
        )?;
        Ok(deleted > 0)
    }

    fn delete_all_weights(&self) -> Result<usize> {
        let conn = self.conn()?;
        Ok(conn.execute("DELETE FROM weights", [])?)
    }
}
