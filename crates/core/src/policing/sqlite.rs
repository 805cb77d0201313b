//! SQLite-backed quota store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::store::QuotaStore;
use super::types::{QuotaState, QuotaStoreError};

/// Quota state persisted in the `provider_quota` table, so daily counters
/// survive restarts.
pub struct SqliteQuotaStore {
    conn: Mutex<Connection>,
}

impl SqliteQuotaStore {
    /// Open (or create) the database file and its schema.
    pub fn new(path: &Path) -> Result<Self, QuotaStoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, QuotaStoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), QuotaStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS provider_quota (
                provider TEXT PRIMARY KEY,
                score REAL NOT NULL DEFAULT 0,
                daily_count INTEGER NOT NULL DEFAULT 0,
                window_start TEXT NOT NULL,
                last_decay TEXT NOT NULL,
                successes INTEGER NOT NULL DEFAULT 0,
                failures INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, QuotaStoreError> {
        self.conn
            .lock()
            .map_err(|_| QuotaStoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_state(row: &rusqlite::Row) -> rusqlite::Result<QuotaState> {
        let window_start: String = row.get(3)?;
        let last_decay: String = row.get(4)?;
        let successes: i64 = row.get(5)?;
        let failures: i64 = row.get(6)?;

        Ok(QuotaState {
            provider: row.get(0)?,
            score: row.get(1)?,
            daily_count: row.get(2)?,
            window_start: parse_timestamp(&window_start),
            last_decay: parse_timestamp(&last_decay),
            successes: successes.max(0) as u64,
            failures: failures.max(0) as u64,
        })
    }
}

fn db_err(e: rusqlite::Error) -> QuotaStoreError {
    QuotaStoreError::Database(e.to_string())
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl QuotaStore for SqliteQuotaStore {
    fn load(&self, provider: &str) -> Result<Option<QuotaState>, QuotaStoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT provider, score, daily_count, window_start, last_decay, successes, failures
             FROM provider_quota WHERE provider = ?",
            params![provider],
            Self::row_to_state,
        )
        .optional()
        .map_err(db_err)
    }

    fn save(&self, state: &QuotaState) -> Result<(), QuotaStoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO provider_quota
                (provider, score, daily_count, window_start, last_decay, successes, failures)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(provider) DO UPDATE SET
                score = excluded.score,
                daily_count = excluded.daily_count,
                window_start = excluded.window_start,
                last_decay = excluded.last_decay,
                successes = excluded.successes,
                failures = excluded.failures",
            params![
                state.provider,
                state.score,
                state.daily_count,
                state.window_start.to_rfc3339(),
                state.last_decay.to_rfc3339(),
                state.successes as i64,
                state.failures as i64,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<QuotaState>, QuotaStoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT provider, score, daily_count, window_start, last_decay, successes, failures
                 FROM provider_quota ORDER BY provider",
            )
            .map_err(db_err)?;
        let rows = stmt.query_map([], Self::row_to_state).map_err(db_err)?;

        let mut states = Vec::new();
        for row in rows {
            states.push(row.map_err(db_err)?);
        }
        Ok(states)
    }
}
