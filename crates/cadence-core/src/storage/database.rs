//! SQLite-backed persistence for the adapters.
//!
//! Provides:
//! - A key-value store holding usage windows and ceiling counters as JSON
//! - A history of completed exercise sessions with simple statistics
//!
//! The engine itself never touches this; adapters load a record, hand it to
//! the pure usage functions and write back what they return.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError, Result};
use crate::usage::{CeilingCounter, UsageWindow};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub exercise: String,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_secs: u64,
    pub today_sessions: u64,
    pub today_secs: u64,
}

/// Load/save of caller-keyed usage records (e.g. `chat-quota`,
/// `call-duration`).
pub trait UsageStore {
    fn load_window(&self, key: &str) -> Result<Option<UsageWindow>>;
    fn save_window(&self, key: &str, window: &UsageWindow) -> Result<()>;
    fn load_ceiling(&self, key: &str) -> Result<Option<CeilingCounter>>;
    fn save_ceiling(&self, key: &str, counter: &CeilingCounter) -> Result<()>;
    /// Remove a record. Returns whether one existed.
    fn clear(&self, key: &str) -> Result<bool>;
}

/// SQLite database for usage records and session history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/cadence.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("cadence.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                exercise      TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                started_at    TEXT NOT NULL,
                completed_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);",
        )
    }

    /// Record a completed exercise session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        exercise: &str,
        duration_secs: u64,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (exercise, duration_secs, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                exercise,
                duration_secs as i64,
                timestamp(started_at),
                timestamp(completed_at)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent completed sessions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exercise, duration_secs, started_at, completed_at
             FROM sessions ORDER BY completed_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, exercise, duration_secs, started_at, completed_at) = row?;
            records.push(SessionRecord {
                id,
                exercise,
                duration_secs: duration_secs.max(0) as u64,
                started_at: parse_timestamp(&started_at)?,
                completed_at: parse_timestamp(&completed_at)?,
            });
        }
        Ok(records)
    }

    /// Totals over all sessions, plus those completed since `day_start`.
    pub fn stats(&self, day_start: DateTime<Utc>) -> Result<Stats> {
        let (total_sessions, total_secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0) FROM sessions",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        let (today_sessions, today_secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0) FROM sessions
             WHERE completed_at >= ?1",
            params![timestamp(day_start)],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        Ok(Stats {
            total_sessions: total_sessions as u64,
            total_secs: total_secs as u64,
            today_sessions: today_sessions as u64,
            today_secs: today_secs as u64,
        })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(json) = self.kv_get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&json).map(Some).map_err(|e| {
            CoreError::from(DatabaseError::CorruptRecord {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
    }

    fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.kv_set(key, &json)
    }
}

impl UsageStore for Database {
    fn load_window(&self, key: &str) -> Result<Option<UsageWindow>> {
        self.load_json(key)
    }

    fn save_window(&self, key: &str, window: &UsageWindow) -> Result<()> {
        self.save_json(key, window)
    }

    fn load_ceiling(&self, key: &str) -> Result<Option<CeilingCounter>> {
        self.load_json(key)
    }

    fn save_ceiling(&self, key: &str, counter: &CeilingCounter) -> Result<()> {
        self.save_json(key, counter)
    }

    fn clear(&self, key: &str) -> Result<bool> {
        self.kv_delete(key)
    }
}

/// Fixed-width UTC timestamps so that text comparison orders them.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::from(DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}"))))
}
