//! SQLite-based rest log and state storage.
//!
//! Provides persistent storage for:
//! - Completed rest intervals
//! - Rest statistics (daily and all-time)
//! - Key-value store for application state

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::timer::RestHistoryEntry;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RestStats {
    pub total_rests: u64,
    pub total_rest_secs: u64,
    pub average_rest_secs: f64,
    pub longest_rest_secs: u64,
}

/// SQLite database for completed rests.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/resttimer/resttimer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("resttimer.db"))
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
            "CREATE TABLE IF NOT EXISTS rests (
                id             TEXT PRIMARY KEY,
                exercise_label TEXT NOT NULL DEFAULT '',
                set_index      INTEGER NOT NULL,
                target_secs    INTEGER NOT NULL,
                actual_secs    INTEGER NOT NULL,
                completed_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_rests_completed_at ON rests(completed_at);",
        )?;
        Ok(())
    }

    /// Record a completed rest. Recording the same entry twice is a no-op.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_rest(&self, entry: &RestHistoryEntry) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO rests
                (id, exercise_label, set_index, target_secs, actual_secs, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.exercise_label,
                entry.set_index,
                entry.target_secs,
                entry.actual_secs,
                entry.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent rests, newest first.
    pub fn recent_rests(&self, limit: usize) -> Result<Vec<RestHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exercise_label, set_index, target_secs, actual_secs, completed_at
             FROM rests
             ORDER BY completed_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let completed_at: String = row.get(5)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
                })?;
            Ok(RestHistoryEntry {
                id: row.get(0)?,
                exercise_label: row.get(1)?,
                set_index: row.get(2)?,
                target_secs: row.get(3)?,
                actual_secs: row.get(4)?,
                completed_at,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    pub fn stats_today(&self) -> Result<RestStats> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.stats_since(&format!("{today}T00:00:00+00:00"))
    }

    pub fn stats_all(&self) -> Result<RestStats> {
        self.stats_since("")
    }

    fn stats_since(&self, since_rfc3339: &str) -> Result<RestStats> {
        let row = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(actual_secs), 0), COALESCE(MAX(actual_secs), 0)
             FROM rests
             WHERE completed_at >= ?1",
            params![since_rfc3339],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, u64>(2)?,
                ))
            },
        )?;
        let (total_rests, total_rest_secs, longest_rest_secs) = row;
        let average_rest_secs = if total_rests == 0 {
            0.0
        } else {
            total_rest_secs as f64 / total_rests as f64
        };
        Ok(RestStats {
            total_rests,
            total_rest_secs,
            average_rest_secs,
            longest_rest_secs,
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
}
