//! SQLite-backed key/value cache.
//!
//! Offline mirror of account data: read at startup when the server is
//! unreachable, rewritten after every successful remote read or save.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::{DatabaseError, Result};
use crate::timer::TimerSettings;

const SETTINGS_KEY: &str = "timer_settings";

pub struct LocalCache {
    conn: Connection,
}

impl LocalCache {
    /// Open (or create) the cache file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let cache = Self { conn };
        cache.migrate()?;
        Ok(cache)
    }

    /// Open an in-memory cache.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.migrate()?;
        Ok(cache)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Cached settings, if any were stored.
    ///
    /// # Errors
    /// Returns an error on query failure or if the stored JSON is corrupt.
    pub fn load_settings(&self) -> Result<Option<TimerSettings>> {
        match self.kv_get(SETTINGS_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn store_settings(&self, settings: &TimerSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.kv_set(SETTINGS_KEY, &json)
    }
}
