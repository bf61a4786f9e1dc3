use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    checksum TEXT NOT NULL UNIQUE
);
";

// Collection keys
pub const MEMBERS: &str = "members";
pub const CONTRIBUTIONS: &str = "contributions";
pub const TRANSACTIONS: &str = "transactions";
pub const INVITES: &str = "invites";

// Auth keys
pub const USER: &str = "user";
pub const IS_AUTHENTICATED: &str = "isAuthenticated";
pub const OTP: &str = "otp";
pub const CREDENTIALS: &str = "credentials";

/// Key-value blob store holding JSON documents, one per key.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("opened store at {}", db_path.display());
        Ok(Self { conn })
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?)
    }

    pub fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.put_raw(key, &raw)
    }

    /// Ordered records stored under `key`; a missing key is an empty collection.
    pub fn collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        Ok(self.get_json(key)?.unwrap_or_default())
    }

    pub fn import_seen(&self, checksum: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        Ok(stmt.exists([checksum])?)
    }

    pub fn record_import(&self, filename: &str, record_count: usize, checksum: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO imports (filename, record_count, checksum) VALUES (?1, ?2, ?3)",
            rusqlite::params![filename, record_count as i64, checksum],
        )?;
        Ok(())
    }

    pub fn import_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT count(*) FROM imports", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("test.db")).unwrap();
    (dir, store)
}
