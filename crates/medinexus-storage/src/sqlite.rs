//! SQLite-backed persistent store
//!
//! Usage is summed once when the store is opened and then kept up to date on
//! every write, so quota checks cost one lookup. The total only sees writes
//! made through this store and its clones; another connection writing to the
//! same file is not reflected until the file is reopened.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::error::StorageError;
use crate::schema;
use crate::store::{entry_size, KeyValueStore};
use crate::Result;

struct Inner {
    conn: Connection,
    /// Approximate bytes across all rows
    used: usize,
}

impl Inner {
    fn entry_size_of(&self, key: &str) -> Result<usize> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv_entries WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value.map_or(0, |v| entry_size(key, &v)))
    }
}

/// Clones share one connection and one usage total.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<Mutex<Inner>>,
    quota: Option<usize>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        tracing::info!(path = %path.display(), journal_mode = %mode, "Opened SQLite store");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::migrate(&conn)?;
        let used = scan_usage(&conn)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner { conn, used })),
            quota: None,
        })
    }

    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn quota(&self) -> Option<usize> {
        self.quota
    }

    /// Approximate bytes used by all entries.
    pub fn used_bytes(&self) -> usize {
        self.inner.lock().used
    }
}

fn scan_usage(conn: &Connection) -> Result<usize> {
    let mut stmt = conn.prepare("SELECT key, value FROM kv_entries")?;
    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        let value: String = row.get(1)?;
        Ok(entry_size(&key, &value))
    })?;

    let mut total = 0;
    for size in rows {
        total += size?;
    }
    Ok(total)
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let inner = self.inner.lock();
        let value = inner
            .conn
            .query_row("SELECT value FROM kv_entries WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.lock();

        let previous = inner.entry_size_of(key)?;
        let needed = inner.used.saturating_sub(previous) + entry_size(key, value);
        if let Some(quota) = self.quota {
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        // Upsert keeps the original rowid, so overwrites keep their position
        inner.conn.execute(
            "INSERT INTO kv_entries (key, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, Utc::now().to_rfc3339()],
        )?;
        inner.used = needed;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let previous = inner.entry_size_of(key)?;
        inner
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1", [key])?;
        inner.used = inner.used.saturating_sub(previous);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.conn.execute("DELETE FROM kv_entries", [])?;
        inner.used = 0;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let inner = self.inner.lock();
        let mut stmt = inner.conn.prepare("SELECT key FROM kv_entries ORDER BY rowid")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    fn len(&self) -> Result<usize> {
        let inner = self.inner.lock();
        let count: i64 = inner
            .conn
            .query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
