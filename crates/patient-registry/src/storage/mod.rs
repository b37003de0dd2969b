//! Durable slot storage.
//!
//! A slot is a named location holding one whole serialized value. Writes
//! replace the previous value entirely. [`SqliteStore`] keeps slots in a
//! `SQLite` database file; [`MemoryStore`] keeps them in a map for tests and
//! embedding. Both can enforce a byte quota, mirroring the storage limits of
//! browser local storage.

mod memory;
pub mod schema;

pub use memory::MemoryStore;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A key-value store of named slots.
pub trait SlotStore {
    /// Read the value stored under `key`, or `None` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QuotaExceeded`] if the write would take the store
    /// past its quota, or an error from the backing store.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a slot. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be modified.
    fn remove(&mut self, key: &str) -> Result<bool>;
}

/// Size a slot occupies against a quota.
pub(crate) fn slot_bytes(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Reject a write whose resulting total exceeds `quota`.
pub(crate) fn check_quota(
    key: &str,
    value: &str,
    other_bytes: usize,
    quota: Option<usize>,
) -> Result<()> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let size = other_bytes + slot_bytes(key, value);
    if size > quota {
        return Err(Error::QuotaExceeded {
            key: key.to_string(),
            size,
            quota,
        });
    }
    Ok(())
}

/// `SQLite`-backed slot store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Maximum total bytes across all slots, if limited.
    quota: Option<usize>,
}

impl SqliteStore {
    /// Open or create a slot database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        schema::initialize(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn,
            quota: None,
        })
    }

    /// Create an in-memory database, for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        schema::initialize(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            quota: None,
        })
    }

    /// Limit the total size of all slots. `None` removes the limit.
    #[must_use]
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all slot keys in sorted order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM slots ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Size in bytes of the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn slot_size(&self, key: &str) -> Result<Option<u64>> {
        let size: Option<i64> = self
            .conn
            .query_row(
                "SELECT length(CAST(value AS BLOB)) FROM slots WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(size.map(|s| u64::try_from(s).unwrap_or(0)))
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (slot_count, total_bytes): (i64, i64) = self.conn.query_row(
            r"
            SELECT COUNT(*),
                   COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0)
            FROM slots
            ",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            slot_count,
            total_bytes: u64::try_from(total_bytes).unwrap_or(0),
            db_size_bytes,
            quota_bytes: self.quota,
        })
    }

    /// Bytes used by every slot except `key`.
    fn bytes_excluding(&self, key: &str) -> Result<usize> {
        let bytes: i64 = self.conn.query_row(
            r"
            SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0)
            FROM slots WHERE key != ?1
            ",
            [key],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(bytes).unwrap_or(usize::MAX))
    }
}

impl SlotStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.quota.is_some() {
            check_quota(key, value, self.bytes_excluding(key)?, self.quota)?;
        }

        self.conn.execute(
            r"
            INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value],
        )?;
        debug!("Wrote {} bytes to slot '{}'", value.len(), key);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM slots WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }
}

/// Statistics about the slot database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of slots stored.
    pub slot_count: i64,
    /// Bytes used by slot keys and values.
    pub total_bytes: u64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
    /// Configured quota, if any.
    pub quota_bytes: Option<usize>,
}
