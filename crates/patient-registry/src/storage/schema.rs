//! `SQLite` schema for the slot store.
//!
//! The `metadata` table records the schema version that created the file, so
//! a database written by a newer release is refused instead of misread.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

/// Schema version written by this release.
pub const SCHEMA_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

/// One row per named slot, each holding a whole serialized value.
const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS slots (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Create the tables if missing and check the stored schema version.
///
/// # Errors
///
/// Returns [`Error::DatabaseSchema`] if the stored version is unreadable or
/// newer than [`SCHEMA_VERSION`], or a query error.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES)?;

    match stored_version(conn)? {
        None => {
            conn.execute(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
                (VERSION_KEY, SCHEMA_VERSION.to_string()),
            )?;
            debug!("Created slot schema version {}", SCHEMA_VERSION);
            Ok(())
        }
        Some(version) if version > SCHEMA_VERSION => Err(Error::DatabaseSchema {
            message: format!(
                "database schema version {version} is newer than supported version {SCHEMA_VERSION}"
            ),
        }),
        Some(_) => Ok(()),
    }
}

fn stored_version(conn: &Connection) -> Result<Option<i32>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    value
        .map(|value| {
            value.parse().map_err(|_| Error::DatabaseSchema {
                message: format!("invalid schema version: {value}"),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_version(conn: &Connection, value: &str) {
        conn.execute(
            "UPDATE metadata SET value = ?1 WHERE key = ?2",
            (value, VERSION_KEY),
        )
        .unwrap();
    }

    #[test]
    fn test_initialize_creates_tables_and_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        for table in ["slots", "metadata"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
        assert_eq!(stored_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_initialize_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();

        assert_eq!(stored_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_newer_version_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        set_version(&conn, &(SCHEMA_VERSION + 1).to_string());

        let err = initialize(&conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_invalid_version_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        set_version(&conn, "abc");

        let err = initialize(&conn).unwrap_err();
        assert!(matches!(err, Error::DatabaseSchema { .. }));
        assert!(err.to_string().contains("invalid schema version"));
    }
}
