//! Thin facade over the SQLite connection.

use std::path::Path;

use docket_core::StoredValue;
use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;

/// The relational backend: one open SQLite connection plus the small set of
/// primitives the rest of the crate needs (pragmas, transactions, WAL
/// checkpointing, catalog introspection).
pub(crate) struct SqliteBackend {
    pub(crate) conn: Connection,
}

impl SqliteBackend {
    /// Opens (or creates) a SQLite database at the given path and sets the
    /// connection pragmas.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening SQLite connection");
        let conn = Connection::open(path)?;
        let backend = Self { conn };
        backend.configure()?;
        Ok(backend)
    }

    fn configure(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Begins a transaction on the underlying connection.
    ///
    /// The transaction rolls back on drop unless committed.
    pub fn begin(&self) -> Result<rusqlite::Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Flushes the WAL back into the main database file so a plain file copy
    /// observes all writes.
    pub fn checkpoint(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }

    /// Returns `true` when a table of the given name exists.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            rusqlite::params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

/// Converts a codec primitive into a bindable SQLite value.
pub(crate) fn to_sql_value(stored: &StoredValue) -> rusqlite::types::Value {
    match stored {
        StoredValue::Null => rusqlite::types::Value::Null,
        StoredValue::Integer(i) => rusqlite::types::Value::Integer(*i),
        StoredValue::Real(f) => rusqlite::types::Value::Real(*f),
        StoredValue::Text(s) => rusqlite::types::Value::Text(s.clone()),
    }
}

/// Converts a fetched SQLite value into a codec primitive.
pub(crate) fn from_sql_value(value: rusqlite::types::Value) -> StoredValue {
    match value {
        rusqlite::types::Value::Null => StoredValue::Null,
        rusqlite::types::Value::Integer(i) => StoredValue::Integer(i),
        rusqlite::types::Value::Real(f) => StoredValue::Real(f),
        rusqlite::types::Value::Text(s) => StoredValue::Text(s),
        // Blobs are never written by this crate.
        rusqlite::types::Value::Blob(_) => StoredValue::Null,
    }
}
