//! Key-value persistence adapter.
//!
//! # Responsibility
//! - Read and write named text blobs on a durable medium.
//! - Replace a batch of keys together so the four planner values are never
//!   torn relative to each other within one process.
//!
//! # Invariants
//! - Every write is a complete replacement of the value; no deltas.
//! - A missing key reads as `Ok(None)`, never as an error.

use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Persisted key names.
pub mod keys {
    pub const TASKS: &str = "tasks";
    pub const SUBJECTS: &str = "subjects";
    pub const TASK_ID_COUNTER: &str = "taskIdCounter";
    pub const SUBJECT_ID_COUNTER: &str = "subjectIdCounter";

    pub const ALL: [&str; 4] = [TASKS, SUBJECTS, TASK_ID_COUNTER, SUBJECT_ID_COUNTER];
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the persistence adapter.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying SQLite failure.
    Db(DbError),
    /// Value could not be encoded before writing.
    Serialize { key: &'static str, message: String },
    /// Medium refused the write (quota, read-only, offline).
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialize { key, message } => {
                write!(f, "failed to serialize `{key}`: {message}")
            }
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize { .. } => None,
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable key-value medium used by the planner store.
pub trait KvStore {
    /// Reads one value. Missing keys return `Ok(None)`.
    fn read(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replaces every listed key in one unit.
    fn write_all(&mut self, entries: &[(&str, String)]) -> StorageResult<()>;
}

/// SQLite-backed key-value medium (`kv_entries` table).
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Opens a database file, applying migrations first.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KvStore for SqliteKvStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_all(&mut self, entries: &[(&str, String)]) -> StorageResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO kv_entries (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![*key, value.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// In-process key-value medium.
///
/// Can be switched into a failing mode to simulate a full or read-only
/// medium; failing writes leave stored values untouched.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: BTreeMap<String, String>,
    fail_writes: bool,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a medium pre-populated with raw values.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            fail_writes: false,
        }
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryKvStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write_all(&mut self, entries: &[(&str, String)]) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::Unavailable(
                "memory store is in failing mode".to_string(),
            ));
        }
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}
