//! Snapshot repository contracts and implementations.
//!
//! # Responsibility
//! - Load and save the single serialized snapshot of the unit collection.
//! - Keep SQL and blob encoding details inside the persistence boundary.
//!
//! # Invariants
//! - `save` replaces the stored blob as a whole; there are no partial writes.
//! - Undecodable blobs surface as `RepoError::Snapshot`, never as `None`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::snapshot::{Snapshot, SnapshotError};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key under which the unit collection blob is stored.
pub const SNAPSHOT_KEY: &str = "units";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for snapshot load/save.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Stored blob could not be decoded into a snapshot.
    Snapshot(SnapshotError),
    Encode(String),
    /// Connection was handed over before migrations ran.
    SchemaNotReady { found: u32, expected: u32 },
    /// Storage backend refused the write.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::Encode(message) => write!(f, "failed to encode snapshot: {message}"),
            Self::SchemaNotReady { found, expected } => write!(
                f,
                "snapshot schema version {found} is behind required {expected}; open the database with open_db"
            ),
            Self::Unavailable(message) => write!(f, "snapshot storage unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SnapshotError> for RepoError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

/// Blob store for the unit collection.
pub trait SnapshotRepository {
    /// Returns `None` when nothing has been saved yet.
    fn load(&self) -> RepoResult<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> RepoResult<()>;
}

impl<R: SnapshotRepository + ?Sized> SnapshotRepository for &R {
    fn load(&self) -> RepoResult<Option<Snapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> RepoResult<()> {
        (**self).save(snapshot)
    }
}

/// SQLite-backed key-value snapshot store.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `SchemaNotReady` when the connection has not been migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let found = current_user_version(conn)?;
        let expected = latest_version();
        if found < expected {
            return Err(RepoError::SchemaNotReady { found, expected });
        }
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load(&self) -> RepoResult<Option<Snapshot>> {
        let blob: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [SNAPSHOT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match blob {
            Some(text) => Ok(Some(Snapshot::from_json(&text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> RepoResult<()> {
        let text = snapshot
            .to_json()
            .map_err(|err| RepoError::Encode(err.to_string()))?;
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![SNAPSHOT_KEY, text],
        )?;
        Ok(())
    }
}

/// In-process snapshot store holding the encoded blob.
///
/// Goes through the same JSON encoding as the SQLite store, so round trips
/// exercise the real wire shape. Writes can be switched off to model an
/// unavailable backend.
#[derive(Debug, Default)]
pub struct MemorySnapshotRepository {
    blob: RefCell<Option<String>>,
    reject_writes: Cell<bool>,
    save_count: Cell<usize>,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already stored blob (current or legacy shape).
    pub fn with_json(text: impl Into<String>) -> Self {
        let repo = Self::default();
        repo.blob.replace(Some(text.into()));
        repo
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.save_count.get()
    }

    /// Currently stored blob, if any.
    pub fn stored_json(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn load(&self) -> RepoResult<Option<Snapshot>> {
        match self.blob.borrow().as_deref() {
            Some(text) => Ok(Some(Snapshot::from_json(text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> RepoResult<()> {
        if self.reject_writes.get() {
            return Err(RepoError::Unavailable("writes are disabled".to_string()));
        }
        let text = snapshot
            .to_json()
            .map_err(|err| RepoError::Encode(err.to_string()))?;
        self.blob.replace(Some(text));
        self.save_count.set(self.save_count.get() + 1);
        Ok(())
    }
}
