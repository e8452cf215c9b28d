//! Slot repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Read and upsert named payload slots.
//! - Expose a cheap marker that reveals writes made by other contexts.
//!
//! # Invariants
//! - `write_slot` replaces the whole payload of a slot.
//! - `change_marker` is backed by `PRAGMA data_version`, which SQLite only
//!   bumps for commits from other connections.

use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type RepoResult<T> = Result<T, RepoError>;

/// Slot persistence error.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid slot data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
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

/// Whole-value key/value storage shared by every context on one device.
pub trait SlotRepository {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>>;
    fn write_slot(&self, key: &str, payload: &str) -> RepoResult<()>;
    /// Opaque value that changes after another context commits a write.
    fn change_marker(&self) -> RepoResult<i64>;
}

/// SQLite-backed slot repository owning its connection.
///
/// Each context opens its own connection to the same file; sharing a file is
/// what makes writes visible across contexts.
pub struct SqliteSlotRepository {
    conn: Connection,
}

impl SqliteSlotRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a private in-memory database. Not visible to other contexts.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SlotRepository for SqliteSlotRepository {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM storage_slots WHERE slot_key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write_slot(&self, key: &str, payload: &str) -> RepoResult<()> {
        if key.trim().is_empty() {
            return Err(RepoError::InvalidData("slot key cannot be empty".to_string()));
        }

        self.conn.execute(
            "INSERT INTO storage_slots (slot_key, payload, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(slot_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key, payload],
        )?;
        Ok(())
    }

    fn change_marker(&self) -> RepoResult<i64> {
        let version = self
            .conn
            .query_row("PRAGMA data_version;", [], |row| row.get::<_, i64>(0))?;
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::{RepoError, SlotRepository, SqliteSlotRepository};

    #[test]
    fn missing_slot_reads_as_none() {
        let repo = SqliteSlotRepository::open_in_memory().expect("in-memory repo");
        assert_eq!(repo.read_slot("absent").expect("read"), None);
    }

    #[test]
    fn write_replaces_whole_payload() {
        let repo = SqliteSlotRepository::open_in_memory().expect("in-memory repo");
        repo.write_slot("slot", "first").expect("first write");
        repo.write_slot("slot", "second").expect("second write");
        assert_eq!(
            repo.read_slot("slot").expect("read").as_deref(),
            Some("second")
        );
    }

    #[test]
    fn blank_key_is_rejected() {
        let repo = SqliteSlotRepository::open_in_memory().expect("in-memory repo");
        let err = repo.write_slot("  ", "x").expect_err("blank key must fail");
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn own_writes_do_not_move_change_marker() {
        let repo = SqliteSlotRepository::open_in_memory().expect("in-memory repo");
        let before = repo.change_marker().expect("marker");
        repo.write_slot("slot", "payload").expect("write");
        assert_eq!(repo.change_marker().expect("marker"), before);
    }
}
