//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the lifecycle engine.
//! - Apply schema migrations in deterministic order.
//! - Check that a foreign connection carries the lifecycle tables.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No lead data is read or written before migrations succeed.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Tables every lifecycle repository reads or writes.
pub const LIFECYCLE_TABLES: [&str; 3] = ["leads", "lead_events", "teams"];

/// Returns the first lifecycle table absent from `conn`, if any.
///
/// Connections from [`open_db`] always pass; this guards connections opened
/// elsewhere (host databases, hand-built fixtures).
pub fn missing_lifecycle_table(conn: &Connection) -> DbResult<Option<&'static str>> {
    for table in LIFECYCLE_TABLES {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(Some(table));
        }
    }
    Ok(None)
}

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
