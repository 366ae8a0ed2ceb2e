//! Opening planner databases.
//!
//! # Invariants
//! - A returned connection is on [`latest_version`](super::latest_version).
//! - Each open logs exactly one `db_open` line, ok or error.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a planner database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private to one connection, gone when it drops.
    Memory,
}

impl DbLocation {
    fn label(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens (or creates) the database file at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_location(&DbLocation::File(path.as_ref().to_path_buf()))
}

pub fn open_db_in_memory() -> DbResult<Connection> {
    open_location(&DbLocation::Memory)
}

/// Connects, sets the busy timeout and brings the schema up to date.
pub fn open_location(location: &DbLocation) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = connect(location).and_then(|mut conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        apply_migrations(&mut conn)?;
        Ok(conn)
    });

    let elapsed_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok location={} duration_ms={elapsed_ms}",
            location.label()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error location={} duration_ms={elapsed_ms} error={err}",
            location.label()
        ),
    }
    result
}

fn connect(location: &DbLocation) -> DbResult<Connection> {
    match location {
        DbLocation::File(path) => {
            if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            Ok(Connection::open(path)?)
        }
        DbLocation::Memory => Ok(Connection::open_in_memory()?),
    }
}
