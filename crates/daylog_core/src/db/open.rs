//! Journal connection setup.
//!
//! # Responsibility
//! - Open file or in-memory journal databases.
//! - Configure pragmas and upgrade the schema before handing out a
//!   connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`, so deleting a journal
//!   removes its sections, health record and achievements.
//! - Returned connections are at [`latest_version`].
//!
//! [`latest_version`]: super::migrations::latest_version

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a journal database lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    File,
    Memory,
}

impl OpenMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens a journal database file, creating it when missing.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with(OpenMode::File, || Connection::open(path))
}

/// Opens an empty in-memory journal database with the full schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(OpenMode::Memory, Connection::open_in_memory)
}

fn open_with(
    mode: OpenMode,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = connect()
        .map_err(|source| DbError::Open { mode, source })
        .and_then(|mut conn| {
            prepare_connection(&mut conn)?;
            Ok(conn)
        });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode.as_str(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error={err}",
            mode.as_str(),
            started_at.elapsed().as_millis()
        ),
    }
    result
}

fn prepare_connection(conn: &mut Connection) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}
