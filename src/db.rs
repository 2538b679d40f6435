//! Shared SQLite connection handling.
//!
//! One database file holds the whole schema (alunos, pagamentos, usuarios).
//! The connection is opened once and shared behind a `parking_lot::Mutex`,
//! which serializes all writes; WAL mode keeps reads cheap alongside them.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use std::sync::Arc;
use tracing::warn;

pub type Db = Arc<Mutex<Connection>>;

/// Open (or create) the database and apply connection-level pragmas.
/// Table schemas are applied by the stores that own them.
pub fn open(db_path: &str) -> Result<Db> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

    let conn = Connection::open_with_flags(db_path, flags)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
    )
    .context("Failed to apply database pragmas")?;

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap_or_default();

    if journal_mode.to_lowercase() != "wal" {
        warn!("WAL mode not active, journal_mode = {}", journal_mode);
    }

    Ok(Arc::new(Mutex::new(conn)))
}
