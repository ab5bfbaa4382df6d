//! SQLite store for boards, columns, tasks, and backlog items.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while writers commit
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` so column deletion cascades to its tasks

pub mod migrations;
pub mod query;
pub mod schema;

use crate::error::Result;
use crate::model::BacklogStatus;
use rusqlite::{Connection, params};
use std::{
    path::Path,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the board store, apply runtime pragmas, and migrate the
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_connection(&conn)?;
    migrations::migrate(&mut conn)?;
    Ok(conn)
}

/// Open an in-memory store at the latest schema version.
///
/// # Errors
///
/// Returns an error if configuring or migrating the database fails.
pub fn open_in_memory_store() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    configure_connection(&conn)?;
    migrations::migrate(&mut conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// Current wall-clock time in microseconds since the Unix epoch.
#[must_use]
pub fn now_us() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
}

/// Create a board for a group. Boards start with no columns.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_board(conn: &Connection, group_id: i64, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO boards (group_id, name, created_at_us) VALUES (?1, ?2, ?3)",
        params![group_id, name, now_us()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Create a backlog item in a group's pool.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_backlog_item(
    conn: &Connection,
    group_id: i64,
    title: &str,
    status: BacklogStatus,
) -> Result<i64> {
    let now = now_us();
    conn.execute(
        "INSERT INTO backlog_items (group_id, title, status, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![group_id, title, status.as_str(), now, now],
    )?;
    Ok(conn.last_insert_rowid())
}
