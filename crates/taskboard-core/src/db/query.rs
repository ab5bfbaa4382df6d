//! Typed reads over the board store.
//!
//! These are the ordered reads the board view assembler consumes: columns of
//! a board by position, tasks of a column by sort key. All functions take a
//! shared `&Connection` and return typed structs, never raw rows.

use crate::error::{BoardError, Result};
use crate::model::{BacklogItem, BacklogStatus, Column, Priority, Task};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Column placement context used by the write paths: which board the column
/// belongs to, which group owns that board, and the done flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnContext {
    pub column_id: i64,
    pub board_id: i64,
    pub group_id: i64,
    pub is_done: bool,
}

/// Backlog status of one milestone association (read side only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneStatus {
    pub backlog_item_id: i64,
    pub status: BacklogStatus,
}

fn conversion_failure<E>(index: usize, error: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
}

fn parse_due_date(index: usize, value: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    value
        .map(|text| NaiveDate::from_str(&text).map_err(|e| conversion_failure(index, e)))
        .transpose()
}

fn column_from_row(row: &Row<'_>) -> rusqlite::Result<Column> {
    Ok(Column {
        id: row.get(0)?,
        board_id: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
        is_done: row.get(4)?,
        due_date: parse_due_date(5, row.get(5)?)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let priority: String = row.get(4)?;
    let sort_order: String = row.get(7)?;
    Ok(Task {
        id: row.get(0)?,
        column_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        priority: Priority::from_str(&priority).map_err(|e| conversion_failure(4, e))?,
        status_text: row.get(5)?,
        due_date: parse_due_date(6, row.get(6)?)?,
        sort_order: Decimal::from_str(&sort_order).map_err(|e| conversion_failure(7, e))?,
        backlog_item_id: row.get(8)?,
    })
}

const COLUMN_FIELDS: &str = "column_id, board_id, name, position, is_done, due_date";
const TASK_FIELDS: &str =
    "task_id, column_id, title, description, priority, status_text, due_date, sort_order, backlog_item_id";

/// Columns of a board in dense position order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn board_columns(conn: &Connection, board_id: i64) -> Result<Vec<Column>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMN_FIELDS} FROM columns WHERE board_id = ?1 ORDER BY position"
    ))?;
    let columns = stmt
        .query_map(params![board_id], column_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Tasks of a column, ordered by their fractional sort key.
///
/// `CAST` to REAL is safe for ordering: resequencing keeps every gap above
/// `MIN_GAP`, orders of magnitude wider than f64 resolution at key scale.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn column_tasks(conn: &Connection, column_id: i64) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_FIELDS} FROM tasks
         WHERE column_id = ?1
         ORDER BY CAST(sort_order AS REAL), task_id"
    ))?;
    let tasks = stmt
        .query_map(params![column_id], task_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Fetch one column.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown id.
pub fn get_column(conn: &Connection, column_id: i64) -> Result<Column> {
    conn.query_row(
        &format!("SELECT {COLUMN_FIELDS} FROM columns WHERE column_id = ?1"),
        params![column_id],
        column_from_row,
    )
    .optional()?
    .ok_or(BoardError::NotFound {
        entity: "column",
        id: column_id,
    })
}

/// Fetch one task.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown id.
pub fn get_task(conn: &Connection, task_id: i64) -> Result<Task> {
    conn.query_row(
        &format!("SELECT {TASK_FIELDS} FROM tasks WHERE task_id = ?1"),
        params![task_id],
        task_from_row,
    )
    .optional()?
    .ok_or(BoardError::NotFound {
        entity: "task",
        id: task_id,
    })
}

/// Fetch one backlog item.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown id.
pub fn get_backlog_item(conn: &Connection, backlog_item_id: i64) -> Result<BacklogItem> {
    conn.query_row(
        "SELECT backlog_item_id, group_id, title, status
         FROM backlog_items WHERE backlog_item_id = ?1",
        params![backlog_item_id],
        |row| {
            let status: String = row.get(3)?;
            Ok(BacklogItem {
                id: row.get(0)?,
                group_id: row.get(1)?,
                title: row.get(2)?,
                status: BacklogStatus::from_str(&status).map_err(|e| conversion_failure(3, e))?,
            })
        },
    )
    .optional()?
    .ok_or(BoardError::NotFound {
        entity: "backlog item",
        id: backlog_item_id,
    })
}

/// Resolve a column's board, owning group, and done flag in one query.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown column id.
pub fn column_context(conn: &Connection, column_id: i64) -> Result<ColumnContext> {
    conn.query_row(
        "SELECT c.column_id, c.board_id, b.group_id, c.is_done
         FROM columns c JOIN boards b ON b.board_id = c.board_id
         WHERE c.column_id = ?1",
        params![column_id],
        |row| {
            Ok(ColumnContext {
                column_id: row.get(0)?,
                board_id: row.get(1)?,
                group_id: row.get(2)?,
                is_done: row.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or(BoardError::NotFound {
        entity: "column",
        id: column_id,
    })
}

/// Backlog statuses of a milestone's items, for the (out of scope) progress
/// report. Read-only; this core never writes `milestone_items`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn milestone_statuses(conn: &Connection, milestone_id: i64) -> Result<Vec<MilestoneStatus>> {
    let mut stmt = conn.prepare(
        "SELECT m.backlog_item_id, b.status
         FROM milestone_items m JOIN backlog_items b ON b.backlog_item_id = m.backlog_item_id
         WHERE m.milestone_id = ?1
         ORDER BY m.backlog_item_id",
    )?;
    let statuses = stmt
        .query_map(params![milestone_id], |row| {
            let status: String = row.get(1)?;
            Ok(MilestoneStatus {
                backlog_item_id: row.get(0)?,
                status: BacklogStatus::from_str(&status).map_err(|e| conversion_failure(1, e))?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(statuses)
}
