//! Fractional task ordering within columns.
//!
//! Tasks in one column are totally ordered by a decimal `sort_order` key.
//! Appending adds `GAP` past the current maximum; dropping a task between two
//! neighbors takes the midpoint of their keys, an O(1) write. Midpoints halve
//! the local gap, so a pathological drag loop between the same neighbors
//! eventually collapses the gap below [`MIN_GAP`]; at that point the whole
//! column is resequenced to `i * GAP` and the midpoint is recomputed from the
//! freshly spaced neighbors. Amortized cost stays O(1) per move, and keys
//! never exhaust decimal precision.
//!
//! Cross-column moves transfer column ownership and re-project the linked
//! backlog item's status in the same transaction.

use crate::backlog;
use crate::db::{now_us, query};
use crate::error::{BoardError, Result};
use crate::model::{LinkChange, TaskDraft, TaskPatch};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Default spacing between consecutive sort keys.
pub const GAP: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Minimum tolerable spacing; at or below this the column is resequenced.
pub const MIN_GAP: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

const TWO: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

struct TaskRow {
    column_id: i64,
    backlog_item_id: Option<i64>,
    sort_order: Decimal,
}

fn decimal_failure(index: usize, error: rust_decimal::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(error))
}

fn load_task(tx: &Transaction<'_>, task_id: i64) -> Result<TaskRow> {
    tx.query_row(
        "SELECT column_id, backlog_item_id, sort_order FROM tasks WHERE task_id = ?1",
        params![task_id],
        |row| {
            let sort_order: String = row.get(2)?;
            Ok(TaskRow {
                column_id: row.get(0)?,
                backlog_item_id: row.get(1)?,
                sort_order: Decimal::from_str(&sort_order).map_err(|e| decimal_failure(2, e))?,
            })
        },
    )
    .optional()?
    .ok_or(BoardError::NotFound {
        entity: "task",
        id: task_id,
    })
}

/// Load a neighbor's key, insisting it currently lives in `column_id`.
fn neighbor_key(tx: &Transaction<'_>, task_id: i64, column_id: i64) -> Result<Decimal> {
    let row = load_task(tx, task_id)?;
    if row.column_id != column_id {
        return Err(BoardError::InvalidOperation(format!(
            "task {task_id} is not in column {column_id}"
        )));
    }
    Ok(row.sort_order)
}

fn max_sort_order(tx: &Transaction<'_>, column_id: i64) -> Result<Option<Decimal>> {
    let max: Option<String> = tx
        .query_row(
            "SELECT sort_order FROM tasks WHERE column_id = ?1
             ORDER BY CAST(sort_order AS REAL) DESC, task_id DESC LIMIT 1",
            params![column_id],
            |row| row.get(0),
        )
        .optional()?;
    max.map(|text| Decimal::from_str(&text).map_err(|e| decimal_failure(0, e).into()))
        .transpose()
}

fn write_sort_order(
    tx: &Transaction<'_>,
    task_id: i64,
    column_id: i64,
    key: Decimal,
) -> Result<()> {
    tx.execute(
        "UPDATE tasks SET column_id = ?1, sort_order = ?2, updated_at_us = ?3 WHERE task_id = ?4",
        params![column_id, key.normalize().to_string(), now_us(), task_id],
    )?;
    Ok(())
}

/// Rewrite every key in `column_id` to `i * GAP` in current order.
///
/// The escape valve for precision exhaustion: one full-column write restores
/// `GAP`-wide spacing everywhere.
fn resequence_column(tx: &Transaction<'_>, column_id: i64) -> Result<usize> {
    let mut stmt = tx.prepare(
        "SELECT task_id FROM tasks WHERE column_id = ?1
         ORDER BY CAST(sort_order AS REAL), task_id",
    )?;
    let ids = stmt
        .query_map(params![column_id], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (index, task_id) in ids.iter().enumerate() {
        let ordinal = i64::try_from(index + 1)
            .map_err(|_| BoardError::InvalidArgument("column too large to resequence".into()))?;
        let key = Decimal::from(ordinal) * GAP;
        tx.execute(
            "UPDATE tasks SET sort_order = ?1 WHERE task_id = ?2",
            params![key.normalize().to_string(), task_id],
        )?;
    }

    tracing::info!(column_id, tasks = ids.len(), "resequenced column sort keys");
    Ok(ids.len())
}

/// Append a task at the end of a column: key = max existing + `GAP`, or
/// `GAP` for an empty column. A backlog link on the draft is validated and
/// projected in the same transaction.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown column, or the link
/// validation errors of [`backlog::link_on_create_or_update`].
pub fn append_task(
    conn: &mut Connection,
    column_id: i64,
    draft: &TaskDraft,
) -> Result<(i64, Decimal)> {
    let tx = conn.transaction()?;

    let ctx = query::column_context(&tx, column_id)?;
    let key = max_sort_order(&tx, column_id)?.map_or(GAP, |max| max + GAP);

    if let Some(backlog_item_id) = draft.backlog_item_id {
        backlog::link_on_create_or_update(&tx, None, backlog_item_id, ctx.group_id, ctx.is_done)?;
    }

    let now = now_us();
    tx.execute(
        "INSERT INTO tasks (
            column_id, title, description, priority, status_text, due_date,
            sort_order, backlog_item_id, created_at_us, updated_at_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            column_id,
            draft.title,
            draft.description,
            draft.priority.as_str(),
            draft.status_text,
            draft.due_date.map(|d| d.to_string()),
            key.normalize().to_string(),
            draft.backlog_item_id,
            now,
            now
        ],
    )?;
    let task_id = tx.last_insert_rowid();

    tracing::debug!(column_id, task_id, key = %key, "appended task");
    tx.commit()?;
    Ok((task_id, key))
}

/// Move a task into `target_column_id` between the given neighbors, returning
/// its new sort key.
///
/// Key selection:
/// 1. no neighbors → `GAP`
/// 2. only a next → `next − GAP`
/// 3. only a prev → `prev + GAP`
/// 4. both → midpoint, resequencing the target column first when the
///    neighbors' gap has collapsed to `MIN_GAP` or below
///
/// Neighbor reports are trusted as the caller's view of the column. A stale
/// claim (reporting an occupied column as empty, say) can mint a key a
/// resident already holds; [`crate::verify::verify_board`] surfaces such
/// damage.
///
/// # Errors
///
/// - [`BoardError::NotFound`] for an unknown task, column, or neighbor
/// - [`BoardError::InvalidOperation`] when a neighbor is not currently in the
///   target column
/// - [`BoardError::Unauthorized`] when the target board belongs to a
///   different group than the task's board
pub fn move_task(
    conn: &mut Connection,
    task_id: i64,
    target_column_id: i64,
    prev_task_id: Option<i64>,
    next_task_id: Option<i64>,
) -> Result<Decimal> {
    let tx = conn.transaction()?;

    let task = load_task(&tx, task_id)?;
    let source = query::column_context(&tx, task.column_id)?;
    let target = query::column_context(&tx, target_column_id)?;

    if source.group_id != target.group_id {
        return Err(BoardError::Unauthorized(format!(
            "task {task_id} belongs to group {}, target column to group {}",
            source.group_id, target.group_id
        )));
    }

    let key = match (prev_task_id, next_task_id) {
        (None, None) => GAP,
        (None, Some(next_id)) => neighbor_key(&tx, next_id, target_column_id)? - GAP,
        (Some(prev_id), None) => neighbor_key(&tx, prev_id, target_column_id)? + GAP,
        (Some(prev_id), Some(next_id)) => {
            let prev_key = neighbor_key(&tx, prev_id, target_column_id)?;
            let next_key = neighbor_key(&tx, next_id, target_column_id)?;
            if next_key - prev_key <= MIN_GAP {
                resequence_column(&tx, target_column_id)?;
                // Neighbors were just rewritten; midpoint of the fresh keys.
                let prev_fresh = neighbor_key(&tx, prev_id, target_column_id)?;
                let next_fresh = neighbor_key(&tx, next_id, target_column_id)?;
                prev_fresh + (next_fresh - prev_fresh) / TWO
            } else {
                prev_key + (next_key - prev_key) / TWO
            }
        }
    };

    write_sort_order(&tx, task_id, target_column_id, key)?;

    if let Some(backlog_item_id) = task.backlog_item_id {
        if source.is_done != target.is_done {
            backlog::on_column_change(&tx, backlog_item_id, target.is_done)?;
        }
    }

    tracing::debug!(
        task_id,
        from_column = task.column_id,
        to_column = target_column_id,
        key = %key,
        "moved task"
    );
    tx.commit()?;
    Ok(key)
}

/// Apply a metadata patch; a link change routes through the backlog
/// coordinator inside the same transaction.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown task, or the link
/// validation errors of [`backlog::link_on_create_or_update`].
pub fn update_task(conn: &mut Connection, task_id: i64, patch: &TaskPatch) -> Result<()> {
    let tx = conn.transaction()?;

    let current = query::get_task(&tx, task_id)?;
    let ctx = query::column_context(&tx, current.column_id)?;

    let new_link = match patch.link {
        LinkChange::Keep => current.backlog_item_id,
        LinkChange::Clear => {
            if let Some(old) = current.backlog_item_id {
                backlog::on_unlink(&tx, old, ctx.is_done)?;
            }
            None
        }
        LinkChange::Set(backlog_item_id) => {
            backlog::link_on_create_or_update(
                &tx,
                Some(task_id),
                backlog_item_id,
                ctx.group_id,
                ctx.is_done,
            )?;
            if let Some(old) = current.backlog_item_id {
                if old != backlog_item_id {
                    backlog::on_unlink(&tx, old, ctx.is_done)?;
                }
            }
            Some(backlog_item_id)
        }
    };

    let title = patch.title.as_ref().unwrap_or(&current.title);
    let description = patch
        .description
        .as_ref()
        .unwrap_or(&current.description);
    let priority = patch.priority.unwrap_or(current.priority);
    let status_text = patch.status_text.as_ref().unwrap_or(&current.status_text);
    let due_date = patch.due_date.unwrap_or(current.due_date);

    tx.execute(
        "UPDATE tasks SET title = ?1, description = ?2, priority = ?3, status_text = ?4,
                          due_date = ?5, backlog_item_id = ?6, updated_at_us = ?7
         WHERE task_id = ?8",
        params![
            title,
            description,
            priority.as_str(),
            status_text,
            due_date.map(|d| d.to_string()),
            new_link,
            now_us(),
            task_id
        ],
    )?;

    tx.commit()?;
    Ok(())
}

/// Delete a task. A linked backlog item receives the unlink projection with
/// the task's current column done flag, so finishing work stays `completed`
/// while unfinished work returns to the pool as `ready`.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown task.
pub fn delete_task(conn: &mut Connection, task_id: i64) -> Result<()> {
    let tx = conn.transaction()?;

    let task = load_task(&tx, task_id)?;
    let ctx = query::column_context(&tx, task.column_id)?;

    if let Some(backlog_item_id) = task.backlog_item_id {
        backlog::on_unlink(&tx, backlog_item_id, ctx.is_done)?;
    }
    tx.execute("DELETE FROM tasks WHERE task_id = ?1", params![task_id])?;

    tracing::debug!(task_id, column_id = task.column_id, "deleted task");
    tx.commit()?;
    Ok(())
}
