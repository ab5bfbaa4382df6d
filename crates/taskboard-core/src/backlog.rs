//! Backlog link coordination.
//!
//! A backlog item may be linked to at most one task at a time, and its status
//! is a projection of the column that task currently occupies:
//!
//! - linked, column not done → `in_progress`
//! - linked, column done → `completed`
//! - unlinked from a non-done column → `ready` (back to the pool)
//! - unlinked from a done column → `completed`
//!
//! The projection is a pure function applied at every linkage and column
//! change event, never an event subscriber, so the invariant stays trivially
//! checkable. Known quirk, preserved deliberately: unlink overwrites statuses
//! set by other workflows (`blocked`, even `archived`) back to
//! `ready`/`completed`. Regression-tested in `tests/backlog_sync.rs`.

use crate::db::{now_us, query};
use crate::error::{BoardError, Result};
use crate::model::BacklogStatus;
use rusqlite::{Connection, OptionalExtension, params};

/// Status a linked backlog item carries, given its task's column done flag.
#[must_use]
pub const fn status_for_link(column_is_done: bool) -> BacklogStatus {
    if column_is_done {
        BacklogStatus::Completed
    } else {
        BacklogStatus::InProgress
    }
}

/// Status a backlog item falls back to when its task link goes away.
///
/// A finished item stays `completed`; anything else returns to the pool as
/// `ready`, not `in_progress` — nobody is working on it any more.
#[must_use]
pub const fn status_after_unlink(column_was_done: bool) -> BacklogStatus {
    if column_was_done {
        BacklogStatus::Completed
    } else {
        BacklogStatus::Ready
    }
}

fn set_status(conn: &Connection, backlog_item_id: i64, status: BacklogStatus) -> Result<()> {
    let changed = conn.execute(
        "UPDATE backlog_items SET status = ?1, updated_at_us = ?2 WHERE backlog_item_id = ?3",
        params![status.as_str(), now_us(), backlog_item_id],
    )?;
    if changed == 0 {
        return Err(BoardError::NotFound {
            entity: "backlog item",
            id: backlog_item_id,
        });
    }
    Ok(())
}

/// Validate and apply a link from `task_id` to `backlog_item_id`, projecting
/// the item's status from the target column's done flag.
///
/// Runs inside the caller's transaction. The caller writes
/// `tasks.backlog_item_id` itself; this only guards and projects.
///
/// # Errors
///
/// - [`BoardError::NotFound`] for an unknown backlog item
/// - [`BoardError::InvalidOperation`] if the item belongs to another group,
///   is archived, or is already linked to a different task
pub fn link_on_create_or_update(
    conn: &Connection,
    task_id: Option<i64>,
    backlog_item_id: i64,
    group_id: i64,
    column_is_done: bool,
) -> Result<()> {
    let item = query::get_backlog_item(conn, backlog_item_id)?;

    if item.group_id != group_id {
        return Err(BoardError::InvalidOperation(format!(
            "backlog item {backlog_item_id} belongs to group {}, not {group_id}",
            item.group_id
        )));
    }
    if item.status == BacklogStatus::Archived {
        return Err(BoardError::InvalidOperation(format!(
            "backlog item {backlog_item_id} is archived"
        )));
    }

    let holder: Option<i64> = conn
        .query_row(
            "SELECT task_id FROM tasks WHERE backlog_item_id = ?1",
            params![backlog_item_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(holder_id) = holder {
        if task_id != Some(holder_id) {
            return Err(BoardError::InvalidOperation(format!(
                "backlog item {backlog_item_id} is already linked to task {holder_id}"
            )));
        }
    }

    let status = status_for_link(column_is_done);
    tracing::debug!(backlog_item_id, status = %status, "linking backlog item");
    set_status(conn, backlog_item_id, status)
}

/// Re-apply the two-state projection after a linked task changed column, or
/// after its column's done flag changed.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown backlog item.
pub fn on_column_change(
    conn: &Connection,
    linked_backlog_item_id: i64,
    new_column_is_done: bool,
) -> Result<()> {
    let status = status_for_link(new_column_is_done);
    tracing::debug!(
        backlog_item_id = linked_backlog_item_id,
        status = %status,
        "reprojecting backlog status after column change"
    );
    set_status(conn, linked_backlog_item_id, status)
}

/// Apply the unlink projection after a task was deleted or its link cleared
/// or replaced.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown backlog item.
pub fn on_unlink(conn: &Connection, backlog_item_id: i64, column_was_done: bool) -> Result<()> {
    let status = status_after_unlink(column_was_done);
    tracing::debug!(backlog_item_id, status = %status, "unlinking backlog item");
    set_status(conn, backlog_item_id, status)
}

/// Re-project every backlog item linked from a task in `column_id`, using the
/// column's new done flag. One bulk update; used when a column's `is_done`
/// flips during reposition.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn reproject_column_links(
    conn: &Connection,
    column_id: i64,
    column_is_done: bool,
) -> Result<usize> {
    let status = status_for_link(column_is_done);
    let changed = conn.execute(
        "UPDATE backlog_items SET status = ?1, updated_at_us = ?2
         WHERE backlog_item_id IN (
             SELECT backlog_item_id FROM tasks
             WHERE column_id = ?3 AND backlog_item_id IS NOT NULL
         )",
        params![status.as_str(), now_us(), column_id],
    )?;
    if changed > 0 {
        tracing::debug!(column_id, changed, status = %status, "reprojected column links");
    }
    Ok(changed)
}

/// Apply the unlink projection to every backlog item linked from a task in
/// `column_id`. Used before a column (and its tasks) is deleted.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn unlink_column_links(
    conn: &Connection,
    column_id: i64,
    column_was_done: bool,
) -> Result<usize> {
    let status = status_after_unlink(column_was_done);
    let changed = conn.execute(
        "UPDATE backlog_items SET status = ?1, updated_at_us = ?2
         WHERE backlog_item_id IN (
             SELECT backlog_item_id FROM tasks
             WHERE column_id = ?3 AND backlog_item_id IS NOT NULL
         )",
        params![status.as_str(), now_us(), column_id],
    )?;
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::{
        link_on_create_or_update, on_column_change, on_unlink, status_after_unlink,
        status_for_link,
    };
    use crate::db::{create_backlog_item, create_board, open_in_memory_store, query};
    use crate::error::BoardError;
    use crate::model::BacklogStatus;

    #[test]
    fn projection_is_a_two_state_function() {
        assert_eq!(status_for_link(false), BacklogStatus::InProgress);
        assert_eq!(status_for_link(true), BacklogStatus::Completed);
        assert_eq!(status_after_unlink(false), BacklogStatus::Ready);
        assert_eq!(status_after_unlink(true), BacklogStatus::Completed);
    }

    #[test]
    fn link_rejects_cross_group_items() -> anyhow::Result<()> {
        let conn = open_in_memory_store()?;
        create_board(&conn, 1, "board")?;
        let item = create_backlog_item(&conn, 2, "story", BacklogStatus::Ready)?;

        let err = link_on_create_or_update(&conn, None, item, 1, false).expect_err("link must fail");
        assert!(matches!(err, BoardError::InvalidOperation(_)));
        Ok(())
    }

    #[test]
    fn link_rejects_archived_items() -> anyhow::Result<()> {
        let conn = open_in_memory_store()?;
        let item = create_backlog_item(&conn, 1, "story", BacklogStatus::Archived)?;

        let err = link_on_create_or_update(&conn, None, item, 1, false).expect_err("link must fail");
        assert!(matches!(err, BoardError::InvalidOperation(_)));
        Ok(())
    }

    #[test]
    fn link_projects_status_from_done_flag() -> anyhow::Result<()> {
        let conn = open_in_memory_store()?;
        let item = create_backlog_item(&conn, 1, "story", BacklogStatus::Ready)?;

        link_on_create_or_update(&conn, None, item, 1, false)?;
        assert_eq!(
            query::get_backlog_item(&conn, item)?.status,
            BacklogStatus::InProgress
        );

        on_column_change(&conn, item, true)?;
        assert_eq!(
            query::get_backlog_item(&conn, item)?.status,
            BacklogStatus::Completed
        );
        Ok(())
    }

    #[test]
    fn unlink_returns_item_to_pool_or_keeps_it_completed() -> anyhow::Result<()> {
        let conn = open_in_memory_store()?;
        let item = create_backlog_item(&conn, 1, "story", BacklogStatus::InProgress)?;

        on_unlink(&conn, item, false)?;
        assert_eq!(
            query::get_backlog_item(&conn, item)?.status,
            BacklogStatus::Ready
        );

        on_unlink(&conn, item, true)?;
        assert_eq!(
            query::get_backlog_item(&conn, item)?.status,
            BacklogStatus::Completed
        );
        Ok(())
    }

    #[test]
    fn holder_lookup_failure_surfaces_instead_of_linking() -> anyhow::Result<()> {
        let conn = open_in_memory_store()?;
        let item = create_backlog_item(&conn, 1, "story", BacklogStatus::Ready)?;

        // Break the holder lookup. The error must reach the caller; it must
        // not read as "item is unlinked" and let the link through.
        conn.execute_batch("ALTER TABLE tasks RENAME TO tasks_detached")?;

        let err = link_on_create_or_update(&conn, None, item, 1, false).expect_err("link must fail");
        assert!(matches!(err, BoardError::Db(_)));
        assert_eq!(
            query::get_backlog_item(&conn, item)?.status,
            BacklogStatus::Ready
        );
        Ok(())
    }

    #[test]
    fn unknown_backlog_item_is_not_found() -> anyhow::Result<()> {
        let conn = open_in_memory_store()?;
        let err = on_unlink(&conn, 404, false).expect_err("unlink must fail");
        assert!(matches!(
            err,
            BoardError::NotFound {
                entity: "backlog item",
                id: 404
            }
        ));
        Ok(())
    }
}
