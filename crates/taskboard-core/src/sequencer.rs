//! Dense 1..N column sequencing per board.
//!
//! Positions of one board's columns always form exactly `{1..N}`. Every
//! mutation runs as one transaction: siblings are bulk-shifted with a single
//! `UPDATE ... WHERE board_id = ? AND position ...`, then the affected row is
//! written directly. Any failure rolls the whole shift back, so readers never
//! observe a gapped or duplicated sequence.
//!
//! Out-of-range positions are clamped, never rejected: a caller dragging a
//! column past the end simply appends. That is an explicit policy choice.

use crate::backlog;
use crate::db::now_us;
use crate::error::{BoardError, Result};
use crate::model::ColumnUpdate;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

fn column_count(tx: &Transaction<'_>, board_id: i64) -> Result<i64> {
    let count = tx.query_row(
        "SELECT COUNT(*) FROM columns WHERE board_id = ?1",
        params![board_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

struct ColumnRow {
    board_id: i64,
    position: i64,
    is_done: bool,
}

fn load_column(tx: &Transaction<'_>, column_id: i64) -> Result<ColumnRow> {
    tx.query_row(
        "SELECT board_id, position, is_done FROM columns WHERE column_id = ?1",
        params![column_id],
        |row| {
            Ok(ColumnRow {
                board_id: row.get(0)?,
                position: row.get(1)?,
                is_done: row.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or(BoardError::NotFound {
        entity: "column",
        id: column_id,
    })
}

/// Insert a column at `desired_position` (default append), shifting every
/// sibling at or after that position one slot right.
///
/// `desired_position` is clamped to `[1, count + 1]`.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown board, or a database
/// error; either way no shift survives.
pub fn insert_column(
    conn: &mut Connection,
    board_id: i64,
    name: &str,
    desired_position: Option<i64>,
) -> Result<i64> {
    let tx = conn.transaction()?;

    let board_exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM boards WHERE board_id = ?1)",
        params![board_id],
        |row| row.get(0),
    )?;
    if !board_exists {
        return Err(BoardError::NotFound {
            entity: "board",
            id: board_id,
        });
    }

    let count = column_count(&tx, board_id)?;
    let position = desired_position.unwrap_or(count + 1).clamp(1, count + 1);

    let shifted = tx.execute(
        "UPDATE columns SET position = position + 1
         WHERE board_id = ?1 AND position >= ?2",
        params![board_id, position],
    )?;
    tx.execute(
        "INSERT INTO columns (board_id, name, position, is_done, created_at_us)
         VALUES (?1, ?2, ?3, 0, ?4)",
        params![board_id, name, position, now_us()],
    )?;
    let column_id = tx.last_insert_rowid();

    tracing::debug!(board_id, column_id, position, shifted, "inserted column");
    tx.commit()?;
    Ok(column_id)
}

/// Move a column to `new_position` (clamped to `[1, count]`) and apply the
/// accompanying metadata in the same transaction.
///
/// Moving up shifts `[new, old)` right; moving down shifts `(old, new]`
/// left; the moved column is then set directly, outside the shift pass. When
/// the metadata flips `is_done`, every backlog item linked from this column
/// is re-projected before commit, so readers never see a done column with
/// in-progress backlog state.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown column id.
pub fn reposition_column(
    conn: &mut Connection,
    column_id: i64,
    new_position: i64,
    update: &ColumnUpdate,
) -> Result<()> {
    let tx = conn.transaction()?;

    let current = load_column(&tx, column_id)?;
    let count = column_count(&tx, current.board_id)?;
    let target = new_position.clamp(1, count);
    let old = current.position;

    if target < old {
        tx.execute(
            "UPDATE columns SET position = position + 1
             WHERE board_id = ?1 AND position >= ?2 AND position < ?3",
            params![current.board_id, target, old],
        )?;
    } else if target > old {
        tx.execute(
            "UPDATE columns SET position = position - 1
             WHERE board_id = ?1 AND position > ?2 AND position <= ?3",
            params![current.board_id, old, target],
        )?;
    }

    tx.execute(
        "UPDATE columns SET position = ?1, name = ?2, is_done = ?3, due_date = ?4
         WHERE column_id = ?5",
        params![
            target,
            update.name,
            update.is_done,
            update.due_date.map(|d| d.to_string()),
            column_id
        ],
    )?;

    if update.is_done != current.is_done {
        backlog::reproject_column_links(&tx, column_id, update.is_done)?;
    }

    tracing::debug!(
        board_id = current.board_id,
        column_id,
        from = old,
        to = target,
        "repositioned column"
    );
    tx.commit()?;
    Ok(())
}

/// Delete a column, renumbering every later sibling one slot left.
///
/// The column's tasks are deleted with it (foreign-key cascade); backlog
/// items they linked first receive the unlink projection with the deleted
/// column's done flag.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] for an unknown column id.
pub fn delete_column(conn: &mut Connection, column_id: i64) -> Result<()> {
    let tx = conn.transaction()?;

    let current = load_column(&tx, column_id)?;
    let unlinked = backlog::unlink_column_links(&tx, column_id, current.is_done)?;

    tx.execute(
        "DELETE FROM columns WHERE column_id = ?1",
        params![column_id],
    )?;
    tx.execute(
        "UPDATE columns SET position = position - 1
         WHERE board_id = ?1 AND position > ?2",
        params![current.board_id, current.position],
    )?;

    tracing::debug!(
        board_id = current.board_id,
        column_id,
        position = current.position,
        unlinked,
        "deleted column"
    );
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{delete_column, insert_column, reposition_column};
    use crate::db::{create_board, open_in_memory_store, query};
    use crate::error::BoardError;
    use crate::model::ColumnUpdate;
    use rusqlite::Connection;

    fn board_with_columns(names: &[&str]) -> anyhow::Result<(Connection, i64, Vec<i64>)> {
        let mut conn = open_in_memory_store()?;
        let board_id = create_board(&conn, 1, "sprint")?;
        let mut ids = Vec::new();
        for name in names {
            ids.push(insert_column(&mut conn, board_id, name, None)?);
        }
        Ok((conn, board_id, ids))
    }

    fn layout(conn: &Connection, board_id: i64) -> anyhow::Result<Vec<(String, i64)>> {
        Ok(query::board_columns(conn, board_id)?
            .into_iter()
            .map(|c| (c.name, c.position))
            .collect())
    }

    fn keep(name: &str) -> ColumnUpdate {
        ColumnUpdate {
            name: name.to_string(),
            is_done: false,
            due_date: None,
        }
    }

    #[test]
    fn append_assigns_next_position() -> anyhow::Result<()> {
        let (conn, board_id, _) = board_with_columns(&["todo", "doing", "done"])?;
        assert_eq!(
            layout(&conn, board_id)?,
            [
                ("todo".to_string(), 1),
                ("doing".to_string(), 2),
                ("done".to_string(), 3)
            ]
        );
        Ok(())
    }

    #[test]
    fn insert_in_middle_shifts_later_columns() -> anyhow::Result<()> {
        // [A, B, C] + insert "D" at 2 → [A, D, B, C].
        let (mut conn, board_id, _) = board_with_columns(&["A", "B", "C"])?;
        insert_column(&mut conn, board_id, "D", Some(2))?;

        assert_eq!(
            layout(&conn, board_id)?,
            [
                ("A".to_string(), 1),
                ("D".to_string(), 2),
                ("B".to_string(), 3),
                ("C".to_string(), 4)
            ]
        );
        Ok(())
    }

    #[test]
    fn out_of_range_positions_are_clamped_not_rejected() -> anyhow::Result<()> {
        let (mut conn, board_id, _) = board_with_columns(&["A", "B"])?;

        insert_column(&mut conn, board_id, "low", Some(-5))?;
        insert_column(&mut conn, board_id, "high", Some(99))?;

        assert_eq!(
            layout(&conn, board_id)?,
            [
                ("low".to_string(), 1),
                ("A".to_string(), 2),
                ("B".to_string(), 3),
                ("high".to_string(), 4)
            ]
        );
        Ok(())
    }

    #[test]
    fn reposition_up_shifts_displaced_range_right() -> anyhow::Result<()> {
        let (mut conn, board_id, ids) = board_with_columns(&["A", "B", "C", "D"])?;
        reposition_column(&mut conn, ids[3], 2, &keep("D"))?;

        assert_eq!(
            layout(&conn, board_id)?,
            [
                ("A".to_string(), 1),
                ("D".to_string(), 2),
                ("B".to_string(), 3),
                ("C".to_string(), 4)
            ]
        );
        Ok(())
    }

    #[test]
    fn reposition_down_shifts_displaced_range_left() -> anyhow::Result<()> {
        let (mut conn, board_id, ids) = board_with_columns(&["A", "B", "C", "D"])?;
        reposition_column(&mut conn, ids[0], 3, &keep("A"))?;

        assert_eq!(
            layout(&conn, board_id)?,
            [
                ("B".to_string(), 1),
                ("C".to_string(), 2),
                ("A".to_string(), 3),
                ("D".to_string(), 4)
            ]
        );
        Ok(())
    }

    #[test]
    fn reposition_to_same_slot_still_applies_metadata() -> anyhow::Result<()> {
        let (mut conn, board_id, ids) = board_with_columns(&["A", "B"])?;
        let update = ColumnUpdate {
            name: "A renamed".to_string(),
            is_done: true,
            due_date: None,
        };
        reposition_column(&mut conn, ids[0], 1, &update)?;

        let columns = query::board_columns(&conn, board_id)?;
        assert_eq!(columns[0].name, "A renamed");
        assert!(columns[0].is_done);
        assert_eq!(columns[0].position, 1);
        Ok(())
    }

    #[test]
    fn delete_renumbers_later_columns() -> anyhow::Result<()> {
        // Deleting position 2 of 3 leaves {1, 2} with relative order kept.
        let (mut conn, board_id, ids) = board_with_columns(&["A", "B", "C"])?;
        delete_column(&mut conn, ids[1])?;

        assert_eq!(
            layout(&conn, board_id)?,
            [("A".to_string(), 1), ("C".to_string(), 2)]
        );
        Ok(())
    }

    #[test]
    fn unknown_column_is_not_found() -> anyhow::Result<()> {
        let (mut conn, _, _) = board_with_columns(&["A"])?;

        let err = delete_column(&mut conn, 9999).expect_err("delete must fail");
        assert!(matches!(
            err,
            BoardError::NotFound {
                entity: "column",
                id: 9999
            }
        ));
        Ok(())
    }

    #[test]
    fn boards_do_not_interfere() -> anyhow::Result<()> {
        let mut conn = open_in_memory_store()?;
        let board_a = create_board(&conn, 1, "alpha")?;
        let board_b = create_board(&conn, 2, "beta")?;
        insert_column(&mut conn, board_a, "a1", None)?;
        insert_column(&mut conn, board_b, "b1", None)?;
        insert_column(&mut conn, board_a, "a0", Some(1))?;

        assert_eq!(
            layout(&conn, board_a)?,
            [("a0".to_string(), 1), ("a1".to_string(), 2)]
        );
        assert_eq!(layout(&conn, board_b)?, [("b1".to_string(), 1)]);
        Ok(())
    }
}
