//! Canonical SQLite schema for the board ordering engine.
//!
//! The schema is normalized around the ordering invariants:
//! - `columns.position` is 1-based and dense per board; there is deliberately
//!   no UNIQUE(board_id, position) constraint because the sequencer's bulk
//!   shifts would transiently collide row-by-row. Density is maintained by the
//!   sequencer's transactions and checked by [`crate::verify`].
//! - `tasks.sort_order` stores the decimal ordinal key as TEXT; reads order by
//!   `CAST(sort_order AS REAL)`, which is exact well past the `MIN_GAP`
//!   resequencing threshold.
//! - the partial unique index on `tasks.backlog_item_id` backstops the
//!   exclusive task↔backlog link.

/// Migration v1: core tables.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS boards (
    board_id INTEGER PRIMARY KEY,
    group_id INTEGER NOT NULL,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS columns (
    column_id INTEGER PRIMARY KEY,
    board_id INTEGER NOT NULL REFERENCES boards(board_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    position INTEGER NOT NULL CHECK (position >= 1),
    is_done INTEGER NOT NULL DEFAULT 0 CHECK (is_done IN (0, 1)),
    due_date TEXT,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS backlog_items (
    backlog_item_id INTEGER PRIMARY KEY,
    group_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'planned' CHECK (
        status IN ('planned', 'ready', 'in_progress', 'blocked', 'completed', 'archived')
    ),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id INTEGER PRIMARY KEY,
    column_id INTEGER NOT NULL REFERENCES columns(column_id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT NOT NULL DEFAULT 'medium' CHECK (
        priority IN ('low', 'medium', 'high', 'urgent')
    ),
    status_text TEXT NOT NULL DEFAULT '',
    due_date TEXT,
    sort_order TEXT NOT NULL,
    backlog_item_id INTEGER REFERENCES backlog_items(backlog_item_id) ON DELETE SET NULL,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS milestone_items (
    milestone_id INTEGER NOT NULL,
    backlog_item_id INTEGER NOT NULL REFERENCES backlog_items(backlog_item_id) ON DELETE CASCADE,
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (milestone_id, backlog_item_id)
);
";

/// Migration v2: read-path and link-enforcement indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_columns_board_position
    ON columns(board_id, position);

CREATE INDEX IF NOT EXISTS idx_tasks_column
    ON tasks(column_id);

CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_backlog_item
    ON tasks(backlog_item_id)
    WHERE backlog_item_id IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_backlog_items_group
    ON backlog_items(group_id, status);

CREATE INDEX IF NOT EXISTS idx_milestone_items_backlog
    ON milestone_items(backlog_item_id);
";

/// Indexes expected by the ordered-read and link paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_columns_board_position",
    "idx_tasks_column",
    "idx_tasks_backlog_item",
    "idx_backlog_items_group",
    "idx_milestone_items_backlog",
];

#[cfg(test)]
mod tests {
    use crate::db::migrations;
    use rusqlite::{Connection, params};

    fn seeded_conn() -> rusqlite::Result<Connection> {
        let mut conn = Connection::open_in_memory()?;
        migrations::migrate(&mut conn)?;

        conn.execute(
            "INSERT INTO boards (board_id, group_id, name, created_at_us) VALUES (1, 7, 'sprint', 0)",
            [],
        )?;
        for pos in 1..=4_i64 {
            conn.execute(
                "INSERT INTO columns (board_id, name, position, is_done, created_at_us)
                 VALUES (1, ?1, ?2, 0, 0)",
                params![format!("col-{pos}"), pos],
            )?;
        }
        Ok(conn)
    }

    fn query_plan_details(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))?;
        stmt.query_map([], |row| row.get::<_, String>(3))?
            .collect::<Result<Vec<_>, _>>()
    }

    #[test]
    fn query_plan_uses_board_position_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let details = query_plan_details(
            &conn,
            "SELECT column_id FROM columns WHERE board_id = 1 ORDER BY position",
        )?;

        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_columns_board_position")),
            "expected board position index in plan, got: {details:?}"
        );
        Ok(())
    }

    #[test]
    fn exclusive_backlog_link_is_enforced_by_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        conn.execute(
            "INSERT INTO backlog_items (backlog_item_id, group_id, title, status, created_at_us, updated_at_us)
             VALUES (10, 7, 'story', 'ready', 0, 0)",
            [],
        )?;
        conn.execute(
            "INSERT INTO tasks (column_id, title, sort_order, backlog_item_id, created_at_us, updated_at_us)
             VALUES (1, 'a', '1000', 10, 0, 0)",
            [],
        )?;

        let second = conn.execute(
            "INSERT INTO tasks (column_id, title, sort_order, backlog_item_id, created_at_us, updated_at_us)
             VALUES (1, 'b', '2000', 10, 0, 0)",
            [],
        );
        assert!(second.is_err(), "second link to backlog item 10 must fail");

        // Unlinked tasks are not constrained against each other.
        conn.execute(
            "INSERT INTO tasks (column_id, title, sort_order, created_at_us, updated_at_us)
             VALUES (1, 'c', '3000', 0, 0)",
            [],
        )?;
        conn.execute(
            "INSERT INTO tasks (column_id, title, sort_order, created_at_us, updated_at_us)
             VALUES (1, 'd', '4000', 0, 0)",
            [],
        )?;
        Ok(())
    }
}
