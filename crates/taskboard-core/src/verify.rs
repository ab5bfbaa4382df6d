//! Ordering invariant checks.
//!
//! Cheap, read-only audits used by tests and property suites:
//! - a board's column positions are exactly `{1..N}`
//! - a column's sort keys are pairwise distinct
//!
//! The write paths maintain these transactionally; this module only observes.

use crate::db::query;
use crate::error::Result;
use rusqlite::Connection;
use std::collections::HashSet;

/// One detected ordering violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingIssue {
    /// Column positions on a board are not the dense set `{1..N}`.
    PositionNotDense {
        board_id: i64,
        expected: i64,
        found: i64,
    },
    /// Two tasks in one column share a sort key.
    DuplicateSortKey { column_id: i64, sort_order: String },
}

/// Aggregate audit result for one board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderingReport {
    pub issues: Vec<OrderingIssue>,
}

impl OrderingReport {
    /// Return `true` when no violations were found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Audit one board: dense column positions and distinct per-column sort keys.
///
/// # Errors
///
/// Returns an error if a read fails.
pub fn verify_board(conn: &Connection, board_id: i64) -> Result<OrderingReport> {
    let mut report = OrderingReport::default();

    let columns = query::board_columns(conn, board_id)?;
    let mut expected = 0_i64;
    for column in &columns {
        expected += 1;
        if column.position != expected {
            report.issues.push(OrderingIssue::PositionNotDense {
                board_id,
                expected,
                found: column.position,
            });
        }
    }

    for column in &columns {
        let mut seen = HashSet::new();
        for task in query::column_tasks(conn, column.id)? {
            let key = task.sort_order.normalize().to_string();
            if !seen.insert(key.clone()) {
                report.issues.push(OrderingIssue::DuplicateSortKey {
                    column_id: column.id,
                    sort_order: key,
                });
            }
        }
    }

    Ok(report)
}
