use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named bucket on a board, holding tasks in fractional order.
///
/// `position` is 1-based and dense: the positions of one board's columns are
/// always exactly `{1..N}`. The sequencer maintains this by bulk-shifting
/// siblings inside the same transaction as every insert/reposition/delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: i64,
    pub board_id: i64,
    pub name: String,
    pub position: i64,
    /// Tasks placed here count as finished for backlog projection.
    pub is_done: bool,
    pub due_date: Option<NaiveDate>,
}

/// Metadata applied alongside a reposition.
///
/// Repositioning carries the full editable column surface so that the shift,
/// the direct position set, and the metadata write commit together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnUpdate {
    pub name: String,
    pub is_done: bool,
    pub due_date: Option<NaiveDate>,
}
