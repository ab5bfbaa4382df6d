//! Domain types for boards, columns, tasks, and backlog items.

pub mod backlog;
pub mod column;
pub mod task;

pub use backlog::{BacklogItem, BacklogStatus};
pub use column::{Column, ColumnUpdate};
pub use task::{LinkChange, Priority, Task, TaskDraft, TaskPatch};

/// Failure to parse an enum from its stored string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseEnumError(String);

impl ParseEnumError {
    pub(crate) fn new(what: &str, value: &str) -> Self {
        Self(format!("unknown {what}: {value}"))
    }
}
