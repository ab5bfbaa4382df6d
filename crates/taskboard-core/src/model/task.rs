use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Task priority levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Return the priority name as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = super::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(super::ParseEnumError::new("priority", other)),
        }
    }
}

/// A unit of work placed in exactly one column at a time.
///
/// `sort_order` is a decimal ordinal key; all keys within one column are
/// pairwise distinct. `backlog_item_id` is a non-owning reference — the
/// backlog item lives in the group's pool regardless of this task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub column_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status_text: String,
    pub due_date: Option<NaiveDate>,
    pub sort_order: Decimal,
    pub backlog_item_id: Option<i64>,
}

/// Fields for creating a task via [`crate::order::append_task`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status_text: String,
    pub due_date: Option<NaiveDate>,
    /// Optional backlog link, validated and projected on create.
    pub backlog_item_id: Option<i64>,
}

impl TaskDraft {
    /// Shorthand draft with only a title, defaults elsewhere.
    #[must_use]
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }
}

/// How an update changes the backlog link, if at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkChange {
    /// Leave the current link untouched.
    #[default]
    Keep,
    /// Clear the link; the backlog item returns to the pool.
    Clear,
    /// Link to (or relink onto) the given backlog item.
    Set(i64),
}

/// Metadata patch for [`crate::order::update_task`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status_text: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub link: LinkChange,
}
