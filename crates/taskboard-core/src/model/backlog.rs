use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifecycle status of a backlog item.
///
/// Only three of these are ever written by this core: `in_progress` and
/// `completed` via the link/column-change projection, and `ready` (or
/// `completed`) on unlink. `planned`, `blocked`, and `archived` belong to
/// backlog workflows outside this engine, except that an `archived` item
/// refuses new links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacklogStatus {
    Planned,
    Ready,
    InProgress,
    Blocked,
    Completed,
    Archived,
}

impl BacklogStatus {
    /// Return the status name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// All statuses, in workflow order.
    pub const ALL: [Self; 6] = [
        Self::Planned,
        Self::Ready,
        Self::InProgress,
        Self::Blocked,
        Self::Completed,
        Self::Archived,
    ];
}

impl fmt::Display for BacklogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BacklogStatus {
    type Err = super::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "ready" => Ok(Self::Ready),
            "in_progress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(super::ParseEnumError::new("backlog status", other)),
        }
    }
}

/// A backlog-pool record that may be promoted into a task.
///
/// Linked to at most one task at a time; the exclusive link is enforced both
/// by the coordinator and by a partial unique index on `tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogItem {
    pub id: i64,
    pub group_id: i64,
    pub title: String,
    pub status: BacklogStatus,
}

#[cfg(test)]
mod tests {
    use super::BacklogStatus;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_str() {
        for status in BacklogStatus::ALL {
            assert_eq!(BacklogStatus::from_str(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert!(BacklogStatus::from_str("done").is_err());
    }
}
