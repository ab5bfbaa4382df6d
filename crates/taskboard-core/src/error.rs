//! Error taxonomy for the ordering and backlog-synchronization engine.
//!
//! Every mutating operation runs inside one transaction, so any error here
//! means the whole operation rolled back. Callers at the HTTP boundary map
//! variants to status codes: `NotFound` → 404, `InvalidOperation` → 409,
//! `Unauthorized` → 403, `InvalidArgument` → 400.

use std::fmt;

/// Errors surfaced by the board ordering core.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind ("board", "column", "task", "backlog item").
        entity: &'static str,
        /// Primary key that failed to resolve.
        id: i64,
    },

    /// Operation conflicts with current state (exclusive link taken,
    /// archived backlog item, neighbor not in the target column).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Tenant isolation violation: entities belong to different groups.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed input from a caller.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl BoardError {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InvalidOperation(_) => ErrorCode::InvalidOperation,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Db(_) => ErrorCode::Database,
        }
    }
}

/// Machine-readable error codes for the HTTP-boundary translation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotFound,
    InvalidOperation,
    Unauthorized,
    InvalidArgument,
    Database,
}

impl ErrorCode {
    /// Stable code string for logs and API payloads.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "E2001",
            Self::InvalidOperation => "E2002",
            Self::Unauthorized => "E2003",
            Self::InvalidArgument => "E2004",
            Self::Database => "E5001",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BoardError>;
