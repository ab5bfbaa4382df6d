//! Kanban board ordering and backlog-synchronization engine.
//!
//! Three cooperating pieces over one SQLite store:
//!
//! - [`sequencer`] keeps a board's columns densely numbered `1..N` through
//!   inserts, repositions, and deletes;
//! - [`order`] keeps each column's tasks totally ordered by a fractional
//!   decimal key, with O(1) drag-and-drop moves and a resequencing escape
//!   valve when midpoint gaps collapse;
//! - [`backlog`] enforces the exclusive task↔backlog-item link and projects
//!   the item's status from the column its task occupies.
//!
//! Every mutating operation is one short-lived transaction; failures roll
//! back completely, so ordering state is never observably gapped or
//! duplicated. There is no process-wide ordering counter — keys and positions
//! are recomputed from the current row set, so unrelated boards never
//! contend.
//!
//! # Conventions
//!
//! - **Errors**: typed [`error::BoardError`], propagated with `?`.
//! - **Logging**: `tracing` events — `debug!` per mutation, `info!` for
//!   column resequences.

pub mod backlog;
pub mod db;
pub mod error;
pub mod model;
pub mod order;
pub mod sequencer;
pub mod verify;

pub use error::{BoardError, Result};
pub use order::{GAP, MIN_GAP};
