//! Taskmill Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic, no IO.

mod config;
mod entities;
mod error;

pub use config::{ColumnSpec, ColumnType, IndexSpec, LoadPlan};
pub use entities::{NewTodo, Todo, User};
pub use error::{
    ConfigError, MigrationError, StoreError, StoreResult, TaskmillError, TaskmillResult,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// To-do record identifier using UUIDv7 for timestamp-sortable IDs.
pub type TodoId = Uuid;

/// User (record owner) identifier using UUIDv7.
pub type UserId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 TodoId (timestamp-sortable).
pub fn new_todo_id() -> TodoId {
    Uuid::now_v7()
}

/// Generate a new UUIDv7 UserId (timestamp-sortable).
pub fn new_user_id() -> UserId {
    Uuid::now_v7()
}
