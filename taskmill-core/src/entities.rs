//! Core entity structures

use crate::{Timestamp, TodoId, UserId};
use serde::{Deserialize, Serialize};

/// User - the entity scoping record ownership.
///
/// Users are created elsewhere (sign-up flow); the maintenance pipeline only
/// ever reads them. The external-auth identifier column that the migrator may
/// add to the `users` table is catalog state and deliberately does not appear
/// here, so the read path works both before and after migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    /// Unique external key (e.g. a login name).
    pub username: String,
    pub created_at: Timestamp,
}

/// Todo - a persisted to-do record owned by exactly one user.
///
/// Invariant: `created_at <= updated_at` always; equal at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub todo_id: TodoId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub owner_id: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A not-yet-persisted to-do record, as produced by the generator.
///
/// The owner is attached at staging time by the committer; the generator
/// itself knows nothing about users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub todo_id: TodoId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NewTodo {
    /// Attach an owner, yielding the persisted shape.
    pub fn into_todo(self, owner_id: UserId) -> Todo {
        Todo {
            todo_id: self.todo_id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            owner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
