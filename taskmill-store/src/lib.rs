//! Taskmill Store - Storage Traits and Mock Implementation
//!
//! Defines the storage abstraction layer consumed by the maintenance
//! pipeline. The SQLite implementation lives in taskmill-sqlite; the mock
//! here backs the test suites of every crate in the workspace.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use taskmill_core::{
    new_user_id, ColumnSpec, MigrationError, NewTodo, StoreError, StoreResult, Todo, TodoId, User,
    UserId,
};

// ============================================================================
// SESSION TRAITS
// ============================================================================

/// One unit of store access: reads, staged writes, and transaction control.
///
/// A session holds at most one open transaction. Staged records are not
/// durable until `commit`; `rollback` discards them. Sessions release their
/// resources on drop, rolling back anything still staged, so every exit
/// path - success or failure - closes cleanly.
pub trait StoreSession {
    /// Look up a user by unique username.
    fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>>;

    /// Count persisted to-dos owned by the given user.
    fn count_todos(&mut self, owner_id: UserId) -> StoreResult<u64>;

    /// Count persisted to-dos owned by the given user with the completed flag set.
    fn count_completed_todos(&mut self, owner_id: UserId) -> StoreResult<u64>;

    /// Stage a group of records for the given owner. The owner must exist.
    /// Nothing is durable until `commit`.
    fn add_todos(&mut self, owner_id: UserId, records: &[NewTodo]) -> StoreResult<()>;

    /// Commit the open transaction, making staged records durable.
    fn commit(&mut self) -> StoreResult<()>;

    /// Discard staged records and close the open transaction.
    fn rollback(&mut self) -> StoreResult<()>;
}

/// Catalog introspection: does a column exist on a table right now?
pub trait SchemaInspector {
    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, MigrationError>;
}

/// Schema evolution operations, issued as individual statements against the
/// session's transaction. Whether a half-applied sequence rolls back on
/// failure is backend-specific.
pub trait SchemaEditor: SchemaInspector {
    /// `ALTER TABLE ... ADD COLUMN` equivalent. Errors if the column exists.
    fn add_column(&mut self, spec: &ColumnSpec) -> Result<(), MigrationError>;

    /// Create the supporting index described by `spec.index`.
    fn create_unique_index(&mut self, spec: &ColumnSpec) -> Result<(), MigrationError>;
}

/// Opens sessions against one store. Components receive a factory at
/// construction instead of reaching for a process-wide connection.
pub trait SessionFactory {
    type Session: StoreSession;

    fn open_session(&self) -> StoreResult<Self::Session>;
}

// ============================================================================
// MOCK STORE
// ============================================================================

/// In-memory mock store for testing.
///
/// Mirrors the visible behavior of a real backend: staged records are
/// invisible until commit, owners must exist at write time, and the column
/// catalog answers introspection. Failure injection covers the error paths
/// the pipeline must survive: a commit that fails on a chosen ordinal, an
/// index creation that fails, and a catalog that lags behind executed DDL.
///
/// DDL takes effect immediately rather than at commit; transactional DDL is
/// backend-specific and the mock does not model it.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    inner: Arc<RwLock<MockInner>>,
}

#[derive(Debug, Default)]
struct MockInner {
    users: HashMap<UserId, User>,
    todos: HashMap<TodoId, Todo>,
    /// table -> visible columns
    columns: HashMap<String, HashSet<String>>,
    /// table -> index names
    indexes: HashMap<String, HashSet<String>>,
    /// Columns physically added while the catalog lag flag was set.
    hidden_columns: HashSet<(String, String)>,
    ddl_log: Vec<String>,
    commit_attempts: u64,
    fail_commit_on: Option<u64>,
    fail_index_creation: bool,
    hide_new_columns: bool,
}

impl MockStore {
    /// Create a mock store with the base `users`/`todos` catalog in place.
    pub fn new() -> Self {
        let store = Self::default();
        {
            let mut inner = store.inner.write().unwrap();
            inner.columns.insert(
                "users".to_string(),
                ["user_id", "username", "created_at"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            );
            inner.columns.insert(
                "todos".to_string(),
                [
                    "todo_id",
                    "title",
                    "description",
                    "completed",
                    "owner_id",
                    "created_at",
                    "updated_at",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            );
        }
        store
    }

    /// Create a user directly (owners are created elsewhere in production).
    pub fn insert_user(&self, username: &str) -> User {
        let user = User {
            user_id: new_user_id(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .unwrap()
            .users
            .insert(user.user_id, user.clone());
        user
    }

    /// Get count of persisted todos across all owners.
    pub fn todo_count(&self) -> usize {
        self.inner.read().unwrap().todos.len()
    }

    /// Get count of users.
    pub fn user_count(&self) -> usize {
        self.inner.read().unwrap().users.len()
    }

    /// Number of DDL statements executed so far.
    pub fn ddl_statements(&self) -> usize {
        self.inner.read().unwrap().ddl_log.len()
    }

    /// Whether the catalog currently shows the column.
    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.inner
            .read()
            .unwrap()
            .columns
            .get(table)
            .is_some_and(|cols| cols.contains(column))
    }

    /// Whether the named index exists on the table.
    pub fn has_index(&self, table: &str, index: &str) -> bool {
        self.inner
            .read()
            .unwrap()
            .indexes
            .get(table)
            .is_some_and(|idx| idx.contains(index))
    }

    /// Columns whose ADD COLUMN executed while the catalog lag flag was set.
    pub fn hidden_column_count(&self) -> usize {
        self.inner.read().unwrap().hidden_columns.len()
    }

    /// Fail the n-th commit attempt (1-based) across all sessions.
    pub fn fail_commit_on(&self, attempt: u64) {
        self.inner.write().unwrap().fail_commit_on = Some(attempt);
    }

    /// Make the next index creation fail.
    pub fn fail_index_creation(&self) {
        self.inner.write().unwrap().fail_index_creation = true;
    }

    /// Simulate catalog lag: columns added from now on execute but stay
    /// invisible to `column_exists`.
    pub fn hide_new_columns(&self) {
        self.inner.write().unwrap().hide_new_columns = true;
    }
}

impl SessionFactory for MockStore {
    type Session = MockSession;

    fn open_session(&self) -> StoreResult<MockSession> {
        Ok(MockSession {
            store: self.clone(),
            staged: Vec::new(),
        })
    }
}

/// Session over a [`MockStore`]. Staged records live here until commit.
#[derive(Debug)]
pub struct MockSession {
    store: MockStore,
    staged: Vec<Todo>,
}

impl StoreSession for MockSession {
    fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.store.inner.read().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn count_todos(&mut self, owner_id: UserId) -> StoreResult<u64> {
        let inner = self.store.inner.read().unwrap();
        Ok(inner
            .todos
            .values()
            .filter(|t| t.owner_id == owner_id)
            .count() as u64)
    }

    fn count_completed_todos(&mut self, owner_id: UserId) -> StoreResult<u64> {
        let inner = self.store.inner.read().unwrap();
        Ok(inner
            .todos
            .values()
            .filter(|t| t.owner_id == owner_id && t.completed)
            .count() as u64)
    }

    fn add_todos(&mut self, owner_id: UserId, records: &[NewTodo]) -> StoreResult<()> {
        let inner = self.store.inner.read().unwrap();
        if !inner.users.contains_key(&owner_id) {
            return Err(StoreError::InsertFailed {
                table: "todos".to_string(),
                reason: format!("owner {} does not exist", owner_id),
            });
        }
        drop(inner);

        self.staged
            .extend(records.iter().cloned().map(|r| r.into_todo(owner_id)));
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        let mut inner = self.store.inner.write().unwrap();
        inner.commit_attempts += 1;
        if inner.fail_commit_on == Some(inner.commit_attempts) {
            return Err(StoreError::TransactionFailed {
                reason: format!("injected failure on commit {}", inner.commit_attempts),
            });
        }

        for todo in self.staged.drain(..) {
            inner.todos.insert(todo.todo_id, todo);
        }
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.staged.clear();
        Ok(())
    }
}

impl SchemaInspector for MockSession {
    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, MigrationError> {
        // An unknown table introspects as "no columns", matching
        // pragma_table_info semantics on the SQLite backend.
        let inner = self.store.inner.read().unwrap();
        Ok(inner
            .columns
            .get(table)
            .is_some_and(|cols| cols.contains(column)))
    }
}

impl SchemaEditor for MockSession {
    fn add_column(&mut self, spec: &ColumnSpec) -> Result<(), MigrationError> {
        let mut inner = self.store.inner.write().unwrap();
        let cols = inner.columns.get(&spec.table).cloned().ok_or_else(|| {
            MigrationError::Ddl {
                table: spec.table.clone(),
                column: spec.column.clone(),
                reason: "no such table".to_string(),
            }
        })?;
        if cols.contains(&spec.column) {
            return Err(MigrationError::Ddl {
                table: spec.table.clone(),
                column: spec.column.clone(),
                reason: "duplicate column name".to_string(),
            });
        }

        inner.ddl_log.push(format!(
            "ALTER TABLE {} ADD COLUMN {} {:?}",
            spec.table, spec.column, spec.column_type
        ));
        if inner.hide_new_columns {
            inner
                .hidden_columns
                .insert((spec.table.clone(), spec.column.clone()));
        } else {
            inner
                .columns
                .get_mut(&spec.table)
                .unwrap()
                .insert(spec.column.clone());
        }
        Ok(())
    }

    fn create_unique_index(&mut self, spec: &ColumnSpec) -> Result<(), MigrationError> {
        let mut inner = self.store.inner.write().unwrap();
        if inner.fail_index_creation {
            return Err(MigrationError::Ddl {
                table: spec.table.clone(),
                column: spec.column.clone(),
                reason: "injected index failure".to_string(),
            });
        }

        inner.ddl_log.push(format!(
            "CREATE UNIQUE INDEX {} ON {}({})",
            spec.index.name, spec.table, spec.column
        ));
        inner
            .indexes
            .entry(spec.table.clone())
            .or_default()
            .insert(spec.index.name.clone());
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
