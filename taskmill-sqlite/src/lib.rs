//! Taskmill SQLite - rusqlite backend for the store traits
//!
//! File-backed store used by the maintenance binaries. Write transactions
//! are serialized with `BEGIN IMMEDIATE`; catalog introspection goes through
//! `pragma_table_info`. One connection per session, opened by the factory
//! and released (rolling back any open transaction) on drop.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use taskmill_core::{
    new_user_id, ColumnSpec, ColumnType, MigrationError, NewTodo, StoreError, StoreResult, User,
    UserId,
};
use taskmill_store::{SchemaEditor, SchemaInspector, SessionFactory, StoreSession};
use uuid::Uuid;

/// Base schema. The `ext_id` column on `users` is intentionally absent: it
/// is added by the schema migrator, not at bootstrap.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id    TEXT PRIMARY KEY,
    username   TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS todos (
    todo_id     TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    completed   INTEGER NOT NULL DEFAULT 0,
    owner_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_todos_owner ON todos(owner_id);
";

/// SQLite store rooted at one database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open a store at the given path, verifying the file is reachable.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        // Fail fast on unreadable paths instead of at first session.
        store.connect()?;
        Ok(store)
    }

    /// Create the base `users`/`todos` schema if missing.
    pub fn bootstrap(&self) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::OpenFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Create a user directly. Owners are created elsewhere in production;
    /// this exists for fixtures and first-run setup.
    pub fn insert_user(&self, username: &str) -> StoreResult<User> {
        let user = User {
            user_id: new_user_id(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO users (user_id, username, created_at) VALUES (?1, ?2, ?3)",
            params![user.user_id.to_string(), user.username, user.created_at],
        )
        .map_err(|e| StoreError::InsertFailed {
            table: "users".to_string(),
            reason: e.to_string(),
        })?;
        Ok(user)
    }

    fn connect(&self) -> StoreResult<Connection> {
        let open_failed = |e: rusqlite::Error| StoreError::OpenFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        };

        let conn = Connection::open(&self.path).map_err(open_failed)?;
        // journal_mode returns its new value as a row, so query it.
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
            .map_err(open_failed)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(open_failed)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(open_failed)?;
        Ok(conn)
    }
}

impl SessionFactory for SqliteStore {
    type Session = SqliteSession;

    fn open_session(&self) -> StoreResult<SqliteSession> {
        Ok(SqliteSession {
            conn: self.connect()?,
            in_txn: false,
        })
    }
}

/// Session over one SQLite connection.
///
/// A write transaction is opened lazily (`BEGIN IMMEDIATE`) at the first
/// staging or DDL call and closed by `commit`/`rollback`; after a commit the
/// next write opens a fresh transaction, which is what gives the loader its
/// per-batch commit scope. Reads outside a transaction run in autocommit.
#[derive(Debug)]
pub struct SqliteSession {
    conn: Connection,
    in_txn: bool,
}

impl SqliteSession {
    fn begin_write(&mut self) -> StoreResult<()> {
        if !self.in_txn {
            self.conn
                .execute_batch("BEGIN IMMEDIATE")
                .map_err(|e| StoreError::TransactionFailed {
                    reason: e.to_string(),
                })?;
            self.in_txn = true;
        }
        Ok(())
    }

    fn count_where(&mut self, sql: &str, owner_id: UserId) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row(sql, params![owner_id.to_string()], |row| row.get(0))
            .map_err(|e| StoreError::QueryFailed {
                table: "todos".to_string(),
                reason: e.to_string(),
            })?;
        Ok(count as u64)
    }
}

impl StoreSession for SqliteSession {
    fn find_user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, username, created_at FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, DateTime<Utc>>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| StoreError::QueryFailed {
                table: "users".to_string(),
                reason: e.to_string(),
            })?;

        match row {
            Some((id, username, created_at)) => {
                let user_id = Uuid::parse_str(&id).map_err(|e| StoreError::QueryFailed {
                    table: "users".to_string(),
                    reason: format!("malformed user_id {}: {}", id, e),
                })?;
                Ok(Some(User {
                    user_id,
                    username,
                    created_at,
                }))
            }
            None => Ok(None),
        }
    }

    fn count_todos(&mut self, owner_id: UserId) -> StoreResult<u64> {
        self.count_where("SELECT COUNT(*) FROM todos WHERE owner_id = ?1", owner_id)
    }

    fn count_completed_todos(&mut self, owner_id: UserId) -> StoreResult<u64> {
        self.count_where(
            "SELECT COUNT(*) FROM todos WHERE owner_id = ?1 AND completed = 1",
            owner_id,
        )
    }

    fn add_todos(&mut self, owner_id: UserId, records: &[NewTodo]) -> StoreResult<()> {
        self.begin_write()?;
        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO todos (todo_id, title, description, completed, owner_id, \
                 created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(|e| StoreError::InsertFailed {
                table: "todos".to_string(),
                reason: e.to_string(),
            })?;

        for record in records {
            stmt.execute(params![
                record.todo_id.to_string(),
                record.title,
                record.description,
                record.completed,
                owner_id.to_string(),
                record.created_at,
                record.updated_at,
            ])
            .map_err(|e| StoreError::InsertFailed {
                table: "todos".to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        if !self.in_txn {
            return Ok(());
        }
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| StoreError::TransactionFailed {
                reason: e.to_string(),
            })?;
        self.in_txn = false;
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        if !self.in_txn {
            return Ok(());
        }
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| StoreError::TransactionFailed {
                reason: e.to_string(),
            })?;
        self.in_txn = false;
        Ok(())
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if self.in_txn {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "rollback on session drop failed");
            }
        }
    }
}

// ============================================================================
// SCHEMA INTROSPECTION AND DDL
// ============================================================================

fn sql_type(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Text => "TEXT",
        ColumnType::Integer => "INTEGER",
        // SQLite has no native boolean or timestamp storage classes.
        ColumnType::Boolean => "INTEGER",
        ColumnType::Timestamp => "TEXT",
    }
}

impl SchemaInspector for SqliteSession {
    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool, MigrationError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
                params![table, column],
                |row| row.get(0),
            )
            .map_err(|e| MigrationError::Inspect {
                table: table.to_string(),
                reason: e.to_string(),
            })?;
        Ok(count > 0)
    }
}

impl SchemaEditor for SqliteSession {
    fn add_column(&mut self, spec: &ColumnSpec) -> Result<(), MigrationError> {
        // Identifiers are spliced into DDL; re-validate at the last line of defense.
        spec.validate().map_err(|e| MigrationError::Ddl {
            table: spec.table.clone(),
            column: spec.column.clone(),
            reason: e.to_string(),
        })?;
        self.begin_write().map_err(|e| MigrationError::Ddl {
            table: spec.table.clone(),
            column: spec.column.clone(),
            reason: e.to_string(),
        })?;

        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            spec.table,
            spec.column,
            sql_type(spec.column_type)
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|e| MigrationError::Ddl {
                table: spec.table.clone(),
                column: spec.column.clone(),
                reason: e.to_string(),
            })
    }

    fn create_unique_index(&mut self, spec: &ColumnSpec) -> Result<(), MigrationError> {
        spec.validate().map_err(|e| MigrationError::Ddl {
            table: spec.table.clone(),
            column: spec.column.clone(),
            reason: e.to_string(),
        })?;
        self.begin_write().map_err(|e| MigrationError::Ddl {
            table: spec.table.clone(),
            column: spec.column.clone(),
            reason: e.to_string(),
        })?;

        let unique = if spec.index.unique { "UNIQUE " } else { "" };
        let partial = if spec.index.only_non_null {
            format!(" WHERE {} IS NOT NULL", spec.column)
        } else {
            String::new()
        };
        let sql = format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {}({}){}",
            unique, spec.index.name, spec.table, spec.column, partial
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|e| MigrationError::Ddl {
                table: spec.table.clone(),
                column: spec.column.clone(),
                reason: e.to_string(),
            })
    }
}

// ============================================================================
// TESTS
// ============================================================================
