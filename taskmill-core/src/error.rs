//! Error types for Taskmill operations

use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("User not found: {username}")]
    UserNotFound { username: String },

    #[error("Failed to open store at {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Query failed on {table}: {reason}")]
    QueryFailed { table: String, reason: String },

    #[error("Insert failed on {table}: {reason}")]
    InsertFailed { table: String, reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Schema migration errors.
///
/// Whether a partially-applied change (column added, index creation failed)
/// is rolled back depends on the backing store's DDL transactionality; the
/// error itself makes no promise either way.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MigrationError {
    #[error("DDL failed on {table}.{column}: {reason}")]
    Ddl {
        table: String,
        column: String,
        reason: String,
    },

    #[error("Catalog introspection failed on {table}: {reason}")]
    Inspect { table: String, reason: String },

    #[error("Column {table}.{column} not visible after migration commit")]
    PostConditionFailed { table: String, column: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Taskmill errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskmillError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Taskmill operations.
pub type TaskmillResult<T> = Result<T, TaskmillError>;

/// Result type alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// TESTS
// =============================================================================
