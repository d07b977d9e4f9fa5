//! Configuration types

use crate::{ConfigError, TaskmillResult};
use serde::{Deserialize, Serialize};

/// Bulk load plan: which owner, how many records, how large each transaction.
///
/// Batching bounds peak memory and per-transaction size, not concurrency;
/// the load itself is sequential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadPlan {
    /// External key of the owner the records are loaded for.
    pub owner_key: String,
    /// Total number of records to generate and persist.
    pub total: u64,
    /// Maximum records staged and committed per transaction.
    pub batch_size: u64,
}

impl Default for LoadPlan {
    fn default() -> Self {
        Self {
            owner_key: "VK25".to_string(),
            total: 10_000,
            batch_size: 1_000,
        }
    }
}

impl LoadPlan {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `TASKMILL_OWNER`: owner username (default: VK25)
    /// - `TASKMILL_TOTAL`: total records to load (default: 10000)
    /// - `TASKMILL_BATCH`: records per transaction (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            owner_key: std::env::var("TASKMILL_OWNER").unwrap_or(defaults.owner_key),
            total: std::env::var("TASKMILL_TOTAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.total),
            batch_size: std::env::var("TASKMILL_BATCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.batch_size),
        }
    }

    /// Validate the plan.
    ///
    /// Validates:
    /// - owner_key is non-empty
    /// - total >= 1
    /// - batch_size >= 1
    pub fn validate(&self) -> TaskmillResult<()> {
        if self.owner_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "owner_key".to_string(),
                value: String::new(),
                reason: "owner_key must be non-empty".to_string(),
            }
            .into());
        }

        if self.total == 0 {
            return Err(ConfigError::InvalidValue {
                field: "total".to_string(),
                value: self.total.to_string(),
                reason: "total must be at least 1".to_string(),
            }
            .into());
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size".to_string(),
                value: self.batch_size.to_string(),
                reason: "batch_size must be at least 1".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Number of transactions a full run will issue (last batch may be short).
    pub fn batch_count(&self) -> u64 {
        self.total.div_ceil(self.batch_size)
    }
}

// ============================================================================
// SCHEMA MIGRATION SPECS
// ============================================================================

/// Column type, rendered to backend-specific DDL by each store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Integer,
    Boolean,
    Timestamp,
}

/// Supporting index for a migrated column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    /// Enforce uniqueness over indexed values.
    pub unique: bool,
    /// Partial index covering only rows where the column is non-null, so any
    /// number of rows may hold null while non-null values stay distinct.
    pub only_non_null: bool,
}

/// Target of a schema migration: one column plus its supporting index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub table: String,
    pub column: String,
    pub column_type: ColumnType,
    pub index: IndexSpec,
}

impl ColumnSpec {
    /// Validate identifiers before they are spliced into DDL.
    ///
    /// Table, column, and index names must be non-empty, start with a letter
    /// or underscore, and contain only ASCII alphanumerics and underscores.
    pub fn validate(&self) -> TaskmillResult<()> {
        for (field, value) in [
            ("table", &self.table),
            ("column", &self.column),
            ("index.name", &self.index.name),
        ] {
            validate_identifier(field, value)?;
        }
        Ok(())
    }
}

fn validate_identifier(field: &str, value: &str) -> TaskmillResult<()> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be a plain identifier (letters, digits, underscores)".to_string(),
        }
        .into());
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
