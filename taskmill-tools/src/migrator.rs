//! Idempotent, check-then-act schema evolution.
//!
//! The migrator consults catalog introspection before issuing any DDL, so
//! re-running a migration that already took effect executes zero statements.
//! It is not safe for concurrent invocation: two racing callers may both
//! pass the existence check, and the loser surfaces the duplicate-column
//! error instead of swallowing it.

use taskmill_core::{ColumnSpec, MigrationError, TaskmillResult};
use taskmill_store::{SchemaEditor, SchemaInspector, SessionFactory, StoreSession};

/// What a migration run actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// False when the column was already present and nothing was executed.
    pub applied: bool,
    /// Number of DDL statements issued (0 or 2).
    pub ddl_statements: u32,
}

/// Ensures a column and its supporting index exist on a table.
pub struct SchemaMigrator<F>
where
    F: SessionFactory,
    F::Session: SchemaEditor,
{
    factory: F,
}

impl<F> SchemaMigrator<F>
where
    F: SessionFactory,
    F::Session: SchemaEditor,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Ensure `spec.column` exists on `spec.table` with its index.
    ///
    /// Present already: zero DDL, success. Otherwise: add the column, create
    /// the unique-over-non-null index as two sequential statements on the
    /// same session, commit, then re-check the catalog. DDL execution and
    /// catalog visibility are not assumed synchronous, so success is only
    /// reported when the column is observably present afterwards.
    pub fn ensure_column(&self, spec: &ColumnSpec) -> TaskmillResult<MigrationReport> {
        spec.validate()?;

        let mut session = self.factory.open_session()?;

        if session.column_exists(&spec.table, &spec.column)? {
            tracing::info!(
                table = %spec.table,
                column = %spec.column,
                "column already present, nothing to do"
            );
            return Ok(MigrationReport {
                applied: false,
                ddl_statements: 0,
            });
        }

        session.add_column(spec)?;
        session.create_unique_index(spec)?;
        session.commit()?;

        if !session.column_exists(&spec.table, &spec.column)? {
            return Err(MigrationError::PostConditionFailed {
                table: spec.table.clone(),
                column: spec.column.clone(),
            }
            .into());
        }

        tracing::info!(
            table = %spec.table,
            column = %spec.column,
            index = %spec.index.name,
            "column and index created"
        );
        Ok(MigrationReport {
            applied: true,
            ddl_statements: 2,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use taskmill_core::{ColumnType, IndexSpec, TaskmillError};
    use taskmill_store::MockStore;

    fn ext_id_spec() -> ColumnSpec {
        ColumnSpec {
            table: "users".to_string(),
            column: "ext_id".to_string(),
            column_type: ColumnType::Text,
            index: IndexSpec {
                name: "idx_users_ext_id".to_string(),
                unique: true,
                only_non_null: true,
            },
        }
    }

    #[test]
    fn test_first_run_applies_two_statements() {
        let store = MockStore::new();
        let migrator = SchemaMigrator::new(store.clone());

        let report = migrator.ensure_column(&ext_id_spec()).unwrap();

        assert!(report.applied);
        assert_eq!(report.ddl_statements, 2);
        assert!(store.has_column("users", "ext_id"));
        assert_eq!(store.ddl_statements(), 2);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let store = MockStore::new();
        let migrator = SchemaMigrator::new(store.clone());

        migrator.ensure_column(&ext_id_spec()).unwrap();
        let second = migrator.ensure_column(&ext_id_spec()).unwrap();

        assert!(!second.applied);
        assert_eq!(second.ddl_statements, 0);
        // No DDL beyond the first run's two statements.
        assert_eq!(store.ddl_statements(), 2);
    }

    #[test]
    fn test_existing_column_short_circuits() {
        let store = MockStore::new();
        let migrator = SchemaMigrator::new(store.clone());

        // username is part of the base schema.
        let mut spec = ext_id_spec();
        spec.column = "username".to_string();
        spec.index.name = "idx_users_username".to_string();

        let report = migrator.ensure_column(&spec).unwrap();
        assert!(!report.applied);
        assert_eq!(report.ddl_statements, 0);
        assert_eq!(store.ddl_statements(), 0);
        assert!(!store.has_index("users", "idx_users_username"));
    }

    #[test]
    fn test_index_failure_surfaces_as_migration_error() {
        let store = MockStore::new();
        store.fail_index_creation();
        let migrator = SchemaMigrator::new(store.clone());

        let result = migrator.ensure_column(&ext_id_spec());
        assert!(matches!(
            result,
            Err(TaskmillError::Migration(MigrationError::Ddl { .. }))
        ));
    }

    #[test]
    fn test_post_condition_failure_when_catalog_lags() {
        let store = MockStore::new();
        store.hide_new_columns();
        let migrator = SchemaMigrator::new(store.clone());

        let result = migrator.ensure_column(&ext_id_spec());
        assert!(matches!(
            result,
            Err(TaskmillError::Migration(
                MigrationError::PostConditionFailed { .. }
            ))
        ));
    }

    #[test]
    fn test_invalid_spec_rejected_before_session_open() {
        let store = MockStore::new();
        let migrator = SchemaMigrator::new(store.clone());

        let mut spec = ext_id_spec();
        spec.column = "ext id".to_string();
        assert!(matches!(
            migrator.ensure_column(&spec),
            Err(TaskmillError::Config(_))
        ));
        assert_eq!(store.ddl_statements(), 0);
    }
}
