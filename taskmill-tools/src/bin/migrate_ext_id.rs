//! Adds the external-auth identifier column to the users table.
//!
//! Idempotent: re-running against an already-migrated database executes no
//! DDL and still reports success. Non-null `ext_id` values are kept unique
//! by a partial index; any number of rows may hold null.
//!
//! Configuration via environment variables:
//! - `TASKMILL_DB`: database file (default: todos.db)

use taskmill_core::{ColumnSpec, ColumnType, IndexSpec, TaskmillResult};
use taskmill_sqlite::SqliteStore;
use taskmill_tools::SchemaMigrator;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> TaskmillResult<()> {
    let db_path = std::env::var("TASKMILL_DB").unwrap_or_else(|_| "todos.db".to_string());
    let store = SqliteStore::open(&db_path)?;
    store.bootstrap()?;

    let spec = ColumnSpec {
        table: "users".to_string(),
        column: "ext_id".to_string(),
        column_type: ColumnType::Text,
        index: IndexSpec {
            name: "idx_users_ext_id".to_string(),
            unique: true,
            only_non_null: true,
        },
    };

    println!("Ensuring ext_id column on users...");
    let report = SchemaMigrator::new(store).ensure_column(&spec)?;

    if report.applied {
        println!(
            "Added ext_id and idx_users_ext_id ({} DDL statements).",
            report.ddl_statements
        );
        println!("Column verified present after commit.");
    } else {
        println!("ext_id column already exists; nothing to do.");
    }
    Ok(())
}
