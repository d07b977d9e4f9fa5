//! Taskmill Tools - Maintenance Pipeline
//!
//! The utilities that operate on the record store in bulk: a synthetic
//! record generator, a batched loader, an idempotent schema migrator, and a
//! read-only consistency auditor. Each component takes its store dependency
//! (a session factory) at construction; nothing here holds process-wide
//! state.

pub mod committer;
pub mod generator;
pub mod migrator;
pub mod verifier;

pub use committer::{BatchCommitter, Progress, RunResult};
pub use generator::RecordGenerator;
pub use migrator::{MigrationReport, SchemaMigrator};
pub use verifier::{ConsistencyVerifier, OwnerStats};
