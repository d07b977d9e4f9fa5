//! Batched bulk loading of generated records.
//!
//! The committer owns each batch for its whole lifecycle: materialize from
//! the generator, stage, commit, drop. Commit scope is per batch, so a
//! failure in batch k leaves batches 1..k-1 durable, rolls back only the
//! in-flight batch, and abandons the rest. There is no retry and no resume;
//! the failure is recorded and the run halts.

use taskmill_core::{LoadPlan, NewTodo, StoreError, TaskmillResult};
use taskmill_store::{SessionFactory, StoreSession};

use crate::generator::RecordGenerator;

/// Progress snapshot emitted after each committed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub committed: u64,
    pub total: u64,
    pub percent: f64,
}

/// Outcome of a bulk load run.
///
/// `committed` counts durably persisted records even when the run was cut
/// short; a halting commit failure lands in `errors`.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub committed: u64,
    pub batches_committed: u64,
    pub errors: Vec<StoreError>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Drives the generator and persists records in bounded transactional
/// batches through one store session.
pub struct BatchCommitter<F: SessionFactory> {
    factory: F,
}

impl<F: SessionFactory> BatchCommitter<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Run the plan to completion or first failure.
    ///
    /// Resolves the owner up front and fails with `UserNotFound` before any
    /// write if the owner is missing. `on_progress` fires once per committed
    /// batch with strictly increasing counts.
    pub fn run(
        &self,
        plan: &LoadPlan,
        generator: &mut RecordGenerator,
        on_progress: &mut dyn FnMut(&Progress),
    ) -> TaskmillResult<RunResult> {
        plan.validate()?;

        let mut session = self.factory.open_session()?;
        let user = session
            .find_user_by_username(&plan.owner_key)?
            .ok_or_else(|| StoreError::UserNotFound {
                username: plan.owner_key.clone(),
            })?;

        tracing::info!(
            owner = %plan.owner_key,
            total = plan.total,
            batch_size = plan.batch_size,
            batches = plan.batch_count(),
            "starting bulk load"
        );

        let mut result = RunResult::default();
        let mut remaining = plan.total;

        while remaining > 0 {
            let size = remaining.min(plan.batch_size);
            let batch: Vec<NewTodo> = (0..size).map(|_| generator.generate()).collect();

            let staged = session.add_todos(user.user_id, &batch);
            let outcome = match staged {
                Ok(()) => session.commit(),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    result.committed += size;
                    result.batches_committed += 1;
                    remaining -= size;

                    let progress = Progress {
                        committed: result.committed,
                        total: plan.total,
                        percent: (result.committed as f64 / plan.total as f64) * 100.0,
                    };
                    tracing::info!(
                        committed = progress.committed,
                        total = progress.total,
                        percent = progress.percent,
                        "batch committed"
                    );
                    on_progress(&progress);
                }
                Err(err) => {
                    // Roll back only the in-flight batch; prior batches stay
                    // durable and the remaining ones are abandoned.
                    if let Err(rollback_err) = session.rollback() {
                        tracing::warn!(error = %rollback_err, "rollback after failed commit also failed");
                    }
                    tracing::warn!(
                        error = %err,
                        committed = result.committed,
                        "bulk load halted on commit failure"
                    );
                    result.errors.push(err);
                    break;
                }
            }
        }

        Ok(result)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use taskmill_core::TaskmillError;
    use taskmill_store::MockStore;

    fn plan(owner: &str, total: u64, batch_size: u64) -> LoadPlan {
        LoadPlan {
            owner_key: owner.to_string(),
            total,
            batch_size,
        }
    }

    fn preload(store: &MockStore, owner: &str, count: u64) {
        store.insert_user(owner);
        let committer = BatchCommitter::new(store.clone());
        let mut generator = RecordGenerator::with_seed(999);
        committer
            .run(&plan(owner, count, count), &mut generator, &mut |_| {})
            .unwrap();
    }

    #[test]
    fn test_full_run_commits_exactly_n() {
        let store = MockStore::new();
        store.insert_user("alice");

        let committer = BatchCommitter::new(store.clone());
        let mut generator = RecordGenerator::with_seed(1);
        let result = committer
            .run(&plan("alice", 25, 10), &mut generator, &mut |_| {})
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.committed, 25);
        assert_eq!(result.batches_committed, 3);
        assert_eq!(store.todo_count(), 25);
    }

    #[test]
    fn test_progress_sequence_with_preexisting_records() {
        // Owner alice already has 5 records; a 100-record load in batches of
        // 20 reports progress at 20/40/60/80/100 and ends at 105 total.
        let store = MockStore::new();
        preload(&store, "alice", 5);

        let committer = BatchCommitter::new(store.clone());
        let mut generator = RecordGenerator::with_seed(2);
        let mut seen: Vec<Progress> = Vec::new();
        let result = committer
            .run(&plan("alice", 100, 20), &mut generator, &mut |p| {
                seen.push(p.clone())
            })
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.batches_committed, 5);
        let committed: Vec<u64> = seen.iter().map(|p| p.committed).collect();
        assert_eq!(committed, vec![20, 40, 60, 80, 100]);
        let percents: Vec<f64> = seen.iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![20.0, 40.0, 60.0, 80.0, 100.0]);
        assert!(seen.windows(2).all(|w| w[0].committed < w[1].committed));
        assert_eq!(store.todo_count(), 105);
    }

    #[test]
    fn test_missing_owner_writes_nothing() {
        let store = MockStore::new();

        let committer = BatchCommitter::new(store.clone());
        let mut generator = RecordGenerator::with_seed(3);
        let result = committer.run(&plan("ghost", 100, 20), &mut generator, &mut |_| {});

        assert!(matches!(
            result,
            Err(TaskmillError::Store(StoreError::UserNotFound { .. }))
        ));
        assert_eq!(store.todo_count(), 0);
    }

    #[test]
    fn test_commit_failure_halts_and_keeps_prior_batches() {
        // Batch 3 of 10 fails: exactly 20 records stay committed, the
        // failure is surfaced, nothing after batch 3 runs.
        let store = MockStore::new();
        store.insert_user("alice");
        store.fail_commit_on(3);

        let committer = BatchCommitter::new(store.clone());
        let mut generator = RecordGenerator::with_seed(4);
        let mut seen: Vec<u64> = Vec::new();
        let result = committer
            .run(&plan("alice", 100, 10), &mut generator, &mut |p| {
                seen.push(p.committed)
            })
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(result.committed, 20);
        assert_eq!(result.batches_committed, 2);
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0],
            StoreError::TransactionFailed { .. }
        ));
        assert_eq!(seen, vec![10, 20]);
        assert_eq!(store.todo_count(), 20);
    }

    #[test]
    fn test_invalid_plan_rejected_before_any_store_access() {
        let store = MockStore::new();
        store.insert_user("alice");

        let committer = BatchCommitter::new(store.clone());
        let mut generator = RecordGenerator::with_seed(5);
        let result = committer.run(&plan("alice", 10, 0), &mut generator, &mut |_| {});

        assert!(matches!(result, Err(TaskmillError::Config(_))));
        assert_eq!(store.todo_count(), 0);
    }
}
