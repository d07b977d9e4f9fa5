//! Read-only post-run audit of an owner's records.

use taskmill_core::TaskmillResult;
use taskmill_store::{SessionFactory, StoreSession};

/// Before/after counts and derived statistics for one owner.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerStats {
    pub pre_count: u64,
    pub post_count: u64,
    /// `post_count - pre_count`; may be negative if records were removed
    /// externally between the snapshots.
    pub added: i64,
    pub completed_count: u64,
    pub active_count: u64,
    /// Completed fraction of the post-run total; 0.0 when there are no records.
    pub completion_rate: f64,
}

impl OwnerStats {
    /// Stats for an owner that does not resolve: nothing to count.
    fn unresolved() -> Self {
        Self {
            pre_count: 0,
            post_count: 0,
            added: 0,
            completed_count: 0,
            active_count: 0,
            completion_rate: 0.0,
        }
    }
}

/// Computes an owner's record statistics without writing anything.
///
/// Safe to call at any time, including after a partial or aborted load; it
/// reports whatever was actually committed.
pub struct ConsistencyVerifier<F: SessionFactory> {
    factory: F,
}

impl<F: SessionFactory> ConsistencyVerifier<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Audit the owner's records against a pre-run count.
    ///
    /// An owner that cannot be resolved yields the all-zero stats rather
    /// than an error: there is nothing to count.
    pub fn audit(&self, owner_key: &str, pre_count: u64) -> TaskmillResult<OwnerStats> {
        let mut session = self.factory.open_session()?;

        let Some(user) = session.find_user_by_username(owner_key)? else {
            return Ok(OwnerStats::unresolved());
        };

        let post_count = session.count_todos(user.user_id)?;
        let completed_count = session.count_completed_todos(user.user_id)?;
        let completion_rate = if post_count > 0 {
            completed_count as f64 / post_count as f64
        } else {
            0.0
        };

        Ok(OwnerStats {
            pre_count,
            post_count,
            added: post_count as i64 - pre_count as i64,
            completed_count,
            active_count: post_count - completed_count,
            completion_rate,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskmill_core::{new_todo_id, NewTodo};
    use taskmill_store::MockStore;

    fn commit_todos(store: &MockStore, owner: &str, completed: u64, active: u64) {
        let user = store.insert_user(owner);
        let now = Utc::now();
        let batch: Vec<NewTodo> = (0..completed + active)
            .map(|i| NewTodo {
                todo_id: new_todo_id(),
                title: format!("todo {}", i),
                description: "audit fixture".to_string(),
                completed: i < completed,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let mut session = store.open_session().unwrap();
        session.add_todos(user.user_id, &batch).unwrap();
        session.commit().unwrap();
    }

    #[test]
    fn test_audit_counts_and_rate() {
        let store = MockStore::new();
        commit_todos(&store, "alice", 3, 7);

        let verifier = ConsistencyVerifier::new(store);
        let stats = verifier.audit("alice", 4).unwrap();

        assert_eq!(stats.pre_count, 4);
        assert_eq!(stats.post_count, 10);
        assert_eq!(stats.added, 6);
        assert_eq!(stats.completed_count, 3);
        assert_eq!(stats.active_count, 7);
        assert!((stats.completion_rate - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_audit_empty_owner_has_zero_rate() {
        let store = MockStore::new();
        store.insert_user("alice");

        let verifier = ConsistencyVerifier::new(store);
        let stats = verifier.audit("alice", 0).unwrap();

        assert_eq!(stats.post_count, 0);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn test_audit_unresolvable_owner_is_all_zero() {
        let store = MockStore::new();

        let verifier = ConsistencyVerifier::new(store);
        let stats = verifier.audit("ghost", 42).unwrap();

        assert_eq!(stats.pre_count, 0);
        assert_eq!(stats.post_count, 0);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn test_audit_reflects_external_removal() {
        let store = MockStore::new();
        commit_todos(&store, "alice", 0, 2);

        let verifier = ConsistencyVerifier::new(store);
        let stats = verifier.audit("alice", 5).unwrap();

        assert_eq!(stats.post_count, 2);
        assert_eq!(stats.added, -3);
    }
}
