//! Bulk synthetic to-do loader.
//!
//! Loads N randomly generated to-do records for one owner in bounded
//! transactional batches, printing progress per committed batch, then audits
//! the final state.
//!
//! Configuration via environment variables:
//! - `TASKMILL_DB`: database file (default: todos.db)
//! - `TASKMILL_OWNER` / `TASKMILL_TOTAL` / `TASKMILL_BATCH`: load plan
//! - `TASKMILL_SEED`: fix the generator seed for a reproducible run

use taskmill_core::{LoadPlan, TaskmillResult};
use taskmill_sqlite::SqliteStore;
use taskmill_store::{SessionFactory, StoreSession};
use taskmill_tools::{BatchCommitter, ConsistencyVerifier, RecordGenerator};
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
    let plan = LoadPlan::from_env();
    plan.validate()?;

    let db_path = std::env::var("TASKMILL_DB").unwrap_or_else(|_| "todos.db".to_string());
    let store = SqliteStore::open(&db_path)?;
    store.bootstrap()?;

    // Pre-run snapshot for the audit. A missing owner is left for the
    // committer to reject, before it writes anything.
    let pre_count = {
        let mut session = store.open_session()?;
        match session.find_user_by_username(&plan.owner_key)? {
            Some(user) => {
                println!("Found user: {} ({})", user.username, user.user_id);
                session.count_todos(user.user_id)?
            }
            None => 0,
        }
    };
    println!("Current todos for {}: {}", plan.owner_key, pre_count);
    println!(
        "Generating {} todos in batches of {}...",
        plan.total, plan.batch_size
    );

    let mut generator = match std::env::var("TASKMILL_SEED")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        Some(seed) => RecordGenerator::with_seed(seed),
        None => RecordGenerator::from_entropy(),
    };

    let committer = BatchCommitter::new(store.clone());
    let result = committer.run(&plan, &mut generator, &mut |p| {
        println!(
            "Progress: {}/{} todos ({:.1}%)",
            p.committed, p.total, p.percent
        );
    })?;

    let verifier = ConsistencyVerifier::new(store);
    let stats = verifier.audit(&plan.owner_key, pre_count)?;

    println!();
    if result.is_success() {
        println!("Bulk load complete.");
    } else {
        println!(
            "Bulk load aborted after {} committed batches.",
            result.batches_committed
        );
    }
    println!("Previous count:  {}", stats.pre_count);
    println!("Added:           {}", stats.added);
    println!("Total:           {}", stats.post_count);
    println!("Completed:       {}", stats.completed_count);
    println!("Active:          {}", stats.active_count);
    println!("Completion rate: {:.1}%", stats.completion_rate * 100.0);

    // The run reported what it could; a halted load still exits nonzero.
    if let Some(err) = result.errors.into_iter().next() {
        return Err(err.into());
    }
    Ok(())
}
