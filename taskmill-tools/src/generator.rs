//! Synthetic to-do generation from a fixed template corpus.
//!
//! The generator is stateless across calls apart from its pseudo-random
//! source, which is injected and seedable so that runs are reproducible in
//! tests. It never touches a process-global rng.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use taskmill_core::{new_todo_id, NewTodo};

/// (title template, description) corpus. A title holds at most one
/// placeholder token; tokens are resolved from the pools below.
const TEMPLATES: &[(&str, &str)] = &[
    // Work tasks
    ("Complete project proposal", "Finish the quarterly project proposal and submit to management"),
    ("Team meeting at {time}", "Attend weekly team standup meeting to discuss progress"),
    ("Review code changes", "Review and approve pending pull requests from team members"),
    ("Update documentation", "Update project documentation with latest changes"),
    ("Client call at {time}", "Schedule and conduct client check-in call"),
    ("Prepare presentation", "Create slides for upcoming stakeholder presentation"),
    ("Bug fix: Issue #{num}", "Investigate and fix reported bug in the system"),
    ("Deploy to production", "Deploy latest changes to production environment"),
    ("Database backup", "Perform scheduled database backup and verification"),
    ("Security audit", "Conduct monthly security audit and update protocols"),
    // Personal tasks
    ("Grocery shopping", "Buy groceries for the week including fruits and vegetables"),
    ("Doctor appointment at {time}", "Annual health checkup with family doctor"),
    ("Gym workout", "Complete 45-minute workout session at the gym"),
    ("Call {person}", "Catch up with family member or friend"),
    ("Pay bills", "Pay monthly utilities and credit card bills"),
    ("Car maintenance", "Schedule oil change and tire rotation"),
    ("Book vacation", "Research and book summer vacation destination"),
    ("Read book: {book}", "Continue reading current book for 30 minutes"),
    ("Meal prep", "Prepare healthy meals for the upcoming week"),
    ("Clean house", "Deep clean living room and kitchen areas"),
    // Learning tasks
    ("Study {subject}", "Spend 1 hour studying new programming language or skill"),
    ("Online course", "Complete next module of online certification course"),
    ("Practice coding", "Solve 3 algorithm problems on coding platform"),
    ("Watch tutorial", "Watch educational video about new technology"),
    ("Write blog post", "Write technical blog post about recent project"),
    ("Learn new tool", "Explore and learn new development tool or framework"),
    ("Attend webinar", "Join industry webinar about latest trends"),
    ("Read documentation", "Study official documentation for new library"),
    ("Code review", "Review open source project code for learning"),
    ("Practice presentation", "Practice public speaking with recorded session"),
    // Health & fitness
    ("Morning run", "30-minute jog around the neighborhood"),
    ("Yoga session", "Complete 20-minute yoga routine for flexibility"),
    ("Drink water", "Ensure drinking 8 glasses of water throughout the day"),
    ("Meditation", "10-minute mindfulness meditation session"),
    ("Stretch break", "Take 5-minute stretch break from desk work"),
    ("Healthy lunch", "Prepare nutritious lunch with vegetables and protein"),
    ("Sleep schedule", "Go to bed by 10 PM for better sleep quality"),
    ("Walk meeting", "Take walking meeting instead of sitting in office"),
    ("Vitamin check", "Take daily vitamins and supplements"),
    ("Posture check", "Monitor and correct sitting posture every hour"),
];

const TIMES: &[&str] = &[
    "9:00 AM", "10:30 AM", "2:00 PM", "3:30 PM", "4:00 PM", "11:00 AM", "1:00 PM",
];
const PEOPLE: &[&str] = &[
    "Mom", "Dad", "Sarah", "John", "Mike", "Lisa", "Tom", "Anna", "David", "Emma",
];
const BOOKS: &[&str] = &[
    "Python Tricks",
    "Clean Code",
    "The Pragmatic Programmer",
    "Design Patterns",
    "Atomic Habits",
];
const SUBJECTS: &[&str] = &[
    "Python",
    "JavaScript",
    "React",
    "SQL",
    "Machine Learning",
    "DevOps",
    "Cloud Computing",
];

/// Issue ids drawn from [ISSUE_MIN, ISSUE_MAX).
const ISSUE_MIN: u32 = 1001;
const ISSUE_MAX: u32 = 9999;

/// Probability that a generated record carries the completed flag.
const COMPLETION_RATE: f64 = 0.30;

/// Creation timestamps are spread uniformly over the trailing 30 days,
/// at minute granularity.
const MAX_AGE_MINUTES: i64 = 30 * 24 * 60;

/// Candidate pool behind a placeholder token.
#[derive(Debug, Clone, Copy)]
enum TokenPool {
    Times,
    People,
    Books,
    Subjects,
    IssueNumber,
}

/// Token resolver table: token name -> candidate pool, applied in one pass
/// over the template.
const TOKEN_RESOLVERS: &[(&str, TokenPool)] = &[
    ("{time}", TokenPool::Times),
    ("{person}", TokenPool::People),
    ("{book}", TokenPool::Books),
    ("{subject}", TokenPool::Subjects),
    ("{num}", TokenPool::IssueNumber),
];

fn draw(pool: TokenPool, rng: &mut StdRng) -> String {
    match pool {
        TokenPool::Times => TIMES[rng.random_range(0..TIMES.len())].to_string(),
        TokenPool::People => PEOPLE[rng.random_range(0..PEOPLE.len())].to_string(),
        TokenPool::Books => BOOKS[rng.random_range(0..BOOKS.len())].to_string(),
        TokenPool::Subjects => SUBJECTS[rng.random_range(0..SUBJECTS.len())].to_string(),
        TokenPool::IssueNumber => rng.random_range(ISSUE_MIN..ISSUE_MAX).to_string(),
    }
}

fn resolve_tokens(template: &str, rng: &mut StdRng) -> String {
    let mut title = template.to_string();
    for (token, pool) in TOKEN_RESOLVERS {
        if title.contains(token) {
            title = title.replace(token, &draw(*pool, rng));
        }
    }
    debug_assert!(
        !title.contains('{'),
        "unresolved placeholder in title: {title}"
    );
    title
}

/// Synthesizes one plausible to-do record per call.
#[derive(Debug)]
pub struct RecordGenerator {
    rng: StdRng,
}

impl RecordGenerator {
    /// Build a generator over an injected pseudo-random source.
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Deterministic generator for reproducible runs and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Generator seeded from OS entropy, for ordinary production runs.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Generate one record: a uniformly drawn template with its placeholder
    /// resolved, a 30%-weighted completion flag, and a creation time within
    /// the trailing 30 days. `updated_at` equals `created_at`.
    pub fn generate(&mut self) -> NewTodo {
        let (template, description) = TEMPLATES[self.rng.random_range(0..TEMPLATES.len())];
        let title = resolve_tokens(template, &mut self.rng);

        let completed = self.rng.random_bool(COMPLETION_RATE);

        let age_minutes = self.rng.random_range(0..MAX_AGE_MINUTES);
        let created_at = Utc::now() - Duration::minutes(age_minutes);

        NewTodo {
            todo_id: new_todo_id(),
            title,
            description: description.to_string(),
            completed,
            created_at,
            updated_at: created_at,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = RecordGenerator::with_seed(42);
        let mut b = RecordGenerator::with_seed(42);

        for _ in 0..100 {
            let (ra, rb) = (a.generate(), b.generate());
            assert_eq!(ra.title, rb.title);
            assert_eq!(ra.description, rb.description);
            assert_eq!(ra.completed, rb.completed);
        }
    }

    #[test]
    fn test_timestamps_within_window() {
        let mut generator = RecordGenerator::with_seed(7);
        let window = Duration::minutes(MAX_AGE_MINUTES) + Duration::minutes(1);

        for _ in 0..500 {
            let record = generator.generate();
            assert!(record.created_at <= record.updated_at);
            let age = Utc::now() - record.created_at;
            assert!(age < window, "record too old: {:?}", age);
            assert!(age >= Duration::zero());
        }
    }

    #[test]
    fn test_all_tokens_resolved() {
        let mut generator = RecordGenerator::with_seed(11);
        for _ in 0..1_000 {
            let record = generator.generate();
            assert!(
                !record.title.contains('{') && !record.title.contains('}'),
                "unresolved token in {:?}",
                record.title
            );
            assert!(!record.title.is_empty());
        }
    }

    #[test]
    fn test_description_comes_from_corpus() {
        let mut generator = RecordGenerator::with_seed(3);
        for _ in 0..200 {
            let record = generator.generate();
            assert!(
                TEMPLATES.iter().any(|(_, d)| *d == record.description),
                "unknown description {:?}",
                record.description
            );
        }
    }

    #[test]
    fn test_completion_rate_near_thirty_percent() {
        let mut generator = RecordGenerator::with_seed(1234);
        let total = 10_000;
        let completed = (0..total)
            .filter(|_| generator.generate().completed)
            .count();

        let rate = completed as f64 / total as f64;
        assert!(
            (rate - COMPLETION_RATE).abs() < 0.02,
            "completion rate {} outside tolerance",
            rate
        );
    }

    #[test]
    fn test_issue_numbers_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1_000 {
            let title = resolve_tokens("Bug fix: Issue #{num}", &mut rng);
            let num: u32 = title
                .strip_prefix("Bug fix: Issue #")
                .unwrap()
                .parse()
                .unwrap();
            assert!((ISSUE_MIN..ISSUE_MAX).contains(&num));
        }
    }
}
