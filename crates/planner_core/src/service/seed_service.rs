//! Seed loader for first-run sample data.
//!
//! # Responsibility
//! - Decide, once at store open, whether persisted state needs bootstrapping.
//! - Provide the built-in sample dataset relative to "today".
//!
//! # Invariants
//! - Seeding happens only when the subjects OR the tasks collection loaded
//!   empty, and replaces both collections together.
//! - After seeding both counters sit one past the highest seeded id.
//! - Deleting everything later in the same session never re-triggers seeding;
//!   the decision is made only inside `PlannerStore::open`.

use crate::model::subject::{compare_subject_names, Subject, SubjectColor};
use crate::model::task::{Task, TaskPriority};
use crate::repo::id_allocator::IdAllocator;
use crate::repo::planner_store::StoreState;
use chrono::{Days, NaiveDate};
use log::info;

/// Whether the seed loader replaced the loaded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded,
    Skipped,
}

/// Returns `true` when the loaded state should be replaced by sample data.
pub fn needs_seed(state: &StoreState) -> bool {
    state.subjects.is_empty() || state.tasks.is_empty()
}

/// Replaces `state` with the sample dataset when it needs bootstrapping.
pub fn seed_if_needed(state: &mut StoreState, today: NaiveDate) -> SeedOutcome {
    if !needs_seed(state) {
        info!(
            "event=seed module=service status=skip subjects={} tasks={}",
            state.subjects.len(),
            state.tasks.len()
        );
        return SeedOutcome::Skipped;
    }

    *state = sample_state(today);
    info!(
        "event=seed module=service status=ok subjects={} tasks={}",
        state.subjects.len(),
        state.tasks.len()
    );
    SeedOutcome::Seeded
}

/// Builds the built-in sample dataset: three subjects and three tasks due
/// yesterday, today, and tomorrow.
pub fn sample_state(today: NaiveDate) -> StoreState {
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);

    let mut subjects = vec![
        Subject {
            id: 1,
            name: "Mathematics".to_string(),
            teacher: Some("Dr. Silva".to_string()),
            color: SubjectColor::Blue,
        },
        Subject {
            id: 2,
            name: "History".to_string(),
            teacher: Some("Prof. Costa".to_string()),
            color: SubjectColor::Yellow,
        },
        Subject {
            id: 3,
            name: "Physics".to_string(),
            teacher: Some("Dr. Lima".to_string()),
            color: SubjectColor::Purple,
        },
    ];
    subjects.sort_by(|left, right| compare_subject_names(&left.name, &right.name));

    let tasks = vec![
        Task {
            id: 1,
            title: "Algebra exercise list".to_string(),
            description: Some("Chapter 4, problems 1-20".to_string()),
            subject_id: Some(1),
            due_date: yesterday,
            priority: TaskPriority::High,
            completed: false,
            created_at: yesterday,
        },
        Task {
            id: 2,
            title: "Industrial Revolution essay".to_string(),
            description: Some("Two pages on causes and consequences".to_string()),
            subject_id: Some(2),
            due_date: today,
            priority: TaskPriority::Medium,
            completed: false,
            created_at: yesterday,
        },
        Task {
            id: 3,
            title: "Pendulum lab report".to_string(),
            description: None,
            subject_id: Some(3),
            due_date: tomorrow,
            priority: TaskPriority::Low,
            completed: false,
            created_at: today,
        },
    ];

    let max_subject = subjects.iter().map(|s| s.id).max().unwrap_or(0);
    let max_task = tasks.iter().map(|t| t.id).max().unwrap_or(0);
    let ids = IdAllocator::from_counters(max_subject + 1, max_task + 1);

    StoreState {
        subjects,
        tasks,
        ids,
    }
}
