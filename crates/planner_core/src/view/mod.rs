//! Read-only projections over planner state.
//!
//! # Responsibility
//! - Derive by-date, by-subject, next-upcoming, and due-status views.
//! - Derive dashboard/chart summaries without rendering them.
//!
//! # Invariants
//! - Functions here never mutate state and never touch the persistence medium.
//! - Sequences keep repository order unless a function documents otherwise.

pub mod queries;
pub mod summary;

use crate::model::subject::{Subject, SubjectId};
use crate::model::task::Task;
use chrono::NaiveDate;
pub use queries::DueStatus;
pub use summary::{CompletionSummary, SubjectProgress};

/// Borrowed snapshot of both collections.
#[derive(Debug, Clone, Copy)]
pub struct PlannerView<'a> {
    subjects: &'a [Subject],
    tasks: &'a [Task],
}

impl<'a> PlannerView<'a> {
    pub fn new(subjects: &'a [Subject], tasks: &'a [Task]) -> Self {
        Self { subjects, tasks }
    }

    pub fn subjects(&self) -> &'a [Subject] {
        self.subjects
    }

    pub fn tasks(&self) -> &'a [Task] {
        self.tasks
    }

    pub fn subject_by_id(&self, id: Option<SubjectId>) -> Option<&'a Subject> {
        queries::subject_by_id(self.subjects, id)
    }

    pub fn tasks_by_subject(&self, subject_id: SubjectId) -> Vec<&'a Task> {
        queries::tasks_by_subject(self.tasks, subject_id)
    }

    pub fn unassigned_tasks(&self) -> Vec<&'a Task> {
        queries::unassigned_tasks(self.tasks)
    }

    pub fn tasks_for_date(&self, date: NaiveDate) -> Vec<&'a Task> {
        queries::tasks_for_date(self.tasks, date)
    }

    pub fn tasks_due_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&'a Task> {
        queries::tasks_due_between(self.tasks, start, end)
    }

    pub fn dates_with_tasks(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        queries::dates_with_tasks(self.tasks, start, end)
    }

    pub fn next_upcoming_task(&self, as_of: NaiveDate) -> Option<&'a Task> {
        queries::next_upcoming_task(self.tasks, as_of)
    }

    pub fn completion_summary(&self, as_of: NaiveDate) -> CompletionSummary {
        summary::completion_summary(self.tasks, as_of)
    }

    pub fn subject_progress(&self, subject_id: SubjectId) -> SubjectProgress {
        summary::subject_progress(self.tasks, subject_id)
    }

    /// Progress for every subject, in subject (name) order.
    pub fn progress_by_subject(&self) -> Vec<(&'a Subject, SubjectProgress)> {
        self.subjects
            .iter()
            .map(|subject| (subject, summary::subject_progress(self.tasks, subject.id)))
            .collect()
    }
}
