//! Dashboard and chart aggregates.

use crate::model::subject::SubjectId;
use crate::model::task::Task;
use crate::view::queries::{classify_due_status, DueStatus};
use chrono::NaiveDate;

/// Counts of tasks per due status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionSummary {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub upcoming: usize,
}

impl CompletionSummary {
    pub fn pending(&self) -> usize {
        self.total - self.completed
    }
}

/// Completed vs. total tasks for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubjectProgress {
    pub total: usize,
    pub completed: usize,
}

impl SubjectProgress {
    /// Whole-number completion percentage, rounded down. `0` with no tasks.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.completed * 100 / self.total) as u32
    }
}

pub fn completion_summary(tasks: &[Task], as_of: NaiveDate) -> CompletionSummary {
    let mut summary = CompletionSummary {
        total: tasks.len(),
        ..CompletionSummary::default()
    };
    for task in tasks {
        match classify_due_status(task, as_of) {
            DueStatus::Completed => summary.completed += 1,
            DueStatus::Overdue => summary.overdue += 1,
            DueStatus::DueToday => summary.due_today += 1,
            DueStatus::Upcoming => summary.upcoming += 1,
        }
    }
    summary
}

pub fn subject_progress(tasks: &[Task], subject_id: SubjectId) -> SubjectProgress {
    tasks
        .iter()
        .filter(|task| task.subject_id == Some(subject_id))
        .fold(SubjectProgress::default(), |mut progress, task| {
            progress.total += 1;
            if task.completed {
                progress.completed += 1;
            }
            progress
        })
}
