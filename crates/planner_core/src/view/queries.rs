//! Pure query functions over subject/task slices.

use crate::model::subject::{Subject, SubjectId};
use crate::model::task::Task;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Due-date classification relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DueStatus {
    Overdue,
    DueToday,
    Upcoming,
    Completed,
}

impl DueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::DueToday => "due_today",
            Self::Upcoming => "upcoming",
            Self::Completed => "completed",
        }
    }
}

/// Looks up a subject. `None` input and unknown ids both yield `None`.
pub fn subject_by_id(subjects: &[Subject], id: Option<SubjectId>) -> Option<&Subject> {
    let id = id?;
    subjects.iter().find(|subject| subject.id == id)
}

pub fn tasks_by_subject(tasks: &[Task], subject_id: SubjectId) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| task.subject_id == Some(subject_id))
        .collect()
}

pub fn unassigned_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|task| task.subject_id.is_none()).collect()
}

/// Tasks due exactly on `date`.
pub fn tasks_for_date(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks.iter().filter(|task| task.due_date == date).collect()
}

/// Tasks due within `start..=end`. An inverted range yields nothing.
pub fn tasks_due_between(tasks: &[Task], start: NaiveDate, end: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| task.due_date >= start && task.due_date <= end)
        .collect()
}

/// Distinct due dates within `start..=end`, ascending.
pub fn dates_with_tasks(tasks: &[Task], start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    tasks
        .iter()
        .map(|task| task.due_date)
        .filter(|due| *due >= start && *due <= end)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Earliest incomplete task due on or after `as_of`.
///
/// Equal due dates resolve to the lowest id.
pub fn next_upcoming_task(tasks: &[Task], as_of: NaiveDate) -> Option<&Task> {
    tasks
        .iter()
        .filter(|task| !task.completed && task.due_date >= as_of)
        .min_by_key(|task| (task.due_date, task.id))
}

pub fn classify_due_status(task: &Task, as_of: NaiveDate) -> DueStatus {
    if task.completed {
        DueStatus::Completed
    } else if task.due_date < as_of {
        DueStatus::Overdue
    } else if task.due_date == as_of {
        DueStatus::DueToday
    } else {
        DueStatus::Upcoming
    }
}
