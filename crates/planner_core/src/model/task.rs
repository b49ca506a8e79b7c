//! Task domain model.
//!
//! # Responsibility
//! - Define the Task record, its priority scale, and creation/patch shapes.
//! - Validate titles, due dates, and subject references before mutation.
//!
//! # Invariants
//! - `id` and `created_at` are fixed at creation; `TaskPatch` cannot name them.
//! - `subject_id`, when set, references a live subject. Only a subject
//!   delete cascade may clear it.

use crate::model::date::{canonical_date, parse_calendar_date};
use crate::model::subject::SubjectId;
use crate::model::validation::{
    normalize_optional_text, normalize_required_text, ValidationError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-issued task identifier.
pub type TaskId = i64;

/// Task urgency. Ordered `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Weak reference; `None` means unassigned.
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(with = "canonical_date")]
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "canonical_date")]
    pub created_at: NaiveDate,
}

impl Task {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTaskTitle);
        }
        Ok(())
    }
}

/// Creation request for `PlannerStore::add_task`.
///
/// `due_date` is raw caller text and must be canonical `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<SubjectId>,
    pub due_date: String,
    pub priority: TaskPriority,
}

impl NewTask {
    pub fn new(title: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            subject_id: None,
            due_date: due_date.into(),
            priority: TaskPriority::default(),
        }
    }

    pub fn with_subject(mut self, subject_id: SubjectId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Validates the request without consuming an id.
    ///
    /// `subject_exists` answers whether a subject id is live in the store.
    pub(crate) fn validate(
        &self,
        subject_exists: impl Fn(SubjectId) -> bool,
    ) -> Result<ValidatedTask, ValidationError> {
        let title =
            normalize_required_text(&self.title).ok_or(ValidationError::EmptyTaskTitle)?;
        let due_date = parse_calendar_date(&self.due_date)?;
        if let Some(subject_id) = self.subject_id {
            if !subject_exists(subject_id) {
                return Err(ValidationError::UnknownSubject(subject_id));
            }
        }
        Ok(ValidatedTask { title, due_date })
    }

    pub(crate) fn into_task(
        self,
        id: TaskId,
        validated: ValidatedTask,
        created_at: NaiveDate,
    ) -> Task {
        Task {
            id,
            title: validated.title,
            description: normalize_optional_text(self.description),
            subject_id: self.subject_id,
            due_date: validated.due_date,
            priority: self.priority,
            completed: false,
            created_at,
        }
    }
}

/// Normalized fields produced by `NewTask::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidatedTask {
    title: String,
    due_date: NaiveDate,
}

/// Post-creation changes for one task.
///
/// `None` leaves a field untouched. Nested `Some(None)` clears an optional
/// field (`description`, `subject_id`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub subject_id: Option<Option<SubjectId>>,
    pub due_date: Option<String>,
    pub priority: Option<TaskPriority>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Returns the patched copy of `current`, or the first validation error.
    pub fn apply(
        &self,
        current: &Task,
        subject_exists: impl Fn(SubjectId) -> bool,
    ) -> Result<Task, ValidationError> {
        let mut next = current.clone();
        if let Some(title) = self.title.as_deref() {
            next.title = normalize_required_text(title).ok_or(ValidationError::EmptyTaskTitle)?;
        }
        if let Some(description) = self.description.clone() {
            next.description = normalize_optional_text(description);
        }
        if let Some(subject_id) = self.subject_id {
            if let Some(id) = subject_id {
                if !subject_exists(id) {
                    return Err(ValidationError::UnknownSubject(id));
                }
            }
            next.subject_id = subject_id;
        }
        if let Some(due_date) = self.due_date.as_deref() {
            next.due_date = parse_calendar_date(due_date)?;
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        if let Some(completed) = self.completed {
            next.completed = completed;
        }
        next.validate()?;
        Ok(next)
    }
}
