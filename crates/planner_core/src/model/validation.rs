//! Validation errors raised before any repository mutation.

use crate::model::subject::SubjectId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected by model validation. Repository state is unchanged when
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Subject `name` is empty after trimming.
    EmptySubjectName,
    /// Task `title` is empty after trimming.
    EmptyTaskTitle,
    /// Date text is not a canonical `YYYY-MM-DD` calendar day.
    InvalidDate(String),
    /// Task references a subject id that is not live.
    UnknownSubject(SubjectId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySubjectName => write!(f, "subject name cannot be empty"),
            Self::EmptyTaskTitle => write!(f, "task title cannot be empty"),
            Self::InvalidDate(value) => {
                write!(f, "invalid date `{value}`; expected YYYY-MM-DD")
            }
            Self::UnknownSubject(id) => write!(f, "subject not found: {id}"),
        }
    }
}

impl Error for ValidationError {}

/// Trims optional free text and maps blank values to `None`.
pub(crate) fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Trims required text, returning `None` when nothing is left.
pub(crate) fn normalize_required_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
