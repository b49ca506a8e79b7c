//! Subject domain model.
//!
//! # Responsibility
//! - Define the Subject record and its display color palette.
//! - Validate creation requests and apply post-creation patches.
//!
//! # Invariants
//! - `id` is issued once by the store and never changes.
//! - `name` is non-empty after trimming.

use crate::model::validation::{
    normalize_optional_text, normalize_required_text, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Store-issued subject identifier.
pub type SubjectId = i64;

/// Display color attached to a subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectColor {
    #[default]
    Indigo,
    Blue,
    Green,
    Yellow,
    Red,
    Purple,
    Gray,
}

impl SubjectColor {
    /// Every palette entry in presentation order.
    pub const ALL: [SubjectColor; 7] = [
        Self::Indigo,
        Self::Blue,
        Self::Green,
        Self::Yellow,
        Self::Red,
        Self::Purple,
        Self::Gray,
    ];

    /// Stable lowercase name, identical to the persisted form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indigo => "indigo",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Purple => "purple",
            Self::Gray => "gray",
        }
    }

    /// Parses a color name case-insensitively. Accepts `grey` for `gray`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "indigo" => Some(Self::Indigo),
            "blue" => Some(Self::Blue),
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "red" => Some(Self::Red),
            "purple" => Some(Self::Purple),
            "gray" | "grey" => Some(Self::Gray),
            _ => None,
        }
    }

    /// Base hex color used by charts and subject badges.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Indigo => "#6366f1",
            Self::Blue => "#3b82f6",
            Self::Green => "#22c55e",
            Self::Yellow => "#eab308",
            Self::Red => "#ef4444",
            Self::Purple => "#a855f7",
            Self::Gray => "#6b7280",
        }
    }
}

/// Canonical subject record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub color: SubjectColor,
}

impl Subject {
    /// Validates a record loaded from storage or built by a patch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptySubjectName);
        }
        Ok(())
    }
}

/// Creation request for `PlannerStore::add_subject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubject {
    pub name: String,
    pub teacher: Option<String>,
    pub color: SubjectColor,
}

impl NewSubject {
    pub fn new(name: impl Into<String>, color: SubjectColor) -> Self {
        Self {
            name: name.into(),
            teacher: None,
            color,
        }
    }

    pub fn with_teacher(mut self, teacher: impl Into<String>) -> Self {
        self.teacher = Some(teacher.into());
        self
    }

    /// Builds the record for an already-issued id.
    ///
    /// Callers validate first (`validated_name`) so a rejected request never
    /// consumes an id.
    pub(crate) fn into_subject(self, id: SubjectId, name: String) -> Subject {
        Subject {
            id,
            name,
            teacher: normalize_optional_text(self.teacher),
            color: self.color,
        }
    }

    /// Returns the trimmed name or a validation error.
    pub(crate) fn validated_name(&self) -> Result<String, ValidationError> {
        normalize_required_text(&self.name).ok_or(ValidationError::EmptySubjectName)
    }
}

/// Post-creation changes for one subject.
///
/// `None` leaves a field untouched. `teacher: Some(None)` clears the teacher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub teacher: Option<Option<String>>,
    pub color: Option<SubjectColor>,
}

impl SubjectPatch {
    /// Returns the patched copy of `current`, or the first validation error.
    pub fn apply(&self, current: &Subject) -> Result<Subject, ValidationError> {
        let mut next = current.clone();
        if let Some(name) = self.name.as_deref() {
            next.name = normalize_required_text(name).ok_or(ValidationError::EmptySubjectName)?;
        }
        if let Some(teacher) = self.teacher.clone() {
            next.teacher = normalize_optional_text(teacher);
        }
        if let Some(color) = self.color {
            next.color = color;
        }
        next.validate()?;
        Ok(next)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.teacher.is_none() && self.color.is_none()
    }
}

/// Orders subject names the way a user-facing list expects.
///
/// Names compare with accents and case folded away, so "Álgebra" sorts
/// next to "Algebra" rather than after "Zoologia". Ties fall back to the
/// lowercase text and then the exact text, which keeps the order total.
pub fn compare_subject_names(left: &str, right: &str) -> Ordering {
    fold_for_sorting(left)
        .cmp(&fold_for_sorting(right))
        .then_with(|| left.to_lowercase().cmp(&right.to_lowercase()))
        .then_with(|| left.cmp(right))
}

fn fold_for_sorting(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
