//! Identifier allocation per entity kind.
//!
//! # Invariants
//! - `next` never returns a value already issued for the same kind.
//! - Counters start at 1 and only move forward; deletions never rewind them.
//! - Counters never wrap. A counter at `i64::MAX` is exhausted and issues
//!   nothing further.

use serde::{Deserialize, Serialize};

/// Entity kinds with independent id sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Subject,
    Task,
}

/// Monotonic id counters, persisted alongside the collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    next_subject: i64,
    next_task: i64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub const FIRST_ID: i64 = 1;

    pub fn new() -> Self {
        Self {
            next_subject: Self::FIRST_ID,
            next_task: Self::FIRST_ID,
        }
    }

    /// Restores counters from persisted values. Values below 1 are clamped.
    pub fn from_counters(next_subject: i64, next_task: i64) -> Self {
        Self {
            next_subject: next_subject.max(Self::FIRST_ID),
            next_task: next_task.max(Self::FIRST_ID),
        }
    }

    /// Returns the current counter for `kind` and advances it.
    ///
    /// Returns `None` once the counter can no longer advance.
    pub fn next(&mut self, kind: EntityKind) -> Option<i64> {
        let slot = self.slot_mut(kind);
        let issued = *slot;
        *slot = issued.checked_add(1)?;
        Some(issued)
    }

    /// Returns the value the next `next(kind)` call will issue.
    pub fn peek(&self, kind: EntityKind) -> i64 {
        match kind {
            EntityKind::Subject => self.next_subject,
            EntityKind::Task => self.next_task,
        }
    }

    /// Moves the counter past `max_issued` if it lags behind.
    ///
    /// Returns `Some(true)` when the counter was advanced and `None` when
    /// `max_issued` has no successor.
    pub fn ensure_above(&mut self, kind: EntityKind, max_issued: i64) -> Option<bool> {
        let floor = max_issued.checked_add(1)?;
        let slot = self.slot_mut(kind);
        if *slot < floor {
            *slot = floor;
            return Some(true);
        }
        Some(false)
    }

    /// Whether `id` can be stored without exhausting its counter.
    pub fn has_successor(id: i64) -> bool {
        id.checked_add(1).is_some()
    }

    fn slot_mut(&mut self, kind: EntityKind) -> &mut i64 {
        match kind {
            EntityKind::Subject => &mut self.next_subject,
            EntityKind::Task => &mut self.next_task,
        }
    }
}
