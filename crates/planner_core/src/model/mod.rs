//! Domain model for the subject/task planner.
//!
//! # Responsibility
//! - Define the canonical Subject and Task records shared by every view.
//! - Define creation requests and post-creation patches per entity.
//!
//! # Invariants
//! - Identifiers are integers issued by the store and never reused.
//! - Patches only name fields that are mutable after creation; `id` and
//!   `createdAt` cannot be expressed in a patch.
//! - Calendar dates use the canonical `YYYY-MM-DD` text form when persisted.

pub mod date;
pub mod subject;
pub mod task;
pub mod validation;
