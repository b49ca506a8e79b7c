//! Repository layer: identifier allocation and the entity store.
//!
//! # Responsibility
//! - Own all subject/task state and be its only mutator.
//! - Persist through the `KvStore` adapter after every successful mutation.
//!
//! # Invariants
//! - Validation runs before any mutation; rejected calls change nothing.
//! - Unknown-id updates and deletes are no-ops, not errors.

pub mod id_allocator;
pub mod planner_store;
