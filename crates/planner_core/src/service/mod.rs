//! Startup services that run around the entity store.
//!
//! # Responsibility
//! - Bootstrap an empty medium with sample data exactly once per open.

pub mod seed_service;
