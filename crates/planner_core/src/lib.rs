//! Core domain logic for the subject/task planner.
//! This crate is the single source of truth for planner invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use config::{ConfigError, PlannerConfig};
pub use db::kv::{KvStore, MemoryKvStore, SqliteKvStore, StorageError, StorageResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::date::{format_calendar_date, parse_calendar_date, Clock, FixedClock, SystemClock};
pub use model::subject::{NewSubject, Subject, SubjectColor, SubjectId, SubjectPatch};
pub use model::task::{NewTask, Task, TaskId, TaskPatch, TaskPriority};
pub use model::validation::ValidationError;
pub use repo::id_allocator::{EntityKind, IdAllocator};
pub use repo::planner_store::{MutationOutcome, PlannerStore, RepoError, RepoResult, StoreState};
pub use service::seed_service::SeedOutcome;
pub use view::queries::classify_due_status;
pub use view::{CompletionSummary, DueStatus, PlannerView, SubjectProgress};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Opens the SQLite-backed store described by `config`.
///
/// Seeds sample data when the database holds no subjects or no tasks.
pub fn open_store(
    config: &PlannerConfig,
    clock: impl Clock + 'static,
) -> StorageResult<PlannerStore<SqliteKvStore>> {
    let kv = SqliteKvStore::open(&config.db_path)?;
    Ok(PlannerStore::open(kv, clock))
}
