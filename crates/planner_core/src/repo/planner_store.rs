//! Entity repository for subjects and tasks.
//!
//! # Responsibility
//! - Own the Subject and Task collections and the id counters.
//! - Validate every mutation before applying it, then persist all four keys.
//! - Keep subject/task referential integrity across delete cascades.
//!
//! # Invariants
//! - Subjects are sorted by name after every add/update.
//! - Tasks keep insertion order.
//! - A task `subject_id` always names a live subject or is `None`; the
//!   delete cascade clears references inside the same `&mut self` call.
//! - Unknown ids on update/delete/toggle are a silent no-op
//!   (`MutationOutcome::NotFound`), never an error.
//! - A failed durable write does not roll back the in-memory change. The
//!   store reports `RepoError::Persist` and stays dirty until the next
//!   successful write.
//! - Loaded ids and counters that cannot advance are treated as malformed
//!   content and fall back; loading never panics.

use crate::db::kv::{keys, KvStore, MemoryKvStore, StorageError};
use crate::model::date::Clock;
use crate::model::subject::{compare_subject_names, NewSubject, Subject, SubjectId, SubjectPatch};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::model::validation::ValidationError;
use crate::repo::id_allocator::{EntityKind, IdAllocator};
use crate::service::seed_service::{seed_if_needed, SeedOutcome};
use crate::view::PlannerView;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors reported by store mutations.
#[derive(Debug)]
pub enum RepoError {
    /// Input rejected; in-memory and persisted state are unchanged.
    Validation(ValidationError),
    /// The in-memory mutation succeeded but the durable write failed.
    Persist(StorageError),
    /// The id counter for this kind cannot advance; nothing changed.
    IdsExhausted(EntityKind),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "change applied but not saved: {err}"),
            Self::IdsExhausted(kind) => write!(f, "no {} ids left to issue", kind_label(*kind)),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::IdsExhausted(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of an update/delete/toggle call that addressed an entity by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The entity existed and the change was applied.
    Applied,
    /// No entity with that id; nothing changed.
    NotFound,
    /// The caller did not confirm a destructive change; nothing changed.
    Declined,
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Complete persisted planner state, as read from or written to the medium.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub subjects: Vec<Subject>,
    pub tasks: Vec<Task>,
    pub ids: IdAllocator,
}

impl StoreState {
    /// Reads all four keys, falling back to each key's default on a missing
    /// or unreadable value.
    pub fn load(kv: &impl KvStore) -> Self {
        let subjects: Vec<Subject> = read_or_default(kv, keys::SUBJECTS, Vec::new());
        let tasks: Vec<Task> = read_or_default(kv, keys::TASKS, Vec::new());
        let next_subject = read_counter(kv, keys::SUBJECT_ID_COUNTER);
        let next_task = read_counter(kv, keys::TASK_ID_COUNTER);

        let mut state = Self {
            subjects,
            tasks,
            ids: IdAllocator::from_counters(next_subject, next_task),
        };
        state.repair();
        state
    }

    /// Restores in-memory invariants on loaded data.
    ///
    /// Records whose id has no successor are dropped, counters are moved
    /// past the highest stored id, dangling subject references are cleared,
    /// and subjects are re-sorted.
    fn repair(&mut self) {
        let subjects_before = self.subjects.len();
        self.subjects.retain(|s| IdAllocator::has_successor(s.id));
        let tasks_before = self.tasks.len();
        self.tasks.retain(|t| IdAllocator::has_successor(t.id));
        let dropped = (subjects_before - self.subjects.len()) + (tasks_before - self.tasks.len());
        if dropped > 0 {
            warn!("event=kv_read module=repo status=fallback reason=id_out_of_range dropped={dropped}");
        }

        let max_subject = self.subjects.iter().map(|s| s.id).max().unwrap_or(0);
        let max_task = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        if self.ids.ensure_above(EntityKind::Subject, max_subject) == Some(true) {
            warn!("event=kv_read module=repo status=repair key=subjectIdCounter max_id={max_subject}");
        }
        if self.ids.ensure_above(EntityKind::Task, max_task) == Some(true) {
            warn!("event=kv_read module=repo status=repair key=taskIdCounter max_id={max_task}");
        }

        let mut cleared = 0usize;
        for task in &mut self.tasks {
            if let Some(subject_id) = task.subject_id {
                if !self.subjects.iter().any(|s| s.id == subject_id) {
                    task.subject_id = None;
                    cleared += 1;
                }
            }
        }
        if cleared > 0 {
            warn!("event=kv_read module=repo status=repair dangling_refs_cleared={cleared}");
        }

        sort_subjects(&mut self.subjects);
    }

    fn encode(&self) -> Result<Vec<(&'static str, String)>, StorageError> {
        Ok(vec![
            (keys::TASKS, encode_value(keys::TASKS, &self.tasks)?),
            (keys::SUBJECTS, encode_value(keys::SUBJECTS, &self.subjects)?),
            (
                keys::TASK_ID_COUNTER,
                encode_value(keys::TASK_ID_COUNTER, &self.ids.peek(EntityKind::Task))?,
            ),
            (
                keys::SUBJECT_ID_COUNTER,
                encode_value(
                    keys::SUBJECT_ID_COUNTER,
                    &self.ids.peek(EntityKind::Subject),
                )?,
            ),
        ])
    }
}

/// The planner's single mutator of subject/task state.
///
/// Constructed explicitly with `open` and passed by reference to every
/// consumer; there is no process-wide instance.
pub struct PlannerStore<K: KvStore> {
    kv: K,
    clock: Box<dyn Clock>,
    state: StoreState,
    initialized: bool,
    seed_outcome: SeedOutcome,
    seed_write_error: Option<StorageError>,
    dirty: bool,
}

impl<K: KvStore> PlannerStore<K> {
    /// Loads persisted state, seeding sample data when the medium is empty.
    ///
    /// Seeding is decided once here and never again for this store. A
    /// failed seed write leaves the store dirty and is kept for the caller
    /// in `seed_write_error`; the seeded data is still served.
    pub fn open(kv: K, clock: impl Clock + 'static) -> Self {
        let today = clock.today();
        let mut state = StoreState::load(&kv);
        let seed_outcome = seed_if_needed(&mut state, today);

        let mut store = Self {
            kv,
            clock: Box::new(clock),
            state,
            initialized: false,
            seed_outcome,
            seed_write_error: None,
            dirty: false,
        };

        if seed_outcome == SeedOutcome::Seeded {
            if let Err(RepoError::Persist(err)) = store.persist() {
                store.seed_write_error = Some(err);
            }
        }
        store.initialized = true;

        info!(
            "event=store_open module=repo status=ok seeded={} subjects={} tasks={}",
            seed_outcome == SeedOutcome::Seeded,
            store.state.subjects.len(),
            store.state.tasks.len()
        );
        store
    }

    /// Re-reads persisted state without re-running seeding.
    pub fn reload(&mut self) {
        self.state = StoreState::load(&self.kv);
        self.dirty = false;
        debug!(
            "event=store_reload module=repo status=ok subjects={} tasks={}",
            self.state.subjects.len(),
            self.state.tasks.len()
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether startup replaced the persisted collections with sample data.
    pub fn seed_outcome(&self) -> SeedOutcome {
        self.seed_outcome
    }

    /// The durable-write failure from seeding at open, if any.
    pub fn seed_write_error(&self) -> Option<&StorageError> {
        self.seed_write_error.as_ref()
    }

    /// `true` while in-memory state is ahead of the medium after a failed write.
    pub fn has_unpersisted_changes(&self) -> bool {
        self.dirty
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.state.subjects
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn get_subject(&self, id: SubjectId) -> Option<&Subject> {
        self.state.subjects.iter().find(|subject| subject.id == id)
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.state.tasks.iter().find(|task| task.id == id)
    }

    /// Read-only snapshot over both collections for the query layer.
    pub fn view(&self) -> PlannerView<'_> {
        PlannerView::new(&self.state.subjects, &self.state.tasks)
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn into_kv(self) -> K {
        self.kv
    }

    /// Creates a subject and keeps the collection sorted by name.
    ///
    /// # Errors
    /// - `Validation(EmptySubjectName)` for a blank name; no id is consumed.
    /// - `Persist` when the durable write fails after the insert.
    pub fn add_subject(&mut self, request: NewSubject) -> RepoResult<Subject> {
        let name = request.validated_name()?;
        let id = self.allocate(EntityKind::Subject)?;
        let subject = request.into_subject(id, name);

        self.state.subjects.push(subject.clone());
        sort_subjects(&mut self.state.subjects);
        info!("event=subject_add module=repo status=ok subject_id={id}");

        self.persist()?;
        Ok(subject)
    }

    /// Applies a patch to one subject and re-sorts the collection.
    pub fn update_subject(
        &mut self,
        id: SubjectId,
        patch: &SubjectPatch,
    ) -> RepoResult<MutationOutcome> {
        let Some(index) = self.subject_index(id) else {
            debug!("event=subject_update module=repo status=skip reason=not_found subject_id={id}");
            return Ok(MutationOutcome::NotFound);
        };

        let updated = patch.apply(&self.state.subjects[index])?;
        self.state.subjects[index] = updated;
        sort_subjects(&mut self.state.subjects);
        info!("event=subject_update module=repo status=ok subject_id={id}");

        self.persist()?;
        Ok(MutationOutcome::Applied)
    }

    /// Removes a subject and unassigns every task that referenced it.
    ///
    /// `confirmed` is the caller's already-resolved answer to any prompt.
    pub fn delete_subject(&mut self, id: SubjectId, confirmed: bool) -> RepoResult<MutationOutcome> {
        if !confirmed {
            debug!("event=subject_delete module=repo status=skip reason=declined subject_id={id}");
            return Ok(MutationOutcome::Declined);
        }
        let Some(index) = self.subject_index(id) else {
            debug!("event=subject_delete module=repo status=skip reason=not_found subject_id={id}");
            return Ok(MutationOutcome::NotFound);
        };

        self.state.subjects.remove(index);
        let mut unassigned = 0usize;
        for task in &mut self.state.tasks {
            if task.subject_id == Some(id) {
                task.subject_id = None;
                unassigned += 1;
            }
        }
        info!(
            "event=subject_delete module=repo status=ok subject_id={id} tasks_unassigned={unassigned}"
        );

        self.persist()?;
        Ok(MutationOutcome::Applied)
    }

    /// Creates a task stamped with today's date.
    ///
    /// # Errors
    /// - `Validation` for a blank title, a non-canonical or impossible due
    ///   date, or a `subject_id` that is not live. No id is consumed.
    /// - `Persist` when the durable write fails after the insert.
    pub fn add_task(&mut self, request: NewTask) -> RepoResult<Task> {
        let validated = request.validate(|subject_id| self.subject_index(subject_id).is_some())?;
        let id = self.allocate(EntityKind::Task)?;
        let task = request.into_task(id, validated, self.clock.today());

        self.state.tasks.push(task.clone());
        info!(
            "event=task_add module=repo status=ok task_id={id} has_subject={}",
            task.subject_id.is_some()
        );

        self.persist()?;
        Ok(task)
    }

    /// Applies a patch to one task. `id` and `created_at` never change.
    pub fn update_task(&mut self, id: TaskId, patch: &TaskPatch) -> RepoResult<MutationOutcome> {
        let Some(index) = self.task_index(id) else {
            debug!("event=task_update module=repo status=skip reason=not_found task_id={id}");
            return Ok(MutationOutcome::NotFound);
        };

        let subjects = &self.state.subjects;
        let updated = patch.apply(&self.state.tasks[index], |subject_id| {
            subjects.iter().any(|subject| subject.id == subject_id)
        })?;
        self.state.tasks[index] = updated;
        info!("event=task_update module=repo status=ok task_id={id}");

        self.persist()?;
        Ok(MutationOutcome::Applied)
    }

    /// Removes one task when the caller confirmed the deletion.
    pub fn delete_task(&mut self, id: TaskId, confirmed: bool) -> RepoResult<MutationOutcome> {
        if !confirmed {
            debug!("event=task_delete module=repo status=skip reason=declined task_id={id}");
            return Ok(MutationOutcome::Declined);
        }
        let Some(index) = self.task_index(id) else {
            debug!("event=task_delete module=repo status=skip reason=not_found task_id={id}");
            return Ok(MutationOutcome::NotFound);
        };

        self.state.tasks.remove(index);
        info!("event=task_delete module=repo status=ok task_id={id}");

        self.persist()?;
        Ok(MutationOutcome::Applied)
    }

    /// Flips the `completed` flag of one task.
    pub fn toggle_task_completion(&mut self, id: TaskId) -> RepoResult<MutationOutcome> {
        let Some(index) = self.task_index(id) else {
            debug!("event=task_toggle module=repo status=skip reason=not_found task_id={id}");
            return Ok(MutationOutcome::NotFound);
        };

        let task = &mut self.state.tasks[index];
        task.completed = !task.completed;
        info!(
            "event=task_toggle module=repo status=ok task_id={id} completed={}",
            task.completed
        );

        self.persist()?;
        Ok(MutationOutcome::Applied)
    }

    fn allocate(&mut self, kind: EntityKind) -> RepoResult<i64> {
        self.state.ids.next(kind).ok_or_else(|| {
            error!("event=id_allocate module=repo status=error kind={}", kind_label(kind));
            RepoError::IdsExhausted(kind)
        })
    }

    fn subject_index(&self, id: SubjectId) -> Option<usize> {
        self.state.subjects.iter().position(|subject| subject.id == id)
    }

    fn task_index(&self, id: TaskId) -> Option<usize> {
        self.state.tasks.iter().position(|task| task.id == id)
    }

    /// Writes all four keys. On failure the in-memory state is kept and the
    /// store is marked dirty.
    fn persist(&mut self) -> RepoResult<()> {
        let kv = &mut self.kv;
        let result = self
            .state
            .encode()
            .and_then(|entries| kv.write_all(&entries));

        match result {
            Ok(()) => {
                if self.dirty {
                    info!("event=persist module=repo status=ok recovered=true");
                }
                self.dirty = false;
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                error!("event=persist module=repo status=error error={err}");
                Err(RepoError::Persist(err))
            }
        }
    }
}

impl PlannerStore<MemoryKvStore> {
    /// Makes every following durable write fail (or succeed again).
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.kv.set_fail_writes(fail);
    }
}

fn kind_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Subject => "subject",
        EntityKind::Task => "task",
    }
}

fn sort_subjects(subjects: &mut [Subject]) {
    subjects.sort_by(|left, right| compare_subject_names(&left.name, &right.name));
}

fn read_or_default<T: DeserializeOwned>(kv: &impl KvStore, key: &'static str, default: T) -> T {
    match kv.read(key) {
        Ok(Some(text)) => match serde_json::from_str::<T>(&text) {
            Ok(value) => value,
            Err(err) => {
                warn!("event=kv_read module=repo status=fallback key={key} reason=malformed error={err}");
                default
            }
        },
        Ok(None) => {
            debug!("event=kv_read module=repo status=fallback key={key} reason=missing");
            default
        }
        Err(err) => {
            warn!("event=kv_read module=repo status=fallback key={key} reason=read_failed error={err}");
            default
        }
    }
}

/// Reads an id counter. A counter that could never issue an id is malformed.
fn read_counter(kv: &impl KvStore, key: &'static str) -> i64 {
    let value = read_or_default(kv, key, IdAllocator::FIRST_ID);
    if IdAllocator::has_successor(value) {
        return value;
    }
    warn!("event=kv_read module=repo status=fallback key={key} reason=counter_exhausted");
    IdAllocator::FIRST_ID
}

fn encode_value<T: serde::Serialize + ?Sized>(
    key: &'static str,
    value: &T,
) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|err| StorageError::Serialize {
        key,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{MutationOutcome, StoreState};
    use crate::db::kv::{keys, MemoryKvStore};
    use crate::repo::id_allocator::EntityKind;

    #[test]
    fn load_from_empty_medium_uses_defaults() {
        let state = StoreState::load(&MemoryKvStore::new());
        assert!(state.subjects.is_empty());
        assert!(state.tasks.is_empty());
        assert_eq!(state.ids.peek(EntityKind::Subject), 1);
        assert_eq!(state.ids.peek(EntityKind::Task), 1);
    }

    #[test]
    fn malformed_key_falls_back_without_touching_others() {
        let kv = MemoryKvStore::with_entries([
            (keys::SUBJECTS, r#"[{"id":4,"name":"Art","color":"red"}]"#),
            (keys::TASKS, "{not json"),
            (keys::SUBJECT_ID_COUNTER, "5"),
            (keys::TASK_ID_COUNTER, "\"seven\""),
        ]);
        let state = StoreState::load(&kv);
        assert_eq!(state.subjects.len(), 1);
        assert!(state.tasks.is_empty());
        assert_eq!(state.ids.peek(EntityKind::Subject), 5);
        assert_eq!(state.ids.peek(EntityKind::Task), 1);
    }

    #[test]
    fn load_repairs_lagging_counters_and_dangling_refs() {
        let kv = MemoryKvStore::with_entries([
            (keys::SUBJECTS, r#"[{"id":2,"name":"Zoology"},{"id":1,"name":"art"}]"#),
            (
                keys::TASKS,
                r#"[{"id":9,"title":"Sketch","subjectId":3,"dueDate":"2024-03-10","createdAt":"2024-03-01"}]"#,
            ),
            (keys::SUBJECT_ID_COUNTER, "1"),
        ]);
        let state = StoreState::load(&kv);
        assert_eq!(state.ids.peek(EntityKind::Subject), 3);
        assert_eq!(state.ids.peek(EntityKind::Task), 10);
        assert_eq!(state.tasks[0].subject_id, None);
        assert_eq!(state.subjects[0].name, "art");
    }

    #[test]
    fn out_of_range_ids_and_counters_fall_back() {
        let kv = MemoryKvStore::with_entries([
            (
                keys::SUBJECTS,
                r#"[{"id":9223372036854775807,"name":"Latin"},{"id":2,"name":"Art"}]"#,
            ),
            (
                keys::TASKS,
                r#"[{"id":9223372036854775807,"title":"Huge","dueDate":"2024-03-10","createdAt":"2024-03-01"},{"id":4,"title":"Sketch","subjectId":9223372036854775807,"dueDate":"2024-03-10","createdAt":"2024-03-01"}]"#,
            ),
            (keys::SUBJECT_ID_COUNTER, "9223372036854775807"),
        ]);
        let state = StoreState::load(&kv);
        assert_eq!(state.subjects.len(), 1);
        assert_eq!(state.subjects[0].id, 2);
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks[0].subject_id, None);
        assert_eq!(state.ids.peek(EntityKind::Subject), 3);
        assert_eq!(state.ids.peek(EntityKind::Task), 5);
    }

    #[test]
    fn outcome_is_applied_only_for_applied() {
        assert!(MutationOutcome::Applied.is_applied());
        assert!(!MutationOutcome::NotFound.is_applied());
        assert!(!MutationOutcome::Declined.is_applied());
    }
}
