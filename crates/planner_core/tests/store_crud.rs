use chrono::NaiveDate;
use planner_core::db::kv::keys;
use planner_core::{
    FixedClock, MemoryKvStore, MutationOutcome, NewSubject, NewTask, PlannerStore, RepoError,
    SubjectColor, SubjectPatch, TaskPatch, TaskPriority, ValidationError,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

fn seeded_store() -> PlannerStore<MemoryKvStore> {
    PlannerStore::open(MemoryKvStore::new(), FixedClock(today()))
}

fn subject_names(store: &PlannerStore<MemoryKvStore>) -> Vec<String> {
    store.subjects().iter().map(|s| s.name.clone()).collect()
}

#[test]
fn add_task_issues_strictly_increasing_unique_ids() {
    let mut store = seeded_store();

    let first = store.add_task(NewTask::new("Read chapter 5", "2024-03-12")).unwrap();
    let second = store.add_task(NewTask::new("Read chapter 6", "2024-03-13")).unwrap();

    assert_eq!(first.id, 4);
    assert_eq!(second.id, 5);
    assert!(second.id > first.id);
    assert!(!first.completed);
    assert_eq!(first.created_at, today());
    assert_eq!(store.tasks().last().unwrap().id, 5);
}

#[test]
fn ids_are_not_reused_after_deletion() {
    let mut store = seeded_store();
    let created = store.add_task(NewTask::new("Temporary", "2024-03-12")).unwrap();
    assert_eq!(
        store.delete_task(created.id, true).unwrap(),
        MutationOutcome::Applied
    );

    let next = store.add_task(NewTask::new("Replacement", "2024-03-12")).unwrap();
    assert_eq!(next.id, created.id + 1);

    let subject = store
        .add_subject(NewSubject::new("Chemistry", SubjectColor::Green))
        .unwrap();
    store.delete_subject(subject.id, true).unwrap();
    let again = store
        .add_subject(NewSubject::new("Chemistry", SubjectColor::Green))
        .unwrap();
    assert_eq!(again.id, subject.id + 1);
}

#[test]
fn add_task_rejects_invalid_input_without_consuming_ids() {
    let mut store = seeded_store();
    let before = store.tasks().to_vec();

    let blank = store.add_task(NewTask::new("   ", "2024-03-12")).unwrap_err();
    assert!(matches!(
        blank,
        RepoError::Validation(ValidationError::EmptyTaskTitle)
    ));

    let bad_date = store.add_task(NewTask::new("Essay", "2024-02-30")).unwrap_err();
    assert!(matches!(
        bad_date,
        RepoError::Validation(ValidationError::InvalidDate(_))
    ));

    let dangling = store
        .add_task(NewTask::new("Essay", "2024-03-12").with_subject(99))
        .unwrap_err();
    assert!(matches!(
        dangling,
        RepoError::Validation(ValidationError::UnknownSubject(99))
    ));

    assert_eq!(store.tasks(), before.as_slice());
    let created = store.add_task(NewTask::new("Essay", "2024-03-12")).unwrap();
    assert_eq!(created.id, 4);
}

#[test]
fn add_task_with_live_subject_keeps_reference() {
    let mut store = seeded_store();
    let task = store
        .add_task(
            NewTask::new("Timeline poster", "2024-03-15")
                .with_subject(2)
                .with_priority(TaskPriority::High)
                .with_description("A3 size"),
        )
        .unwrap();
    assert_eq!(task.subject_id, Some(2));
    assert_eq!(task.priority, TaskPriority::High);
    assert_eq!(task.description.as_deref(), Some("A3 size"));
}

#[test]
fn subjects_stay_sorted_by_name_after_add_and_update() {
    let mut store = seeded_store();
    assert_eq!(subject_names(&store), ["History", "Mathematics", "Physics"]);

    store
        .add_subject(NewSubject::new("Biology", SubjectColor::Green))
        .unwrap();
    store
        .add_subject(NewSubject::new("art", SubjectColor::Red).with_teacher("Ms. Reis"))
        .unwrap();
    assert_eq!(
        subject_names(&store),
        ["art", "Biology", "History", "Mathematics", "Physics"]
    );

    let physics_id = store
        .subjects()
        .iter()
        .find(|s| s.name == "Physics")
        .unwrap()
        .id;
    let patch = SubjectPatch {
        name: Some("Astronomy".to_string()),
        ..SubjectPatch::default()
    };
    assert_eq!(
        store.update_subject(physics_id, &patch).unwrap(),
        MutationOutcome::Applied
    );
    assert_eq!(
        subject_names(&store),
        ["art", "Astronomy", "Biology", "History", "Mathematics"]
    );
    assert_eq!(store.get_subject(physics_id).unwrap().name, "Astronomy");
}

#[test]
fn accented_subject_names_sort_by_base_letter() {
    let mut store = seeded_store();
    for name in ["Ética", "Zoologia", "Álgebra", "Biologia"] {
        store
            .add_subject(NewSubject::new(name, SubjectColor::Indigo))
            .unwrap();
    }

    assert_eq!(
        subject_names(&store),
        [
            "Álgebra",
            "Biologia",
            "Ética",
            "History",
            "Mathematics",
            "Physics",
            "Zoologia",
        ]
    );
}

#[test]
fn add_subject_rejects_blank_name() {
    let mut store = seeded_store();
    let err = store
        .add_subject(NewSubject::new(" ", SubjectColor::Gray))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptySubjectName)
    ));
    assert_eq!(store.subjects().len(), 3);

    let created = store
        .add_subject(NewSubject::new("Music", SubjectColor::Gray))
        .unwrap();
    assert_eq!(created.id, 4);
}

#[test]
fn update_with_invalid_patch_leaves_state_unchanged() {
    let mut store = seeded_store();
    let subjects_before = store.subjects().to_vec();
    let tasks_before = store.tasks().to_vec();

    let blank_name = SubjectPatch {
        name: Some(String::new()),
        color: Some(SubjectColor::Red),
        ..SubjectPatch::default()
    };
    assert!(store.update_subject(1, &blank_name).is_err());

    let bad_task = TaskPatch {
        title: Some("Renamed".to_string()),
        due_date: Some("tomorrow".to_string()),
        ..TaskPatch::default()
    };
    assert!(store.update_task(1, &bad_task).is_err());

    assert_eq!(store.subjects(), subjects_before.as_slice());
    assert_eq!(store.tasks(), tasks_before.as_slice());
}

#[test]
fn unknown_ids_are_silent_no_ops() {
    let mut store = seeded_store();
    let subjects_before = store.subjects().to_vec();
    let tasks_before = store.tasks().to_vec();

    assert_eq!(
        store.update_subject(404, &SubjectPatch::default()).unwrap(),
        MutationOutcome::NotFound
    );
    assert_eq!(
        store.update_task(404, &TaskPatch::default()).unwrap(),
        MutationOutcome::NotFound
    );
    assert_eq!(
        store.toggle_task_completion(404).unwrap(),
        MutationOutcome::NotFound
    );
    assert_eq!(
        store.delete_task(404, true).unwrap(),
        MutationOutcome::NotFound
    );
    assert_eq!(
        store.delete_subject(404, true).unwrap(),
        MutationOutcome::NotFound
    );

    assert_eq!(store.subjects(), subjects_before.as_slice());
    assert_eq!(store.tasks(), tasks_before.as_slice());
}

#[test]
fn confirmed_subject_delete_unassigns_dependent_tasks() {
    let mut store = seeded_store();
    let extra = store
        .add_task(NewTask::new("Geometry proofs", "2024-03-14").with_subject(1))
        .unwrap();
    let untouched_before = store
        .tasks()
        .iter()
        .filter(|t| t.subject_id != Some(1))
        .cloned()
        .collect::<Vec<_>>();

    assert_eq!(
        store.delete_subject(1, true).unwrap(),
        MutationOutcome::Applied
    );

    assert!(store.get_subject(1).is_none());
    assert!(store.tasks().iter().all(|t| t.subject_id != Some(1)));
    assert_eq!(store.get_task(1).unwrap().subject_id, None);
    assert_eq!(store.get_task(extra.id).unwrap().subject_id, None);
    assert_eq!(store.tasks().len(), 4);

    for task in untouched_before {
        assert_eq!(store.get_task(task.id), Some(&task));
    }

    let err = store
        .add_task(NewTask::new("Orphan", "2024-03-14").with_subject(1))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::UnknownSubject(1))
    ));
}

#[test]
fn declined_deletes_leave_memory_and_medium_identical() {
    let mut store = seeded_store();
    let subjects_before = store.subjects().to_vec();
    let tasks_before = store.tasks().to_vec();
    let persisted_before = store.kv().clone();

    assert_eq!(
        store.delete_subject(1, false).unwrap(),
        MutationOutcome::Declined
    );
    assert_eq!(
        store.delete_task(1, false).unwrap(),
        MutationOutcome::Declined
    );

    assert_eq!(store.subjects(), subjects_before.as_slice());
    assert_eq!(store.tasks(), tasks_before.as_slice());
    for key in keys::ALL {
        assert_eq!(store.kv().get(key), persisted_before.get(key));
    }
}

#[test]
fn delete_task_removes_only_target() {
    let mut store = seeded_store();
    assert_eq!(
        store.delete_task(2, true).unwrap(),
        MutationOutcome::Applied
    );
    let ids = store.tasks().iter().map(|t| t.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(store.subjects().len(), 3);
}

#[test]
fn toggle_flips_completion_back_and_forth() {
    let mut store = seeded_store();
    assert!(!store.get_task(3).unwrap().completed);

    store.toggle_task_completion(3).unwrap();
    assert!(store.get_task(3).unwrap().completed);

    store.toggle_task_completion(3).unwrap();
    assert!(!store.get_task(3).unwrap().completed);
}

#[test]
fn update_task_applies_patch_and_keeps_identity() {
    let mut store = seeded_store();
    let original = store.get_task(2).unwrap().clone();

    let patch = TaskPatch {
        title: Some("Revised essay".to_string()),
        description: Some(None),
        subject_id: Some(Some(3)),
        due_date: Some("2024-03-20".to_string()),
        priority: Some(TaskPriority::High),
        completed: Some(true),
    };
    assert_eq!(
        store.update_task(2, &patch).unwrap(),
        MutationOutcome::Applied
    );

    let updated = store.get_task(2).unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.title, "Revised essay");
    assert_eq!(updated.description, None);
    assert_eq!(updated.subject_id, Some(3));
    assert_eq!(updated.due_date, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
    assert_eq!(updated.priority, TaskPriority::High);
    assert!(updated.completed);

    let dangling = TaskPatch {
        subject_id: Some(Some(77)),
        ..TaskPatch::default()
    };
    let err = store.update_task(2, &dangling).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::UnknownSubject(77))
    ));
    assert_eq!(store.get_task(2).unwrap().subject_id, Some(3));
}

#[test]
fn failed_write_keeps_memory_change_and_reports_it() {
    let mut store = seeded_store();
    let persisted_subjects = store.kv().get(keys::SUBJECTS).unwrap().to_string();
    store.set_fail_writes(true);

    let err = store
        .add_subject(NewSubject::new("Geography", SubjectColor::Green))
        .unwrap_err();
    assert!(matches!(err, RepoError::Persist(_)));
    assert!(store.subjects().iter().any(|s| s.name == "Geography"));
    assert!(store.has_unpersisted_changes());
    assert_eq!(store.kv().get(keys::SUBJECTS), Some(persisted_subjects.as_str()));

    store.set_fail_writes(false);
    assert_eq!(
        store.toggle_task_completion(1).unwrap(),
        MutationOutcome::Applied
    );
    assert!(!store.has_unpersisted_changes());
    assert!(store.kv().get(keys::SUBJECTS).unwrap().contains("Geography"));
}
