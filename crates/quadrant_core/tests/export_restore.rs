use chrono::{Duration, NaiveDate};
use quadrant_core::kv::{save_slot, slots};
use quadrant_core::service::export::EXPORT_FORMAT_VERSION;
use quadrant_core::{
    Category, DurationEstimate, ExportDocument, ExportError, Habit, ManualClock, MemoryKvStore,
    NewTask, RestorePayload, SqliteKvStore, Task, TaskStore,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

fn empty_store() -> TaskStore<MemoryKvStore> {
    let mut kv = MemoryKvStore::new();
    save_slot(&mut kv, slots::TASKS, &Vec::<Task>::new());
    save_slot(&mut kv, slots::HABITS, &Vec::<Habit>::new());
    TaskStore::builder(kv)
        .with_clock(ManualClock::at_date(today()))
        .build()
}

#[test]
fn export_then_import_round_trips_tasks_and_habits() {
    let mut source = empty_store();
    let task_id = source
        .add_task(
            NewTask::new("Book flights")
                .in_category(Category::Q2)
                .planned_on(today())
                .with_duration(DurationEstimate::minutes(40)),
        )
        .unwrap();
    source.complete_task(task_id);
    let habit_id = source.add_habit("Push-ups", "orange", "1d").unwrap();
    source.toggle_habit(habit_id, today());

    let json = source.export_json().unwrap();
    let document: ExportDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(document.format_version, EXPORT_FORMAT_VERSION);
    assert_eq!(document.tasks.len(), 1);
    assert_eq!(document.habits.len(), 1);

    let mut target = empty_store();
    target.restore_from_json(&json).unwrap();

    assert_eq!(target.tasks(), source.tasks());
    assert_eq!(target.habits(), source.habits());
}

#[test]
fn bare_task_array_import_keeps_habits() {
    let mut store = empty_store();
    store.add_habit("Water", "blue", "1d").unwrap();
    let tasks = vec![Task::new("Imported", Category::Q4, 42)];

    store
        .restore_from_json(&serde_json::to_string(&tasks).unwrap())
        .unwrap();

    assert_eq!(store.tasks(), tasks.as_slice());
    assert_eq!(store.habits().len(), 1);
}

#[test]
fn restore_with_only_habits_keeps_tasks_and_recomputes_streaks() {
    let mut store = empty_store();
    let task_id = store.add_task(NewTask::new("Stay")).unwrap();

    let mut habit = Habit::new("Read", "green", "1d", 0);
    habit.completed_dates.insert(today());
    habit.completed_dates.insert(today() - Duration::days(1));
    habit.streak = 17;

    store.restore_tasks(RestorePayload {
        tasks: None,
        habits: Some(vec![habit]),
    });

    assert!(store.task(task_id).is_some());
    assert_eq!(store.habits()[0].streak, 2);
}

#[test]
fn invalid_import_leaves_store_untouched() {
    let mut store = empty_store();
    store.add_task(NewTask::new("Original")).unwrap();
    let before = store.tasks().to_vec();

    let err = store.restore_from_json(r#"{"tasks": 5}"#).unwrap_err();
    assert!(matches!(err, ExportError::Json(_)));
    let err = store.restore_from_json("{}").unwrap_err();
    assert!(matches!(err, ExportError::Empty));

    assert_eq!(store.tasks(), before.as_slice());
}

#[test]
fn restored_collections_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quadrant.sqlite3");
    let document = ExportDocument {
        format_version: EXPORT_FORMAT_VERSION,
        exported_at: 7,
        tasks: vec![Task::new("From backup", Category::Q1, 7)],
        habits: Vec::new(),
    };
    let json = serde_json::to_string(&document).unwrap();

    {
        let mut store = TaskStore::open(SqliteKvStore::open(&path).unwrap());
        store.restore_from_json(&json).unwrap();
    }

    let store = TaskStore::open(SqliteKvStore::open(&path).unwrap());
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].title, "From backup");
    assert!(store.habits().is_empty());
}
