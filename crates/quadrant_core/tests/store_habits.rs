use chrono::{Duration, NaiveDate};
use quadrant_core::kv::{save_slot, slots};
use quadrant_core::{
    Feedback, Habit, ManualClock, MemoryKvStore, RecordingFeedback, SqliteKvStore, Task,
    TaskStore,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

fn empty_kv() -> MemoryKvStore {
    let mut kv = MemoryKvStore::new();
    save_slot(&mut kv, slots::TASKS, &Vec::<Task>::new());
    save_slot(&mut kv, slots::HABITS, &Vec::<Habit>::new());
    kv
}

fn fixture() -> (TaskStore<MemoryKvStore>, RecordingFeedback) {
    let feedback = RecordingFeedback::new();
    let store = TaskStore::builder(empty_kv())
        .with_clock(ManualClock::at_date(today()))
        .with_feedback(feedback.clone())
        .build();
    (store, feedback)
}

#[test]
fn add_habit_starts_empty_with_default_icon() {
    let (mut store, _feedback) = fixture();
    let id = store.add_habit("Meditate", "purple", "1d").unwrap();

    let habit = store.habit(id).unwrap();
    assert_eq!(habit.icon, "check");
    assert_eq!(habit.frequency, "1d");
    assert!(habit.completed_dates.is_empty());
    assert_eq!(habit.streak, 0);
    assert!(store.add_habit(" ", "red", "1d").is_none());
}

#[test]
fn four_consecutive_days_ending_today_make_streak_four() {
    let (mut store, _feedback) = fixture();
    let id = store.add_habit("Run", "red", "1d").unwrap();
    for back in 0..4 {
        store.toggle_habit(id, today() - Duration::days(back));
    }
    assert_eq!(store.habit(id).unwrap().streak, 4);
}

#[test]
fn streak_is_zero_without_today() {
    let (mut store, _feedback) = fixture();
    let id = store.add_habit("Run", "red", "1d").unwrap();
    for back in 1..4 {
        store.toggle_habit(id, today() - Duration::days(back));
    }
    assert_eq!(store.habit(id).unwrap().streak, 0);

    store.toggle_habit(id, today());
    assert_eq!(store.habit(id).unwrap().streak, 4);
}

#[test]
fn double_toggle_restores_previous_state() {
    let (mut store, feedback) = fixture();
    let id = store.add_habit("Floss", "white", "1d").unwrap();
    store.toggle_habit(id, today() - Duration::days(1));
    let before = store.habit(id).unwrap().clone();

    store.toggle_habit(id, today());
    store.toggle_habit(id, today());

    assert_eq!(store.habit(id).unwrap(), &before);
    assert_eq!(
        feedback.events(),
        vec![Feedback::habit_checked(), Feedback::habit_checked()]
    );
}

#[test]
fn delete_habit_removes_it() {
    let (mut store, _feedback) = fixture();
    let id = store.add_habit("Journal", "yellow", "1d").unwrap();
    store.delete_habit(id);
    assert!(store.habit(id).is_none());
    assert!(store.habits().is_empty());
}

#[test]
fn streak_is_recomputed_when_a_new_day_starts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quadrant.sqlite3");
    let clock = ManualClock::at_date(today());
    let id;

    {
        let mut store = TaskStore::builder(SqliteKvStore::open(&path).unwrap())
            .with_clock(clock.clone())
            .build();
        store.clear_all_tasks();
        id = store.add_habit("Stretch", "green", "1d").unwrap();
        store.toggle_habit(id, today() - Duration::days(1));
        store.toggle_habit(id, today());
        assert_eq!(store.habit(id).unwrap().streak, 2);
    }

    clock.advance_ms(Duration::days(2).num_milliseconds());
    let store = TaskStore::builder(SqliteKvStore::open(&path).unwrap())
        .with_clock(clock)
        .build();
    let habit = store.habit(id).unwrap();
    assert_eq!(habit.streak, 0);
    assert_eq!(habit.completed_dates.len(), 2);
}

#[test]
fn seeded_habits_are_present_on_first_launch() {
    let store = TaskStore::builder(MemoryKvStore::new())
        .with_clock(ManualClock::at_date(today()))
        .build();
    let habits = store.habits();
    assert_eq!(habits.len(), 2);
    assert!(habits[0].is_done_on(today() - Duration::days(1)));
    assert_eq!(habits[0].streak, 0);
}
