//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose use-case-level store operations to Dart via FRB.
//! - Translate ids, dates, categories and durations to and from strings.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Malformed input yields a failure envelope; the store is left untouched.
//! - The store behind a handle is only touched under its mutex.

use chrono::NaiveDate;
use log::{error, info, warn};
use quadrant_core::classify::{ClassificationQueue, HttpClassifier, ThreadedQueue};
use quadrant_core::{
    core_version as core_version_inner, display_order, init_logging as init_logging_inner,
    tasks_planned_for, Category, CoreConfig, DurationEstimate, Feedback, Habit, HabitId,
    KvStore, Language, MemoryKvStore, NewTask, RecordingFeedback, SqliteKvStore, Task,
    TaskId, TaskPatch, TaskStore,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

type DynStore = TaskStore<Box<dyn KvStore>>;

/// Shared handle to one opened store.
#[flutter_rust_bridge::frb(opaque)]
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Mutex<DynStore>>,
    feedback: RecordingFeedback,
    persistent: bool,
}

impl StoreHandle {
    fn lock(&self) -> MutexGuard<'_, DynStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Task projection with string ids and dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// `inbox|q1|q2|q3|q4`.
    pub category: String,
    pub created_at_ms: i64,
    pub completed: bool,
    pub completed_at_ms: Option<i64>,
    /// `YYYY-MM-DD`.
    pub planned_date: Option<String>,
    /// e.g. `45m`.
    pub duration: Option<String>,
}

impl From<&Task> for TaskItem {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category.to_string(),
            created_at_ms: task.created_at,
            completed: task.completed,
            completed_at_ms: task.completed_at,
            planned_date: task.planned_date.map(|date| date.to_string()),
            duration: task.duration.map(|duration| duration.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitItem {
    pub id: String,
    pub title: String,
    pub color: String,
    pub icon: String,
    pub frequency: String,
    pub created_at_ms: i64,
    /// Ascending `YYYY-MM-DD` dates.
    pub completed_dates: Vec<String>,
    pub streak: u32,
}

impl From<&Habit> for HabitItem {
    fn from(habit: &Habit) -> Self {
        Self {
            id: habit.id.to_string(),
            title: habit.title.clone(),
            color: habit.color.clone(),
            icon: habit.icon.clone(),
            frequency: habit.frequency.clone(),
            created_at_ms: habit.created_at,
            completed_dates: habit
                .completed_dates
                .iter()
                .map(|date| date.to_string())
                .collect(),
            streak: habit.streak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsItem {
    pub hardcore_mode: bool,
    pub ai_mode: bool,
    pub language: String,
    pub last_duration_unit: String,
    pub selected_date: String,
}

/// Everything the matrix screen renders in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixSnapshot {
    pub inbox: Vec<TaskItem>,
    pub q1: Vec<TaskItem>,
    pub q2: Vec<TaskItem>,
    pub q3: Vec<TaskItem>,
    pub q4: Vec<TaskItem>,
    /// All tasks in display order (category, then newest first).
    pub all_sorted: Vec<TaskItem>,
    /// Triaged tasks planned for the selected date.
    pub planned_for_selected_date: Vec<TaskItem>,
    pub habits: Vec<HabitItem>,
    pub settings: SettingsItem,
    pub inbox_shake_trigger: u64,
    pub add_success_trigger: u64,
    pub pending_classifications: u32,
    /// `false` when the store fell back to memory.
    pub persistent: bool,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created entity, when any.
    pub id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: None,
            message: message.into(),
        }
    }

    fn created(message: impl Into<String>, id: Uuid) -> Self {
        Self {
            ok: true,
            id: Some(id.to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub json: Option<String>,
    pub message: String,
}

/// Chime/haptic cue for the platform layer to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEvent {
    /// `task_completed|habit_checked`.
    pub kind: String,
    pub category: Option<String>,
    pub chime: String,
    pub haptic: String,
}

impl From<Feedback> for FeedbackEvent {
    fn from(feedback: Feedback) -> Self {
        match feedback {
            Feedback::TaskCompleted {
                category,
                chime,
                haptic,
            } => Self {
                kind: "task_completed".to_string(),
                category: Some(category.to_string()),
                chime: chime.as_str().to_string(),
                haptic: haptic.as_str().to_string(),
            },
            Feedback::HabitChecked { chime, haptic } => Self {
                kind: "habit_checked".to_string(),
                category: None,
                chime: chime.as_str().to_string(),
                haptic: haptic.as_str().to_string(),
            },
        }
    }
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens the slot database and loads the store.
///
/// `db_path` overrides `QUADRANT_DB_PATH`. When the database cannot be
/// opened the store runs from memory for this session.
///
/// # FFI contract
/// - Never fails; check `MatrixSnapshot::persistent` for the fallback.
/// - Starts a classifier worker when a classifier key is configured.
#[flutter_rust_bridge::frb(sync)]
pub fn open_store(db_path: Option<String>) -> StoreHandle {
    let config = CoreConfig::from_env().unwrap_or_else(|err| {
        warn!("event=open_store module=ffi status=error error_code=config error={err}");
        CoreConfig::default()
    });
    let path = db_path
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| config.db_path.clone());

    let (kv, persistent): (Box<dyn KvStore>, bool) = match SqliteKvStore::open(&path) {
        Ok(kv) => (Box::new(kv), true),
        Err(err) => {
            error!(
                "event=open_store module=ffi status=error error_code=db_open path={} error={err}",
                path.display()
            );
            (Box::new(MemoryKvStore::new()), false)
        }
    };

    let feedback = RecordingFeedback::new();
    let mut builder = TaskStore::builder(kv).with_feedback(feedback.clone());
    if let Some(queue) = spawn_classifier(&config) {
        builder = builder.with_classification_queue(queue);
    }
    let store = builder.build();
    info!("event=open_store module=ffi status=ok persistent={persistent}");

    StoreHandle {
        inner: Arc::new(Mutex::new(store)),
        feedback,
        persistent,
    }
}

fn spawn_classifier(config: &CoreConfig) -> Option<impl ClassificationQueue + 'static> {
    let classifier_config = config.classifier.clone()?;
    match HttpClassifier::new(classifier_config) {
        Ok(classifier) => Some(ThreadedQueue::spawn(Arc::new(classifier))),
        Err(err) => {
            warn!("event=open_store module=ffi status=error error_code=classifier_init error={err}");
            None
        }
    }
}

/// Adds a task; `category` defaults to `inbox`.
#[flutter_rust_bridge::frb(sync)]
pub fn add_task(
    store: &StoreHandle,
    title: String,
    category: Option<String>,
    planned_date: Option<String>,
    description: Option<String>,
    duration: Option<String>,
) -> ActionResponse {
    let mut new_task = NewTask::new(title);
    if let Some(raw) = non_blank(category) {
        match parse_category(&raw) {
            Ok(category) => new_task = new_task.in_category(category),
            Err(message) => return ActionResponse::failure(message),
        }
    }
    if let Some(raw) = non_blank(planned_date) {
        match parse_date(&raw) {
            Ok(date) => new_task = new_task.planned_on(date),
            Err(message) => return ActionResponse::failure(message),
        }
    }
    if let Some(raw) = non_blank(description) {
        new_task = new_task.with_description(raw);
    }
    if let Some(raw) = non_blank(duration) {
        match parse_duration(&raw) {
            Ok(duration) => new_task = new_task.with_duration(duration),
            Err(message) => return ActionResponse::failure(message),
        }
    }

    match store.lock().add_task(new_task) {
        Some(id) => ActionResponse::created("Task added.", id),
        None => ActionResponse::failure("title cannot be empty"),
    }
}

/// Edits a task. `None` keeps a field; an empty string clears an optional one.
#[flutter_rust_bridge::frb(sync)]
pub fn update_task(
    store: &StoreHandle,
    id: String,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    planned_date: Option<String>,
    duration: Option<String>,
) -> ActionResponse {
    let id = match parse_task_id(&id) {
        Ok(id) => id,
        Err(message) => return ActionResponse::failure(message),
    };
    match build_patch(title, description, category, planned_date, duration) {
        Ok(patch) => {
            store.lock().update_task(id, patch);
            ActionResponse::success("Task updated.")
        }
        Err(message) => ActionResponse::failure(message),
    }
}

fn build_patch(
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    planned_date: Option<String>,
    duration: Option<String>,
) -> Result<TaskPatch, String> {
    let mut patch = TaskPatch::default();
    if let Some(title) = title {
        let title = title.trim();
        if title.is_empty() {
            return Err("title cannot be empty".to_string());
        }
        patch.title = Some(title.to_string());
    }
    patch.description = description.map(|raw| non_blank(Some(raw)));
    if let Some(raw) = category {
        patch.category = Some(parse_category(&raw)?);
    }
    if let Some(raw) = planned_date {
        patch.planned_date = Some(non_blank(Some(raw)).map(|raw| parse_date(&raw)).transpose()?);
    }
    if let Some(raw) = duration {
        patch.duration = Some(non_blank(Some(raw)).map(|raw| parse_duration(&raw)).transpose()?);
    }
    Ok(patch)
}

#[flutter_rust_bridge::frb(sync)]
pub fn move_task(store: &StoreHandle, id: String, category: String) -> ActionResponse {
    let parsed = parse_task_id(&id).and_then(|id| Ok((id, parse_category(&category)?)));
    match parsed {
        Ok((id, category)) => {
            store.lock().move_task(id, category);
            ActionResponse::success("Task moved.")
        }
        Err(message) => ActionResponse::failure(message),
    }
}

/// Drop target for drag-and-drop: `index` within the active tasks of `category`.
#[flutter_rust_bridge::frb(sync)]
pub fn reorder_task(
    store: &StoreHandle,
    id: String,
    category: String,
    index: u32,
) -> ActionResponse {
    let parsed = parse_task_id(&id).and_then(|id| Ok((id, parse_category(&category)?)));
    match parsed {
        Ok((id, category)) => {
            store.lock().reorder_task(id, category, index as usize);
            ActionResponse::success("Task reordered.")
        }
        Err(message) => ActionResponse::failure(message),
    }
}

/// Toggles completion.
#[flutter_rust_bridge::frb(sync)]
pub fn complete_task(store: &StoreHandle, id: String) -> ActionResponse {
    match parse_task_id(&id) {
        Ok(id) => {
            store.lock().complete_task(id);
            ActionResponse::success("Task toggled.")
        }
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_task(store: &StoreHandle, id: String) -> ActionResponse {
    match parse_task_id(&id) {
        Ok(id) => {
            store.lock().delete_task(id);
            ActionResponse::success("Task deleted.")
        }
        Err(message) => ActionResponse::failure(message),
    }
}

/// Active tasks of one category in list order; empty for unknown categories.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_by_category(store: &StoreHandle, category: String) -> Vec<TaskItem> {
    let Ok(category) = parse_category(&category) else {
        return Vec::new();
    };
    store
        .lock()
        .tasks_by_category(category)
        .into_iter()
        .map(TaskItem::from)
        .collect()
}

#[flutter_rust_bridge::frb(sync)]
pub fn matrix_snapshot(store: &StoreHandle) -> MatrixSnapshot {
    let guard = store.lock();
    let column = |category: Category| -> Vec<TaskItem> {
        guard
            .tasks_by_category(category)
            .into_iter()
            .map(TaskItem::from)
            .collect()
    };
    let settings = guard.settings();
    let counters = guard.counters();

    MatrixSnapshot {
        inbox: column(Category::Inbox),
        q1: column(Category::Q1),
        q2: column(Category::Q2),
        q3: column(Category::Q3),
        q4: column(Category::Q4),
        all_sorted: display_order(guard.tasks())
            .into_iter()
            .map(TaskItem::from)
            .collect(),
        planned_for_selected_date: tasks_planned_for(guard.tasks(), settings.selected_date)
            .into_iter()
            .map(TaskItem::from)
            .collect(),
        habits: guard.habits().iter().map(HabitItem::from).collect(),
        settings: SettingsItem {
            hardcore_mode: settings.hardcore_mode,
            ai_mode: settings.ai_mode,
            language: settings.language.code().to_string(),
            last_duration_unit: settings.last_duration_unit.code().to_string(),
            selected_date: settings.selected_date.to_string(),
        },
        inbox_shake_trigger: counters.inbox_shake,
        add_success_trigger: counters.add_success,
        pending_classifications: u32::try_from(guard.pending_classifications())
            .unwrap_or(u32::MAX),
        persistent: store.persistent,
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_habit(
    store: &StoreHandle,
    title: String,
    color: String,
    frequency: String,
) -> ActionResponse {
    match store.lock().add_habit(title, color, frequency) {
        Some(id) => ActionResponse::created("Habit added.", id),
        None => ActionResponse::failure("title cannot be empty"),
    }
}

/// Checks or unchecks a habit for `date` (`YYYY-MM-DD`).
#[flutter_rust_bridge::frb(sync)]
pub fn toggle_habit(store: &StoreHandle, id: String, date: String) -> ActionResponse {
    let parsed = parse_habit_id(&id).and_then(|id| Ok((id, parse_date(&date)?)));
    match parsed {
        Ok((id, date)) => {
            store.lock().toggle_habit(id, date);
            ActionResponse::success("Habit toggled.")
        }
        Err(message) => ActionResponse::failure(message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_habit(store: &StoreHandle, id: String) -> ActionResponse {
    match parse_habit_id(&id) {
        Ok(id) => {
            store.lock().delete_habit(id);
            ActionResponse::success("Habit deleted.")
        }
        Err(message) => ActionResponse::failure(message),
    }
}

/// Removes every task and habit.
#[flutter_rust_bridge::frb(sync)]
pub fn clear_all_data(store: &StoreHandle) -> ActionResponse {
    store.lock().clear_all_tasks();
    ActionResponse::success("All data cleared.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn export_data(store: &StoreHandle) -> ExportResponse {
    match store.lock().export_json() {
        Ok(json) => ExportResponse {
            ok: true,
            json: Some(json),
            message: "Export ready.".to_string(),
        },
        Err(err) => ExportResponse {
            ok: false,
            json: None,
            message: format!("export_data failed: {err}"),
        },
    }
}

/// Restores tasks and/or habits from an export document or a bare task array.
#[flutter_rust_bridge::frb(sync)]
pub fn import_data(store: &StoreHandle, json: String) -> ActionResponse {
    match store.lock().restore_from_json(&json) {
        Ok(()) => ActionResponse::success("Data imported."),
        Err(err) => ActionResponse::failure(format!("import_data failed: {err}")),
    }
}

/// Returns the new hardcore mode value.
#[flutter_rust_bridge::frb(sync)]
pub fn toggle_hardcore_mode(store: &StoreHandle) -> bool {
    let mut guard = store.lock();
    guard.toggle_hardcore_mode();
    guard.settings().hardcore_mode
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_ai_mode(store: &StoreHandle, enabled: bool) -> ActionResponse {
    store.lock().set_ai_mode(enabled);
    ActionResponse::success(if enabled { "AI mode on." } else { "AI mode off." })
}

/// `language`: `en|zh`.
#[flutter_rust_bridge::frb(sync)]
pub fn set_language(store: &StoreHandle, language: String) -> ActionResponse {
    match Language::from_code(&language) {
        Some(language) => {
            store.lock().set_language(language);
            ActionResponse::success("Language updated.")
        }
        None => ActionResponse::failure(format!("unsupported language `{language}`")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn set_selected_date(store: &StoreHandle, date: String) -> ActionResponse {
    match parse_date(&date) {
        Ok(date) => {
            store.lock().set_selected_date(date);
            ActionResponse::success("Date selected.")
        }
        Err(message) => ActionResponse::failure(message),
    }
}

/// Applies finished classifier replies. Call from the UI tick.
#[flutter_rust_bridge::frb(sync)]
pub fn pump_classifications(store: &StoreHandle) -> u32 {
    let applied = store.lock().pump_classifications();
    u32::try_from(applied).unwrap_or(u32::MAX)
}

/// Cues emitted since the previous call.
#[flutter_rust_bridge::frb(sync)]
pub fn drain_feedback(store: &StoreHandle) -> Vec<FeedbackEvent> {
    store
        .feedback
        .take_events()
        .into_iter()
        .map(FeedbackEvent::from)
        .collect()
}

/// Wipes every slot and reloads defaults after an unrecoverable UI fault.
#[flutter_rust_bridge::frb(sync)]
pub fn recover_from_fatal_fault(store: &StoreHandle) -> ActionResponse {
    store.lock().reset_storage();
    store.feedback.take_events();
    ActionResponse::success("Storage reset to defaults.")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid task id `{raw}`"))
}

fn parse_habit_id(raw: &str) -> Result<HabitId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid habit id `{raw}`"))
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::from_str(raw.trim()).map_err(|err| err.to_string())
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date `{raw}`; expected YYYY-MM-DD"))
}

fn parse_duration(raw: &str) -> Result<DurationEstimate, String> {
    DurationEstimate::from_str(raw.trim()).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp_store() -> (TempDir, String, StoreHandle) {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir
            .path()
            .join("quadrant.sqlite3")
            .to_str()
            .expect("temp path should be valid UTF-8")
            .to_string();
        let store = open_store(Some(path.clone()));
        (dir, path, store)
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir_and_unknown_level() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn fresh_store_is_seeded_and_persistent() {
        let (_dir, _path, store) = open_temp_store();
        let snapshot = matrix_snapshot(&store);
        assert!(snapshot.persistent);
        assert_eq!(snapshot.all_sorted.len(), 5);
        assert_eq!(snapshot.habits.len(), 2);
        assert_eq!(snapshot.settings.language, "en");
        assert_eq!(snapshot.settings.last_duration_unit, "m");
    }

    #[test]
    fn add_task_validates_and_survives_reopen() {
        let (_dir, path, store) = open_temp_store();

        let bad = add_task(&store, "x".into(), Some("q9".into()), None, None, None);
        assert!(!bad.ok);
        let bad = add_task(&store, "x".into(), None, None, None, Some("soon".into()));
        assert!(!bad.ok);
        let blank = add_task(&store, "  ".into(), None, None, None, None);
        assert!(!blank.ok);

        let created = add_task(
            &store,
            "Write report".into(),
            Some("q2".into()),
            Some("2024-05-01".into()),
            Some("draft".into()),
            Some("2h".into()),
        );
        assert!(created.ok, "{}", created.message);
        let id = created.id.expect("created task returns id");

        let reopened = open_store(Some(path));
        let q2 = tasks_by_category(&reopened, "q2".into());
        let item = q2.iter().find(|item| item.id == id).expect("task persisted");
        assert_eq!(item.planned_date.as_deref(), Some("2024-05-01"));
        assert_eq!(item.duration.as_deref(), Some("2h"));
        assert_eq!(matrix_snapshot(&reopened).settings.last_duration_unit, "h");
    }

    #[test]
    fn update_task_clears_optional_fields_with_empty_string() {
        let (_dir, _path, store) = open_temp_store();
        let id = add_task(
            &store,
            "a".into(),
            Some("q1".into()),
            Some("2024-01-02".into()),
            Some("d".into()),
            None,
        )
        .id
        .expect("created");

        let response = update_task(
            &store,
            id.clone(),
            None,
            Some(String::new()),
            None,
            Some(String::new()),
            Some("30m".into()),
        );
        assert!(response.ok, "{}", response.message);

        let item = tasks_by_category(&store, "q1".into())
            .into_iter()
            .find(|item| item.id == id)
            .expect("still in q1");
        assert_eq!(item.description, None);
        assert_eq!(item.planned_date, None);
        assert_eq!(item.duration.as_deref(), Some("30m"));
        assert!(!update_task(&store, id, Some(" ".into()), None, None, None, None).ok);
    }

    #[test]
    fn complete_task_emits_feedback_once() {
        let (_dir, _path, store) = open_temp_store();
        let id = add_task(&store, "a".into(), Some("q1".into()), None, None, None)
            .id
            .expect("created");

        assert!(complete_task(&store, id.clone()).ok);
        let events = drain_feedback(&store);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "task_completed");
        assert_eq!(events[0].haptic, "strong");

        assert!(complete_task(&store, id).ok);
        assert!(drain_feedback(&store).is_empty());
    }

    #[test]
    fn invalid_ids_and_dates_are_rejected() {
        let (_dir, _path, store) = open_temp_store();
        assert!(!complete_task(&store, "nope".into()).ok);
        assert!(!move_task(&store, Uuid::new_v4().to_string(), "q7".into()).ok);
        assert!(!toggle_habit(&store, Uuid::new_v4().to_string(), "2024-13-01".into()).ok);
        assert!(!set_selected_date(&store, "tomorrow".into()).ok);
        assert!(!set_language(&store, "fr".into()).ok);
    }

    #[test]
    fn export_clear_import_round_trip() {
        let (_dir, _path, store) = open_temp_store();
        let export = export_data(&store);
        assert!(export.ok, "{}", export.message);
        let json = export.json.expect("export json");

        assert!(clear_all_data(&store).ok);
        let cleared = matrix_snapshot(&store);
        assert!(cleared.all_sorted.is_empty());
        assert!(cleared.habits.is_empty());

        let imported = import_data(&store, json);
        assert!(imported.ok, "{}", imported.message);
        let restored = matrix_snapshot(&store);
        assert_eq!(restored.all_sorted.len(), 5);
        assert_eq!(restored.habits.len(), 2);

        assert!(!import_data(&store, "{broken".into()).ok);
    }

    #[test]
    fn recover_from_fatal_fault_restores_defaults() {
        let (_dir, _path, store) = open_temp_store();
        assert!(clear_all_data(&store).ok);
        assert!(toggle_hardcore_mode(&store));
        assert!(set_language(&store, "zh".into()).ok);

        assert!(recover_from_fatal_fault(&store).ok);
        let snapshot = matrix_snapshot(&store);
        assert_eq!(snapshot.all_sorted.len(), 5);
        assert!(!snapshot.settings.hardcore_mode);
        assert_eq!(snapshot.settings.language, "en");
    }

    #[test]
    fn unopenable_path_falls_back_to_memory() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().to_str().expect("utf-8").to_string();
        let store = open_store(Some(path));
        assert!(!matrix_snapshot(&store).persistent);
        assert!(add_task(&store, "still works".into(), None, None, None, None).ok);
    }
}
