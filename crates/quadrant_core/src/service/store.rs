//! Task/habit store.
//!
//! # Responsibility
//! - Own the task and habit collections and every mutation on them.
//! - Persist the affected collection or setting after each mutation.
//! - Dispatch inbox tasks to the classifier queue and apply its results.
//!
//! # Invariants
//! - Domain operations never return errors; storage failures are logged and
//!   the in-memory state stays authoritative.
//! - Unknown ids make mutations a silent no-op.
//! - `completed_at` is only written by `complete_task`.
//! - Every manual task edit bumps the task's revision; a classifier result
//!   whose captured revision no longer matches is discarded.
//! - UI counters only grow.

use chrono::NaiveDate;
use log::{debug, info, warn};
use std::time::Duration;

use crate::classify::{ClassificationQueue, ClassificationRequest, ClassificationResult};
use crate::kv::{self, load_slot, save_slot, slots, KvStore};
use crate::model::habit::{Habit, HabitId};
use crate::model::seed::{seed_habits, seed_tasks};
use crate::model::settings::{Language, Settings};
use crate::model::task::{Category, DurationEstimate, DurationUnit, Task, TaskId, TaskPatch};
use crate::service::clock::{Clock, SystemClock};
use crate::service::feedback::{Feedback, FeedbackSink, NoopFeedback};

/// Input for `TaskStore::add_task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub category: Category,
    pub planned_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub duration: Option<DurationEstimate>,
}

impl NewTask {
    /// Inbox task with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: Category::Inbox,
            planned_date: None,
            description: None,
            duration: None,
        }
    }

    pub fn in_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn planned_on(mut self, date: NaiveDate) -> Self {
        self.planned_date = Some(date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_duration(mut self, duration: DurationEstimate) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Replacement collections for `restore_tasks`; absent parts are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct RestorePayload {
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
    #[serde(default)]
    pub habits: Option<Vec<Habit>>,
}

/// One-shot animation triggers. Consumers react to deltas only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiCounters {
    pub inbox_shake: u64,
    pub add_success: u64,
}

/// Builder wiring collaborators into a `TaskStore`.
pub struct TaskStoreBuilder<K: KvStore> {
    kv: K,
    clock: Box<dyn Clock>,
    feedback: Box<dyn FeedbackSink>,
    queue: Option<Box<dyn ClassificationQueue>>,
}

impl<K: KvStore> TaskStoreBuilder<K> {
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_feedback(mut self, feedback: impl FeedbackSink + 'static) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    pub fn with_classification_queue(mut self, queue: impl ClassificationQueue + 'static) -> Self {
        self.queue = Some(Box::new(queue));
        self
    }

    /// Loads every slot and returns the ready store.
    pub fn build(self) -> TaskStore<K> {
        let today = self.clock.today();
        let mut store = TaskStore {
            kv: self.kv,
            clock: self.clock,
            feedback: self.feedback,
            queue: self.queue,
            tasks: Vec::new(),
            habits: Vec::new(),
            settings: Settings {
                hardcore_mode: false,
                ai_mode: false,
                language: Language::En,
                last_duration_unit: DurationUnit::Minutes,
                selected_date: today,
            },
            counters: UiCounters::default(),
        };
        store.reload();
        store
    }
}

/// Single authoritative owner of tasks, habits and settings.
pub struct TaskStore<K: KvStore> {
    kv: K,
    clock: Box<dyn Clock>,
    feedback: Box<dyn FeedbackSink>,
    queue: Option<Box<dyn ClassificationQueue>>,
    tasks: Vec<Task>,
    habits: Vec<Habit>,
    settings: Settings,
    counters: UiCounters,
}

impl<K: KvStore> TaskStore<K> {
    pub fn builder(kv: K) -> TaskStoreBuilder<K> {
        TaskStoreBuilder {
            kv,
            clock: Box::new(SystemClock),
            feedback: Box::new(NoopFeedback),
            queue: None,
        }
    }

    /// Store with system clock, no feedback and no classifier.
    pub fn open(kv: K) -> Self {
        Self::builder(kv).build()
    }

    // ---- reads ----

    /// Raw collection in canonical (newest-first insertion) order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn counters(&self) -> UiCounters {
        self.counters
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn habit(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    /// Active tasks of `category` in list order.
    pub fn tasks_by_category(&self, category: Category) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.category == category && task.is_active())
            .collect()
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // ---- tasks ----

    /// Creates a task at the front of the list.
    ///
    /// Returns `None` (and changes nothing) when the title is blank.
    pub fn add_task(&mut self, new_task: NewTask) -> Option<TaskId> {
        let title = new_task.title.trim();
        if title.is_empty() {
            warn!("event=task_add module=store status=skip reason=blank_title");
            return None;
        }

        let mut task = Task::new(title, new_task.category, self.clock.now_ms());
        task.description = new_task
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        task.planned_date = new_task.planned_date;
        task.duration = new_task.duration;
        let id = task.id;
        let category = task.category;
        let request = ClassificationRequest {
            task_id: id,
            revision: task.revision,
            title: task.title.clone(),
            description: task.description.clone(),
            keep_duration: task.duration.is_some(),
        };

        self.tasks.insert(0, task);
        self.counters.add_success += 1;
        if category == Category::Inbox {
            self.counters.inbox_shake += 1;
        }
        self.persist_tasks();
        if let Some(duration) = new_task.duration {
            self.set_last_duration_unit(duration.unit);
        }
        info!("event=task_add module=store status=ok task_id={id} category={category}");

        if category == Category::Inbox && self.settings.ai_mode {
            self.dispatch_classification(request);
        }
        Some(id)
    }

    /// Merges present fields into the task; a no-op for unknown ids.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) {
        if patch.is_empty() {
            return;
        }
        let Some(task) = self.task_mut(id) else {
            debug!("event=task_update module=store status=skip task_id={id} reason=not_found");
            return;
        };
        if task.apply_patch(&patch) {
            task.bump_revision();
            self.persist_tasks();
        }
    }

    /// Changes only the category.
    pub fn move_task(&mut self, id: TaskId, category: Category) {
        let Some(task) = self.task_mut(id) else {
            debug!("event=task_move module=store status=skip task_id={id} reason=not_found");
            return;
        };
        task.category = category;
        task.bump_revision();
        self.persist_tasks();
        info!("event=task_move module=store status=ok task_id={id} category={category}");
    }

    /// Moves the task into `category` so that it appears at `target_index`
    /// in `tasks_by_category(category)`.
    ///
    /// The visual index is translated to a splice point in the global list:
    /// before the active task currently at `target_index`, else right after
    /// the last active task of that category, else at the end of the list.
    pub fn reorder_task(&mut self, id: TaskId, category: Category, target_index: usize) {
        let Some(position) = self.position(id) else {
            debug!("event=task_reorder module=store status=skip task_id={id} reason=not_found");
            return;
        };
        let mut task = self.tasks.remove(position);
        task.category = category;
        task.bump_revision();

        let view: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, other)| other.category == category && other.is_active())
            .map(|(index, _)| index)
            .collect();
        let insert_at = match view.get(target_index) {
            Some(&global) => global,
            None => view.last().map_or(self.tasks.len(), |&last| last + 1),
        };

        self.tasks.insert(insert_at, task);
        self.persist_tasks();
        info!(
            "event=task_reorder module=store status=ok task_id={id} category={category} index={target_index}"
        );
    }

    /// Toggles completion. Feedback plays only on the way to done.
    pub fn complete_task(&mut self, id: TaskId) {
        let now = self.clock.now_ms();
        let Some(task) = self.task_mut(id) else {
            debug!("event=task_complete module=store status=skip task_id={id} reason=not_found");
            return;
        };
        let completed = task.toggle_completed(now);
        task.bump_revision();
        let category = task.category;
        self.persist_tasks();

        if completed {
            self.feedback.emit(Feedback::task_completed(category));
        }
        info!("event=task_complete module=store status=ok task_id={id} completed={completed}");
    }

    /// Removes the task. There is no undo.
    pub fn delete_task(&mut self, id: TaskId) {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() != before {
            self.persist_tasks();
            info!("event=task_delete module=store status=ok task_id={id}");
        }
    }

    // ---- habits ----

    pub fn add_habit(
        &mut self,
        title: impl Into<String>,
        color: impl Into<String>,
        frequency: impl Into<String>,
    ) -> Option<HabitId> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            warn!("event=habit_add module=store status=skip reason=blank_title");
            return None;
        }
        let habit = Habit::new(title, color, frequency, self.clock.now_ms());
        let id = habit.id;
        self.habits.push(habit);
        self.counters.add_success += 1;
        self.persist_habits();
        info!("event=habit_add module=store status=ok habit_id={id}");
        Some(id)
    }

    /// Flips `date` in the habit's completed dates and recomputes the streak.
    pub fn toggle_habit(&mut self, id: HabitId, date: NaiveDate) {
        let today = self.clock.today();
        let Some(habit) = self.habits.iter_mut().find(|habit| habit.id == id) else {
            debug!("event=habit_toggle module=store status=skip habit_id={id} reason=not_found");
            return;
        };
        let added = habit.toggle_date(date, today);
        let streak = habit.streak;
        self.persist_habits();

        if added {
            self.feedback.emit(Feedback::habit_checked());
        }
        info!("event=habit_toggle module=store status=ok habit_id={id} added={added} streak={streak}");
    }

    pub fn delete_habit(&mut self, id: HabitId) {
        let before = self.habits.len();
        self.habits.retain(|habit| habit.id != id);
        if self.habits.len() != before {
            self.persist_habits();
            info!("event=habit_delete module=store status=ok habit_id={id}");
        }
    }

    // ---- bulk ----

    /// Empties both the task and the habit collections.
    pub fn clear_all_tasks(&mut self) {
        let task_count = self.tasks.len();
        let habit_count = self.habits.len();
        self.tasks.clear();
        self.habits.clear();
        self.persist_tasks();
        self.persist_habits();
        warn!(
            "event=clear_all module=store status=ok task_count={task_count} habit_count={habit_count}"
        );
    }

    /// Replaces whichever collections the payload carries.
    pub fn restore_tasks(&mut self, payload: RestorePayload) {
        if let Some(tasks) = payload.tasks {
            let count = tasks.len();
            log_inconsistent_tasks(&tasks);
            self.tasks = tasks;
            self.persist_tasks();
            info!("event=restore module=store status=ok collection=tasks count={count}");
        }
        if let Some(mut habits) = payload.habits {
            let today = self.clock.today();
            habits.iter_mut().for_each(|habit| habit.refresh_streak(today));
            let count = habits.len();
            self.habits = habits;
            self.persist_habits();
            info!("event=restore module=store status=ok collection=habits count={count}");
        }
    }

    /// Fatal-fault recovery: wipes every slot and reloads defaults.
    pub fn reset_storage(&mut self) {
        if let Err(err) = kv::wipe_all_slots(&mut self.kv) {
            warn!("event=storage_reset module=store status=error error={err}");
        }
        self.reload();
        warn!("event=storage_reset module=store status=ok");
    }

    // ---- settings ----

    pub fn toggle_hardcore_mode(&mut self) {
        self.settings.hardcore_mode = !self.settings.hardcore_mode;
        save_slot(&mut self.kv, slots::HARDCORE_MODE, &self.settings.hardcore_mode);
    }

    pub fn set_ai_mode(&mut self, enabled: bool) {
        self.settings.ai_mode = enabled;
        save_slot(&mut self.kv, slots::AI_MODE, &enabled);
    }

    /// Session-only; not persisted.
    pub fn set_selected_date(&mut self, date: NaiveDate) {
        self.settings.selected_date = date;
    }

    pub fn set_language(&mut self, language: Language) {
        self.settings.language = language;
        save_slot(&mut self.kv, slots::LANGUAGE, &language);
    }

    pub fn set_last_duration_unit(&mut self, unit: DurationUnit) {
        if self.settings.last_duration_unit == unit {
            return;
        }
        self.settings.last_duration_unit = unit;
        save_slot(&mut self.kv, slots::LAST_DURATION_UNIT, &unit);
    }

    // ---- classification ----

    /// Applies every finished classification. Returns how many changed a task.
    pub fn pump_classifications(&mut self) -> usize {
        let results = match self.queue.as_mut() {
            Some(queue) => queue.drain_completed(),
            None => return 0,
        };
        self.apply_classifications(results)
    }

    /// Like `pump_classifications`, but blocks up to `timeout` for pending
    /// requests first. Returns as soon as nothing is pending, and returns 0
    /// at once when no queue is configured.
    pub fn wait_for_classifications(&mut self, timeout: Duration) -> usize {
        let results = match self.queue.as_mut() {
            Some(queue) => queue.wait_completed(timeout),
            None => return 0,
        };
        self.apply_classifications(results)
    }

    pub fn pending_classifications(&self) -> usize {
        self.queue.as_ref().map_or(0, |queue| queue.pending())
    }

    fn apply_classifications(&mut self, results: Vec<ClassificationResult>) -> usize {
        let mut applied = 0;
        for result in results {
            if self.apply_classification(result) {
                applied += 1;
            }
        }
        if applied > 0 {
            self.persist_tasks();
        }
        applied
    }

    fn apply_classification(&mut self, result: ClassificationResult) -> bool {
        let ClassificationResult { request, reply } = result;
        let task_id = request.task_id;
        if !reply.is_actionable() {
            debug!("event=classify_apply module=store status=skip task_id={task_id} reason=not_actionable");
            return false;
        }
        let Some(task) = self.task_mut(task_id) else {
            debug!("event=classify_apply module=store status=skip task_id={task_id} reason=not_found");
            return false;
        };
        if task.revision != request.revision {
            info!(
                "event=classify_apply module=store status=skip task_id={task_id} reason=stale_revision dispatched={} current={}",
                request.revision, task.revision
            );
            return false;
        }

        task.category = reply.category;
        if !request.keep_duration {
            if let Some(duration) = reply.duration {
                task.duration = Some(duration);
            }
        }
        info!(
            "event=classify_apply module=store status=ok task_id={task_id} category={}",
            reply.category
        );
        true
    }

    fn dispatch_classification(&mut self, request: ClassificationRequest) {
        match self.queue.as_mut() {
            Some(queue) => {
                debug!(
                    "event=classify_dispatch module=store status=ok task_id={}",
                    request.task_id
                );
                queue.submit(request);
            }
            None => debug!(
                "event=classify_dispatch module=store status=skip task_id={} reason=no_classifier",
                request.task_id
            ),
        }
    }

    // ---- internals ----

    fn reload(&mut self) {
        let now = self.clock.now_ms();
        let today = self.clock.today();

        self.tasks = load_slot(&self.kv, slots::TASKS, seed_tasks(now, today));
        log_inconsistent_tasks(&self.tasks);
        self.habits = load_slot(&self.kv, slots::HABITS, seed_habits(now, today));
        for habit in &mut self.habits {
            habit.refresh_streak(today);
        }

        self.settings.hardcore_mode = load_slot(&self.kv, slots::HARDCORE_MODE, false);
        self.settings.ai_mode = load_slot(&self.kv, slots::AI_MODE, false);
        self.settings.language = load_slot(&self.kv, slots::LANGUAGE, Language::En);
        self.settings.last_duration_unit =
            load_slot(&self.kv, slots::LAST_DURATION_UNIT, DurationUnit::Minutes);
        self.settings.selected_date = today;

        info!(
            "event=store_load module=store status=ok task_count={} habit_count={}",
            self.tasks.len(),
            self.habits.len()
        );
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    fn persist_tasks(&mut self) {
        save_slot(&mut self.kv, slots::TASKS, &self.tasks);
    }

    fn persist_habits(&mut self) {
        save_slot(&mut self.kv, slots::HABITS, &self.habits);
    }
}

fn log_inconsistent_tasks(tasks: &[Task]) {
    for task in tasks {
        if let Err(err) = task.validate() {
            warn!(
                "event=task_validate module=store status=error task_id={} error={err}",
                task.id
            );
        }
    }
}
