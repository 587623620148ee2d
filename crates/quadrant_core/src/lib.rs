//! Core domain logic for Quadrant.
//! This crate is the single source of truth for task and habit invariants.

pub mod classify;
pub mod config;
pub mod db;
pub mod gesture;
pub mod kv;
pub mod logging;
pub mod model;
pub mod service;

pub use classify::{
    Classifier, ClassifierError, ClassifierFailure, ClassifierReply, ClassificationQueue,
    HttpClassifier, HttpClassifierConfig, InlineQueue, ThreadedQueue,
};
pub use config::{ConfigError, CoreConfig};
pub use kv::{KvError, KvStore, MemoryKvStore, SqliteKvStore};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::habit::{Habit, HabitId};
pub use model::settings::{Language, Settings};
pub use model::task::{
    Category, DurationEstimate, DurationUnit, Task, TaskId, TaskPatch, TaskValidationError,
};
pub use service::clock::{Clock, ManualClock, SystemClock};
pub use service::export::{ExportDocument, ExportError};
pub use service::feedback::{Feedback, FeedbackSink, NoopFeedback, RecordingFeedback};
pub use service::ordering::{display_order, tasks_planned_for};
pub use service::store::{NewTask, RestorePayload, TaskStore, UiCounters};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
