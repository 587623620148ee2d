//! Domain model for the decision matrix and the habit tracker.
//!
//! # Responsibility
//! - Define canonical task, habit and settings records.
//! - Keep derived values (completion timestamps, streaks) consistent with
//!   the fields they are derived from.
//!
//! # Invariants
//! - `Task::completed == Task::completed_at.is_some()`.
//! - `Habit::streak` is a pure function of `completed_dates` and today.

pub mod habit;
pub mod seed;
pub mod settings;
pub mod task;
