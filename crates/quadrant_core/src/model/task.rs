//! Task domain model.
//!
//! # Responsibility
//! - Define the matrix task record and its category/duration value types.
//! - Own the completion transition so `completed_at` never drifts.
//!
//! # Invariants
//! - `id` and `created_at` never change after construction.
//! - `completed` is true exactly when `completed_at` is set.
//! - `revision` only grows; it is bumped on every manual edit.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

use chrono::NaiveDate;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,5})\s*(m|mins?|minutes?|h|hrs?|hours?|d|days?)\s*$")
        .expect("valid duration regex")
});

/// Stable identifier for tasks.
pub type TaskId = Uuid;

/// Eisenhower quadrant, or the pre-triage inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Not yet triaged.
    Inbox,
    /// Urgent and important.
    Q1,
    /// Important, not urgent.
    Q2,
    /// Urgent, not important.
    Q3,
    /// Neither urgent nor important.
    Q4,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Inbox,
        Category::Q1,
        Category::Q2,
        Category::Q3,
        Category::Q4,
    ];

    pub const QUADRANTS: [Category; 4] = [Category::Q1, Category::Q2, Category::Q3, Category::Q4];

    /// Fixed display priority: inbox first, then q1..q4.
    pub fn priority(self) -> u8 {
        match self {
            Self::Inbox => 0,
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    /// The two "important" quadrants.
    pub fn is_important(self) -> bool {
        matches!(self, Self::Q1 | Self::Q2)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Q1 => "q1",
            Self::Q2 => "q2",
            Self::Q3 => "q3",
            Self::Q4 => "q4",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TaskValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inbox" => Ok(Self::Inbox),
            "q1" => Ok(Self::Q1),
            "q2" => Ok(Self::Q2),
            "q3" => Ok(Self::Q3),
            "q4" => Ok(Self::Q4),
            other => Err(TaskValidationError::UnknownCategory(other.to_string())),
        }
    }
}

/// Unit code of a duration estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationUnit {
    #[serde(rename = "m")]
    Minutes,
    #[serde(rename = "h")]
    Hours,
    #[serde(rename = "d")]
    Days,
}

impl DurationUnit {
    pub fn code(self) -> char {
        match self {
            Self::Minutes => 'm',
            Self::Hours => 'h',
            Self::Days => 'd',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().chars().next()? {
            'm' => Some(Self::Minutes),
            'h' => Some(Self::Hours),
            'd' => Some(Self::Days),
            _ => None,
        }
    }
}

/// Magnitude plus unit, serialized compactly as `45m`, `2h`, `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DurationEstimate {
    pub amount: u32,
    pub unit: DurationUnit,
}

impl DurationEstimate {
    pub fn new(amount: u32, unit: DurationUnit) -> Self {
        Self { amount, unit }
    }

    pub fn minutes(amount: u32) -> Self {
        Self::new(amount, DurationUnit::Minutes)
    }
}

impl Display for DurationEstimate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.code())
    }
}

impl FromStr for DurationEstimate {
    type Err = TaskValidationError;

    /// Accepts `45m`, `45 min`, `2 hours`, `1d` and similar spellings.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || TaskValidationError::InvalidDuration(value.to_string());
        let captures = DURATION_RE.captures(value).ok_or_else(invalid)?;
        let amount = captures[1].parse::<u32>().map_err(|_| invalid())?;
        let unit = DurationUnit::from_code(&captures[2]).ok_or_else(invalid)?;
        Ok(Self { amount, unit })
    }
}

impl TryFrom<String> for DurationEstimate {
    type Error = TaskValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DurationEstimate> for String {
    fn from(value: DurationEstimate) -> Self {
        value.to_string()
    }
}

/// Task invariant or input violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    BlankTitle,
    CompletionMismatch { completed: bool, has_completed_at: bool },
    UnknownCategory(String),
    InvalidDuration(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::CompletionMismatch {
                completed,
                has_completed_at,
            } => write!(
                f,
                "completed={completed} disagrees with completed_at present={has_completed_at}"
            ),
            Self::UnknownCategory(value) => write!(f, "unknown category `{value}`"),
            Self::InvalidDuration(value) => write!(f, "invalid duration `{value}`"),
        }
    }
}

impl Error for TaskValidationError {}

/// A matrix task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Category,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub completed: bool,
    /// Unix epoch milliseconds; present exactly when `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_duration"
    )]
    pub duration: Option<DurationEstimate>,
    /// Manual edit counter, compared before applying classifier results.
    #[serde(default)]
    pub revision: u64,
}

impl Task {
    /// Creates an active task with a fresh id.
    pub fn new(title: impl Into<String>, category: Category, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            category,
            created_at,
            completed: false,
            completed_at: None,
            planned_date: None,
            duration: None,
            revision: 0,
        }
    }

    /// Active tasks are the ones shown in quadrant views.
    pub fn is_active(&self) -> bool {
        !self.completed
    }

    /// Flips completion and keeps `completed_at` in lock-step.
    ///
    /// Returns the new `completed` value.
    pub fn toggle_completed(&mut self, now_ms: i64) -> bool {
        self.completed = !self.completed;
        self.completed_at = self.completed.then_some(now_ms);
        self.completed
    }

    /// Merges the present fields of `patch`. Returns whether anything changed.
    pub fn apply_patch(&mut self, patch: &TaskPatch) -> bool {
        let before = self.clone();
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(planned_date) = patch.planned_date {
            self.planned_date = planned_date;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        *self != before
    }

    pub fn bump_revision(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        if self.completed != self.completed_at.is_some() {
            return Err(TaskValidationError::CompletionMismatch {
                completed: self.completed,
                has_completed_at: self.completed_at.is_some(),
            });
        }
        Ok(())
    }
}

/// Partial update for `update_task`. `None` leaves a field untouched;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Category>,
    pub planned_date: Option<Option<NaiveDate>>,
    pub duration: Option<Option<DurationEstimate>>,
}

impl TaskPatch {
    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn lenient_duration<'de, D>(deserializer: D) -> Result<Option<DurationEstimate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse::<DurationEstimate>() {
        Ok(duration) => Some(duration),
        Err(err) => {
            warn!("event=task_decode module=model status=skip field=duration error={err}");
            None
        }
    }))
}
