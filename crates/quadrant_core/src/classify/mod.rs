//! Best-effort task classification.
//!
//! # Responsibility
//! - Define the contract for the external classifier that suggests a
//!   quadrant and a duration for freshly captured inbox tasks.
//! - Carry requests and replies between the store and a queue that runs
//!   the classifier off the caller's path.
//!
//! # Invariants
//! - `Classifier::classify` always returns; failures resolve to
//!   `category = inbox` with an error kind, never to a panic.
//! - A reply never carries `inbox` as a successful category.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::task::{Category, DurationEstimate, TaskId};

mod http;
mod queue;
mod reply;

pub use http::{HttpClassifier, HttpClassifierConfig};
pub use queue::{ClassificationQueue, InlineQueue, ThreadedQueue};
pub use reply::parse_classifier_reply;

/// Coarse failure taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierFailure {
    /// Provider rate limit or quota exhausted.
    Quota,
    Other,
}

impl ClassifierFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quota => "quota",
            Self::Other => "other",
        }
    }
}

/// Detailed classifier error, collapsed to `ClassifierFailure` at the
/// contract boundary.
#[derive(Debug)]
pub enum ClassifierError {
    Quota(String),
    Http { status: u16, body: String },
    Transport(reqwest::Error),
    InvalidReply(String),
}

impl ClassifierError {
    pub fn failure(&self) -> ClassifierFailure {
        match self {
            Self::Quota(_) => ClassifierFailure::Quota,
            _ => ClassifierFailure::Other,
        }
    }
}

impl Display for ClassifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quota(message) => write!(f, "classifier quota exhausted: {message}"),
            Self::Http { status, body } => write!(f, "classifier http {status}: {body}"),
            Self::Transport(err) => write!(f, "classifier transport failed: {err}"),
            Self::InvalidReply(message) => write!(f, "classifier reply invalid: {message}"),
        }
    }
}

impl Error for ClassifierError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClassifierError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

/// Suggested triage for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierReply {
    pub category: Category,
    pub duration: Option<DurationEstimate>,
    pub error: Option<ClassifierFailure>,
}

impl ClassifierReply {
    pub fn suggest(category: Category, duration: Option<DurationEstimate>) -> Self {
        Self {
            category,
            duration,
            error: None,
        }
    }

    /// Safe fallback: keep the task in the inbox.
    pub fn failed(failure: ClassifierFailure) -> Self {
        Self {
            category: Category::Inbox,
            duration: None,
            error: Some(failure),
        }
    }

    /// A reply the store may apply.
    pub fn is_actionable(&self) -> bool {
        self.error.is_none() && self.category != Category::Inbox
    }
}

/// External collaborator that guesses a quadrant and duration.
pub trait Classifier: Send + Sync {
    fn classify(&self, title: &str, description: Option<&str>) -> ClassifierReply;
}

impl<C: Classifier + ?Sized> Classifier for std::sync::Arc<C> {
    fn classify(&self, title: &str, description: Option<&str>) -> ClassifierReply {
        (**self).classify(title, description)
    }
}

/// Work item captured when an inbox task is added with AI mode on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub task_id: TaskId,
    /// Task revision at dispatch; a later manual edit invalidates the reply.
    pub revision: u64,
    pub title: String,
    pub description: Option<String>,
    /// The caller supplied a duration, so the classifier's guess is ignored.
    pub keep_duration: bool,
}

/// Finished classification waiting to be applied on the store's thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub request: ClassificationRequest,
    pub reply: ClassifierReply,
}

/// Runs a classifier and logs failures; the reply is always usable.
pub(crate) fn run_classifier(
    classifier: &dyn Classifier,
    request: ClassificationRequest,
) -> ClassificationResult {
    let reply = classifier.classify(&request.title, request.description.as_deref());
    match reply.error {
        Some(failure) => log::warn!(
            "event=classify module=classify status=error task_id={} error_kind={}",
            request.task_id,
            failure.as_str()
        ),
        None => log::info!(
            "event=classify module=classify status=ok task_id={} category={}",
            request.task_id,
            reply.category
        ),
    }
    ClassificationResult { request, reply }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_reply_falls_back_to_inbox() {
        let reply = ClassifierReply::failed(ClassifierFailure::Quota);
        assert_eq!(reply.category, Category::Inbox);
        assert!(!reply.is_actionable());
    }

    #[test]
    fn only_quota_errors_map_to_quota() {
        assert_eq!(
            ClassifierError::Quota("429".into()).failure(),
            ClassifierFailure::Quota
        );
        assert_eq!(
            ClassifierError::InvalidReply("nope".into()).failure(),
            ClassifierFailure::Other
        );
    }
}
