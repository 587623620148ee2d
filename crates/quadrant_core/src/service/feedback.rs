//! Completion feedback (chimes and haptics) emitted by the store.
//!
//! Platform adapters implement `FeedbackSink`; core only decides which cue
//! fits which transition.

use std::sync::{Arc, Mutex};

use crate::model::task::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chime {
    /// Task completion chime.
    Success,
    /// Higher-pitched chime used for habit check-ins.
    HighSuccess,
}

impl Chime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::HighSuccess => "high_success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    Light,
    /// Reserved for the two important quadrants.
    Strong,
}

impl Haptic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Strong => "strong",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    TaskCompleted {
        category: Category,
        chime: Chime,
        haptic: Haptic,
    },
    HabitChecked {
        chime: Chime,
        haptic: Haptic,
    },
}

impl Feedback {
    pub fn task_completed(category: Category) -> Self {
        let haptic = if category.is_important() {
            Haptic::Strong
        } else {
            Haptic::Light
        };
        Self::TaskCompleted {
            category,
            chime: Chime::Success,
            haptic,
        }
    }

    pub fn habit_checked() -> Self {
        Self::HabitChecked {
            chime: Chime::HighSuccess,
            haptic: Haptic::Light,
        }
    }
}

pub trait FeedbackSink: Send {
    fn emit(&self, feedback: Feedback);
}

/// Drops every cue. Default for headless callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFeedback;

impl FeedbackSink for NoopFeedback {
    fn emit(&self, _feedback: Feedback) {}
}

/// Keeps every emitted cue; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    events: Arc<Mutex<Vec<Feedback>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Feedback> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns and forgets every cue recorded so far.
    pub fn take_events(&self) -> Vec<Feedback> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn emit(&self, feedback: Feedback) {
        if let Ok(mut events) = self.events.lock() {
            events.push(feedback);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn important_quadrants_get_strong_haptic() {
        for category in Category::ALL {
            let Feedback::TaskCompleted { haptic, chime, .. } = Feedback::task_completed(category)
            else {
                panic!("task feedback expected");
            };
            assert_eq!(chime, Chime::Success);
            let expected = if category.is_important() {
                Haptic::Strong
            } else {
                Haptic::Light
            };
            assert_eq!(haptic, expected);
        }
    }

    #[test]
    fn recording_clones_share_and_take_drains() {
        let recorder = RecordingFeedback::new();
        let sink: Box<dyn FeedbackSink> = Box::new(recorder.clone());
        sink.emit(Feedback::habit_checked());

        assert_eq!(recorder.take_events(), vec![Feedback::habit_checked()]);
        assert!(recorder.events().is_empty());
    }
}
