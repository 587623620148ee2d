//! Time source injected into the store so "now" and "today" are testable.

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub trait Clock: Send {
    /// Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
    /// Calendar day used for streaks and the default planner date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the device's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock. Clones share the same instant, so a test can keep
/// one handle and advance the copy owned by the store.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    /// Starts at noon UTC on `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self::new(noon)
    }

    pub fn advance_ms(&self, delta: i64) {
        self.now_ms.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn today(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.now_ms())
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}
