//! Habit domain model and streak derivation.
//!
//! # Invariants
//! - `completed_dates` is a set; serialization emits it sorted ascending.
//! - `streak` is always recomputed from `completed_dates`, never trusted
//!   from storage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for habits.
pub type HabitId = Uuid;

pub const DEFAULT_HABIT_ICON: &str = "check";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub title: String,
    /// Presentation tag, opaque to core.
    pub color: String,
    /// Presentation tag, opaque to core.
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Intended cadence such as `1d`; informational only.
    #[serde(default)]
    pub frequency: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
    /// Cached; see [`compute_streak`].
    #[serde(default)]
    pub streak: u32,
}

impl Habit {
    pub fn new(
        title: impl Into<String>,
        color: impl Into<String>,
        frequency: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            color: color.into(),
            icon: DEFAULT_HABIT_ICON.to_string(),
            frequency: frequency.into(),
            created_at,
            completed_dates: BTreeSet::new(),
            streak: 0,
        }
    }

    /// Flips membership of `date`, then recomputes the streak against `today`.
    ///
    /// Returns `true` when the date was added.
    pub fn toggle_date(&mut self, date: NaiveDate, today: NaiveDate) -> bool {
        let added = if self.completed_dates.remove(&date) {
            false
        } else {
            self.completed_dates.insert(date);
            true
        };
        self.refresh_streak(today);
        added
    }

    pub fn refresh_streak(&mut self, today: NaiveDate) {
        self.streak = compute_streak(&self.completed_dates, today);
    }

    pub fn is_done_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }
}

/// Counts consecutive days present in `dates`, walking backward from `today`.
///
/// Returns 0 when `today` itself is absent, even if yesterday is present.
pub fn compute_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = today;
    while dates.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}

fn default_icon() -> String {
    DEFAULT_HABIT_ICON.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn streak_counts_back_from_today() {
        let dates: BTreeSet<_> = [day(7), day(8), day(9), day(10)].into_iter().collect();
        assert_eq!(compute_streak(&dates, day(10)), 4);
    }

    #[test]
    fn streak_is_zero_without_today() {
        let dates: BTreeSet<_> = [day(9)].into_iter().collect();
        assert_eq!(compute_streak(&dates, day(10)), 0);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let dates: BTreeSet<_> = [day(5), day(8), day(9), day(10)].into_iter().collect();
        assert_eq!(compute_streak(&dates, day(10)), 3);
    }

    #[test]
    fn completed_dates_serialize_sorted() {
        let mut habit = Habit::new("stretch", "teal", "1d", 0);
        habit.toggle_date(day(9), day(10));
        habit.toggle_date(day(2), day(10));
        let json = serde_json::to_value(&habit).unwrap();
        assert_eq!(
            json["completedDates"],
            serde_json::json!(["2025-03-02", "2025-03-09"])
        );
        assert_eq!(json["icon"], "check");
    }
}
