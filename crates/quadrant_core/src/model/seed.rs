//! First-run sample content shown when no task/habit slot exists yet.

use chrono::{Duration, NaiveDate};

use crate::model::habit::Habit;
use crate::model::task::{Category, DurationEstimate, DurationUnit, Task};

const MINUTE_MS: i64 = 60_000;

/// Five sample tasks, one per category, newest first.
pub fn seed_tasks(now_ms: i64, today: NaiveDate) -> Vec<Task> {
    let samples: [(&str, Category, Option<DurationEstimate>, bool); 5] = [
        ("Call the dentist to book a check-up", Category::Inbox, None, false),
        (
            "Finish the quarterly report",
            Category::Q1,
            Some(DurationEstimate::new(2, DurationUnit::Hours)),
            true,
        ),
        (
            "Plan next week's priorities",
            Category::Q2,
            Some(DurationEstimate::minutes(30)),
            false,
        ),
        (
            "Reply to meeting invitations",
            Category::Q3,
            Some(DurationEstimate::minutes(15)),
            true,
        ),
        ("Scroll through social media", Category::Q4, None, false),
    ];

    samples
        .into_iter()
        .enumerate()
        .map(|(offset, (title, category, duration, planned_today))| {
            let mut task = Task::new(title, category, now_ms - offset as i64 * MINUTE_MS);
            task.duration = duration;
            task.planned_date = planned_today.then_some(today);
            task
        })
        .collect()
}

/// Two sample habits; the first one was done yesterday.
pub fn seed_habits(now_ms: i64, today: NaiveDate) -> Vec<Habit> {
    let mut water = Habit::new("Drink eight glasses of water", "blue", "1d", now_ms);
    water.completed_dates.insert(today - Duration::days(1));
    water.refresh_streak(today);

    let reading = Habit::new("Read 20 pages", "green", "1d", now_ms);
    vec![water, reading]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_covers_every_category_once() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let tasks = seed_tasks(1_000_000, today);
        assert_eq!(tasks.len(), 5);
        for category in Category::ALL {
            assert_eq!(tasks.iter().filter(|t| t.category == category).count(), 1);
        }
        assert!(tasks.iter().all(|t| t.validate().is_ok()));

        let habits = seed_habits(1_000_000, today);
        assert_eq!(habits.len(), 2);
        assert!(habits.iter().all(|h| h.streak == 0));
    }
}
