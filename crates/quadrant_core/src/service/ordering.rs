//! Presentation-facing ordering of task lists.
//!
//! # Invariants
//! - Ordering is derived on every call and never persisted.
//! - Category priority ascends (`inbox` first); ties sort newest first.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::model::task::{Category, Task};

/// Canonical secondary ordering for display.
pub fn display_cmp(a: &Task, b: &Task) -> Ordering {
    a.category
        .priority()
        .cmp(&b.category.priority())
        .then_with(|| b.created_at.cmp(&a.created_at))
}

pub fn display_order<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<&'a Task> {
    let mut ordered: Vec<&Task> = tasks.into_iter().collect();
    ordered.sort_by(|a, b| display_cmp(a, b));
    ordered
}

/// Triaged tasks scheduled on `date`, completed ones included.
pub fn tasks_planned_for(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    display_order(
        tasks
            .iter()
            .filter(|task| task.category != Category::Inbox && task.planned_date == Some(date)),
    )
}
