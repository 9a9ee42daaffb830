use chrono::{DateTime, Days, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::model::{record_str, Record};
use crate::seed::dates::{format_iso, parse_seed_date, start_of_day};

/// Share of projects marked Done when the caller does not say otherwise
pub const DEFAULT_DONE_RATIO: f64 = 0.5;

/// Done projects ended this many days ago
const DONE_END_DAYS_AGO: (u64, u64) = (5, 60);
/// Active projects started this many days ago
const ACTIVE_START_DAYS_AGO: (u64, u64) = (5, 30);
/// Project length in days, both statuses
const PROJECT_LENGTH_DAYS: (u64, u64) = (30, 180);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProjectStatus {
    Done,
    Active,
}

impl ProjectStatus {
    /// Done when `endDate` is before today's local midnight, Active otherwise.
    /// `None` when the record has no parseable `endDate`.
    pub fn of(record: &Record, today: NaiveDate) -> Option<Self> {
        let end = parse_seed_date(record_str(record, "endDate")?)?;
        if end < start_of_day(today) {
            Some(ProjectStatus::Done)
        } else {
            Some(ProjectStatus::Active)
        }
    }
}

/// Start/end pair written onto a rebalanced project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ProjectWindow {
    pub fn draw<R: Rng + ?Sized>(status: ProjectStatus, today: NaiveDate, rng: &mut R) -> Self {
        let (start, end) = match status {
            ProjectStatus::Done => {
                let end = today - Days::new(rng.gen_range(DONE_END_DAYS_AGO.0..=DONE_END_DAYS_AGO.1));
                let start =
                    end - Days::new(rng.gen_range(PROJECT_LENGTH_DAYS.0..=PROJECT_LENGTH_DAYS.1));
                (start, end)
            }
            ProjectStatus::Active => {
                let age = rng.gen_range(ACTIVE_START_DAYS_AGO.0..=ACTIVE_START_DAYS_AGO.1);
                let start = today - Days::new(age);
                // Must still be running after today
                let shortest = PROJECT_LENGTH_DAYS.0.max(age + 1);
                let end = start + Days::new(rng.gen_range(shortest..=PROJECT_LENGTH_DAYS.1));
                (start, end)
            }
        };

        Self {
            start: start_of_day(start),
            end: start_of_day(end),
        }
    }
}

/// Pick `k` distinct indices out of `0..n` with a Fisher–Yates shuffle.
/// Asking for more than `n` yields all of them.
pub fn sample_without_replacement<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.gen_range(0..=i);
        indices.swap(i, j);
    }
    indices.truncate(k.min(n));
    indices
}

/// `round(total * ratio)`, with the ratio clamped to `[0, 1]`.
pub fn done_count(total: usize, done_ratio: f64) -> usize {
    if done_ratio.is_nan() {
        return 0;
    }
    let ratio = done_ratio.clamp(0.0, 1.0);
    ((total as f64) * ratio).round() as usize
}

/// Re-date projects so exactly `done_count(len, done_ratio)` of them are Done
/// and the rest Active. Which ones is random; how many is not. Only
/// `startDate` and `endDate` are rewritten.
pub fn rebalance_project_dates<R: Rng + ?Sized>(
    projects: &[Record],
    done_ratio: f64,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<Record> {
    let total = projects.len();
    let done: HashSet<usize> =
        sample_without_replacement(total, done_count(total, done_ratio), rng)
            .into_iter()
            .collect();

    projects
        .iter()
        .enumerate()
        .map(|(idx, project)| {
            let status = if done.contains(&idx) {
                ProjectStatus::Done
            } else {
                ProjectStatus::Active
            };
            let window = ProjectWindow::draw(status, today, rng);

            let mut project = project.clone();
            project.insert("startDate".to_string(), Value::String(format_iso(&window.start)));
            project.insert("endDate".to_string(), Value::String(format_iso(&window.end)));
            project
        })
        .collect()
}
