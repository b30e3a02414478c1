use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::models::analytics::{AchievementKind, AchievementOfDay, DateRange, TaskAchievement};
use crate::models::task::TaskRecord;
use crate::models::time_entry::TimeEntryRecord;
use crate::services::analytics_utils::{
    closed_entry_duration_ms, completion_date, created_date, entry_duration_ms, entry_start,
    local_date, ms_to_hours,
};

/// Running totals that remember first-seen order so ties go to the key
/// encountered first.
struct OrderedTally<'a> {
    order: Vec<(&'a str, i64)>,
    index: HashMap<&'a str, usize>,
}

impl<'a> OrderedTally<'a> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, key: &'a str, amount: i64) {
        match self.index.get(key) {
            Some(&slot) => self.order[slot].1 += amount,
            None => {
                self.index.insert(key, self.order.len());
                self.order.push((key, amount));
            }
        }
    }

    /// Strictly largest positive total.
    fn leader(&self) -> Option<(&'a str, i64)> {
        let mut best: Option<(&'a str, i64)> = None;
        for &(key, total) in &self.order {
            let current = best.map(|(_, value)| value).unwrap_or(0);
            if total > current {
                best = Some((key, total));
            }
        }
        best
    }
}

/// Task with the most closed tracked time among entries starting in `range`.
/// `None` when nothing qualifies or the winning id has no task.
pub fn find_most_time_spent(
    tasks: &[TaskRecord],
    entries: &[TimeEntryRecord],
    range: &DateRange,
    tz: Tz,
) -> Option<TaskAchievement> {
    let mut tally = OrderedTally::new();
    for entry in entries {
        if entry.task_id.is_empty() {
            continue;
        }
        let Some(start) = entry_start(entry) else {
            continue;
        };
        if !range.contains(local_date(start, tz)) {
            continue;
        }
        if let Some(ms) = closed_entry_duration_ms(entry) {
            tally.add(entry.task_id.as_str(), ms);
        }
    }

    let (task_id, total_ms) = tally.leader()?;
    let task = tasks.iter().find(|task| task.id == task_id)?;

    Some(TaskAchievement {
        task_name: task.title.clone(),
        hours: ms_to_hours(total_ms),
        count: 0,
    })
}

/// Title completed most often in `range`. Tasks are grouped by title, so
/// distinct tasks sharing a name are merged.
pub fn find_most_completed(
    tasks: &[TaskRecord],
    range: &DateRange,
    tz: Tz,
) -> Option<TaskAchievement> {
    let mut tally = OrderedTally::new();
    for task in tasks {
        if let Some(done) = completion_date(task, tz) {
            if range.contains(done) {
                tally.add(task.title.as_str(), 1);
            }
        }
    }

    let (title, count) = tally.leader()?;
    Some(TaskAchievement {
        task_name: title.to_string(),
        hours: 0.0,
        count: u32::try_from(count).unwrap_or(u32::MAX),
    })
}

/// Among tasks created `today`, the one with the most time tracked today.
/// Open entries run until `now`.
pub fn find_achievement_of_day(
    tasks: &[TaskRecord],
    entries: &[TimeEntryRecord],
    today: NaiveDate,
    tz: Tz,
    now: DateTime<Utc>,
) -> Option<AchievementOfDay> {
    let mut best: Option<(&TaskRecord, i64)> = None;

    for task in tasks {
        if created_date(task, tz) != Some(today) {
            continue;
        }

        let spent: i64 = entries
            .iter()
            .filter(|entry| entry.task_id == task.id)
            .filter(|entry| entry_start(entry).map(|start| local_date(start, tz)) == Some(today))
            .filter_map(|entry| entry_duration_ms(entry, now))
            .sum();

        let current = best.map(|(_, value)| value).unwrap_or(0);
        if spent > current {
            best = Some((task, spent));
        }
    }

    best.map(|(task, spent)| AchievementOfDay {
        kind: AchievementKind::MostTimeSpent,
        task_id: task.id.clone(),
        task_title: task.title.clone(),
        value: spent,
    })
}
