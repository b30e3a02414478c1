use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::models::analytics::{DailyActivity, DateRange};
use crate::models::task::TaskRecord;
use crate::models::time_entry::TimeEntryRecord;
use crate::services::analytics_utils::{
    completion_date, created_date, entry_duration_ms, entry_start, local_date, ms_to_hours,
};

/// One zeroed bucket per day of `range`, ascending, then populated:
///
/// * a task created in range bumps `task_count` on its creation day, and
///   `completed_count` too when it is completed;
/// * a completed task whose credited completion day differs from its
///   creation day bumps `completed_count` on that day as well;
/// * a time entry adds its duration to the day its start falls on. Open
///   entries run until `now`.
pub fn build_daily_activities(
    tasks: &[TaskRecord],
    entries: &[TimeEntryRecord],
    range: &DateRange,
    tz: Tz,
    now: DateTime<Utc>,
) -> Vec<DailyActivity> {
    let mut buckets: Vec<DailyActivity> = range.days().map(DailyActivity::empty).collect();
    let mut tracked_ms = vec![0i64; buckets.len()];

    for task in tasks {
        let created = created_date(task, tz);

        if let Some(index) = created.and_then(|day| bucket_index(range, day)) {
            let bucket = &mut buckets[index];
            bucket.task_count += 1;
            if task.is_completed() {
                bucket.completed_count += 1;
            }
        }

        if let Some(done) = completion_date(task, tz) {
            if created != Some(done) {
                if let Some(index) = bucket_index(range, done) {
                    buckets[index].completed_count += 1;
                }
            }
        }
    }

    for entry in entries {
        let Some(start) = entry_start(entry) else {
            continue;
        };
        let Some(index) = bucket_index(range, local_date(start, tz)) else {
            continue;
        };
        if let Some(ms) = entry_duration_ms(entry, now) {
            tracked_ms[index] += ms;
        }
    }

    for (bucket, ms) in buckets.iter_mut().zip(tracked_ms) {
        bucket.hours_spent = ms_to_hours(ms);
    }

    debug!(
        target: "app::analytics",
        start = %range.start,
        end = %range.end,
        buckets = buckets.len(),
        tasks = tasks.len(),
        entries = entries.len(),
        "daily activities aggregated"
    );

    buckets
}

fn bucket_index(range: &DateRange, day: NaiveDate) -> Option<usize> {
    if range.contains(day) {
        Some((day - range.start).num_days() as usize)
    } else {
        None
    }
}
