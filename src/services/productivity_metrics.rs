use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::models::analytics::{
    AnalyticsPeriod, AnalyticsSnapshot, CompletionStats, DailyActivity, DateRange,
    ProductivityMetric, ProductivityMetrics, FOCUS_SCORE_LABEL, TASKS_COMPLETED_LABEL,
    TIME_TRACKED_LABEL,
};
use crate::models::task::TaskRecord;
use crate::models::time_entry::TimeEntryRecord;
use crate::services::achievements::find_achievement_of_day;
use crate::services::activity_aggregator::build_daily_activities;
use crate::services::analytics_utils::{
    created_date, entry_duration_ms, entry_start, local_date, round_to, safe_ratio,
};
use crate::services::heatmap::project_snapshot_heatmap;

/// Baseline the snapshot focus metric's change is measured against.
pub const FOCUS_BASELINE: i64 = 50;

/// Whole-percent change from `previous` to `current`. A zero baseline gives
/// 100 when anything happened and 0 otherwise.
pub fn percentage_change(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }
    let change = (current - previous) / previous * 100.0;
    if change.is_finite() {
        change.round() as i64
    } else {
        0
    }
}

/// Percent (0..=100, unrounded) of tasks created in `range` that are completed.
pub fn task_completion_rate(tasks: &[TaskRecord], range: &DateRange, tz: Tz) -> f64 {
    let mut created = 0u32;
    let mut completed = 0u32;
    for task in tasks {
        if created_date(task, tz).is_some_and(|day| range.contains(day)) {
            created += 1;
            if task.is_completed() {
                completed += 1;
            }
        }
    }
    safe_ratio(f64::from(completed), f64::from(created)) * 100.0
}

/// Tracked milliseconds per distinct task among entries starting in `range`.
/// Open entries run until `now`.
pub fn average_time_per_task_ms(
    entries: &[TimeEntryRecord],
    range: &DateRange,
    tz: Tz,
    now: DateTime<Utc>,
) -> f64 {
    let mut total_ms = 0i64;
    let mut task_ids: HashSet<&str> = HashSet::new();

    for entry in entries {
        let Some(start) = entry_start(entry) else {
            continue;
        };
        if !range.contains(local_date(start, tz)) {
            continue;
        }
        task_ids.insert(entry.task_id.as_str());
        total_ms += entry_duration_ms(entry, now).unwrap_or(0);
    }

    safe_ratio(total_ms as f64, task_ids.len() as f64)
}

pub fn completion_stats(days: &[DailyActivity]) -> CompletionStats {
    let total_tasks: u32 = days.iter().map(|day| day.task_count).sum();
    let completed_tasks: u32 = days.iter().map(|day| day.completed_count).sum();
    let total_hours: f64 = days.iter().map(|day| day.hours_spent).sum();

    let completion_rate = if total_tasks == 0 {
        0
    } else {
        (safe_ratio(f64::from(completed_tasks), f64::from(total_tasks)) * 100.0).round() as u32
    };

    CompletionStats {
        total_tasks,
        completed_tasks,
        completion_rate,
        total_hours: round_to(total_hours, 1),
        average_hours_per_task: round_to(safe_ratio(total_hours, f64::from(total_tasks)), 1),
        average_tasks_per_day: round_to(safe_ratio(f64::from(total_tasks), days.len() as f64), 1),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct WindowTotals {
    completed: u32,
    hours: f64,
}

fn window_totals(days: &[DailyActivity], window: &DateRange) -> WindowTotals {
    days.iter()
        .filter(|day| window.contains(day.date))
        .fold(WindowTotals::default(), |mut acc, day| {
            acc.completed += day.completed_count;
            acc.hours += day.hours_spent;
            acc
        })
}

/// Days 8 through 14 before `today`.
pub fn prior_week_window(today: NaiveDate) -> DateRange {
    let start = today.checked_sub_days(Days::new(14)).unwrap_or(today);
    let end = today.checked_sub_days(Days::new(8)).unwrap_or(today);
    DateRange::new(start, end)
}

/// Snapshot focus: mean of the all-time completion rate and the share of
/// window days with any tracked time.
pub fn snapshot_focus_score(tasks: &[TaskRecord], days: &[DailyActivity]) -> i64 {
    let completed = tasks.iter().filter(|task| task.is_completed()).count();
    let completion_rate = safe_ratio(completed as f64, tasks.len() as f64) * 100.0;

    let tracked_days = days.iter().filter(|day| day.hours_spent > 0.0).count();
    let consistency = safe_ratio(tracked_days as f64, days.len() as f64) * 100.0;

    ((completion_rate + consistency) / 2.0).round() as i64
}

pub fn build_productivity_metrics(
    tasks: &[TaskRecord],
    days: &[DailyActivity],
    today: NaiveDate,
) -> ProductivityMetrics {
    let this_week = window_totals(days, &DateRange::current(AnalyticsPeriod::Week, today));
    let prior_week = window_totals(days, &prior_week_window(today));
    let focus = snapshot_focus_score(tasks, days);

    ProductivityMetrics {
        tasks_completed: ProductivityMetric::new(
            TASKS_COMPLETED_LABEL,
            i64::from(this_week.completed),
            percentage_change(
                f64::from(this_week.completed),
                f64::from(prior_week.completed),
            ),
        ),
        time_tracked: ProductivityMetric::new(
            TIME_TRACKED_LABEL,
            this_week.hours.round() as i64,
            percentage_change(this_week.hours, prior_week.hours),
        ),
        focus_score: ProductivityMetric::new(FOCUS_SCORE_LABEL, focus, focus - FOCUS_BASELINE),
    }
}

/// Rolling `window_days` aggregate ending at `today`, plus the week-over-week
/// metrics and the achievement of the day.
pub fn build_snapshot(
    tasks: &[TaskRecord],
    entries: &[TimeEntryRecord],
    today: NaiveDate,
    window_days: u32,
    tz: Tz,
    now: DateTime<Utc>,
) -> AnalyticsSnapshot {
    let range = DateRange::trailing(today, window_days);
    // Completions are credited on the completion day as well as the creation
    // day, so `tasks_completed` counts both.
    let daily_activity = build_daily_activities(tasks, entries, &range, tz, now);
    let heatmap = project_snapshot_heatmap(&daily_activity);
    let productivity_metrics = build_productivity_metrics(tasks, &daily_activity, today);
    let achievement_of_day = find_achievement_of_day(tasks, entries, today, tz, now);

    debug!(
        target: "app::analytics",
        start = %range.start,
        end = %range.end,
        tasks_completed = productivity_metrics.tasks_completed.value,
        time_tracked = productivity_metrics.time_tracked.value,
        focus = productivity_metrics.focus_score.value,
        has_achievement = achievement_of_day.is_some(),
        "analytics snapshot built"
    );

    AnalyticsSnapshot {
        generated_at: Some(now),
        range: Some(range),
        daily_activity,
        heatmap,
        productivity_metrics,
        achievement_of_day,
    }
}
