use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use taskflow_app_lib::db::repositories::{InMemoryTaskRepository, InMemoryTimeEntryRepository};
use taskflow_app_lib::models::analytics::{AnalyticsPeriod, HeatmapLevel};
use taskflow_app_lib::models::task::{TaskCreateInput, TaskUpdateInput};
use taskflow_app_lib::services::analytics_service::{AnalyticsConfig, AnalyticsService};
use taskflow_app_lib::services::task_service::TaskService;
use taskflow_app_lib::services::timer_service::TimerService;
use taskflow_app_lib::utils::clock::FixedClock;

struct Harness {
    clock: Arc<FixedClock>,
    tasks: TaskService,
    timer: TimerService,
    analytics: AnalyticsService,
}

fn harness() -> Harness {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 14, 8, 0, 0)
            .single()
            .expect("start time"),
    ));
    let task_store = Arc::new(InMemoryTaskRepository::new());
    let entry_store = Arc::new(InMemoryTimeEntryRepository::new());

    Harness {
        tasks: TaskService::new(task_store.clone(), clock.clone()),
        timer: TimerService::new(entry_store.clone(), clock.clone()),
        analytics: AnalyticsService::new(
            task_store,
            entry_store,
            clock.clone(),
            AnalyticsConfig::default(),
        ),
        clock,
    }
}

fn thursday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 14).expect("date")
}

/// Tracks 90 minutes on one task, completes another, and keeps one
/// completed task from the prior week.
fn seed(h: &Harness) {
    let report = h
        .tasks
        .create_task(TaskCreateInput {
            title: "Write report".into(),
            ..TaskCreateInput::default()
        })
        .expect("create report");
    h.timer.start_timer(&report.id).expect("start timer");
    h.clock.advance(Duration::minutes(90));
    h.timer.stop_timer().expect("stop timer");

    let review = h
        .tasks
        .create_task(TaskCreateInput {
            title: "Review PR".into(),
            priority: Some("high".into()),
            ..TaskCreateInput::default()
        })
        .expect("create review");
    h.clock.advance(Duration::minutes(30));
    h.tasks
        .update_task(
            &review.id,
            TaskUpdateInput {
                status: Some("completed".into()),
                ..TaskUpdateInput::default()
            },
        )
        .expect("complete review");

    h.tasks
        .create_task(TaskCreateInput {
            title: "Old task".into(),
            status: Some("completed".into()),
            created_at: Some("2024-03-05T09:00:00Z".into()),
            completed_at: Some("2024-03-06T10:00:00Z".into()),
            ..TaskCreateInput::default()
        })
        .expect("create old task");
}

#[test]
fn weekly_views_reflect_tracked_and_completed_work() {
    let h = harness();
    seed(&h);

    let days = h.analytics.daily_activities(AnalyticsPeriod::Week, thursday());
    assert_eq!(days.len(), 7);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 3, 11).expect("monday"));

    let today = &days[3];
    assert_eq!(today.task_count, 2);
    assert_eq!(today.completed_count, 1);
    assert!((today.hours_spent - 1.5).abs() < 1e-9);
    assert!(days
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != 3)
        .all(|(_, day)| day.task_count == 0 && day.hours_spent == 0.0));

    let heatmap = h.analytics.heatmap_data(AnalyticsPeriod::Week, thursday());
    assert_eq!(heatmap[3].count, 2);
    assert_eq!(heatmap[3].level, HeatmapLevel::Low);

    let most_time = h
        .analytics
        .most_time_spent_task(AnalyticsPeriod::Week, thursday())
        .expect("most time spent");
    assert_eq!(most_time.task_name, "Write report");
    assert!((most_time.hours - 1.5).abs() < 1e-9);

    let most_completed = h
        .analytics
        .most_completed_task(AnalyticsPeriod::Week, thursday())
        .expect("most completed");
    assert_eq!(most_completed.task_name, "Review PR");
    assert_eq!(most_completed.count, 1);

    let stats = h.analytics.completion_stats(AnalyticsPeriod::Week, thursday());
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.completion_rate, 50);
}

#[test]
fn current_period_scores_use_clock_today() {
    let h = harness();
    seed(&h);

    assert!((h.analytics.task_completion_rate(AnalyticsPeriod::Week) - 50.0).abs() < 1e-9);
    assert!((h.analytics.average_time_per_task(AnalyticsPeriod::Week) - 5_400_000.0).abs() < 1e-6);
    // (50 + 100·e^-4) / 2
    assert_eq!(h.analytics.focus_score(AnalyticsPeriod::Week), 26);

    // A week later nothing was created or tracked.
    h.clock.advance(Duration::days(7));
    assert_eq!(h.analytics.task_completion_rate(AnalyticsPeriod::Week), 0.0);
    assert_eq!(h.analytics.average_time_per_task(AnalyticsPeriod::Week), 0.0);
    assert_eq!(h.analytics.focus_score(AnalyticsPeriod::Week), 0);
}

#[test]
fn later_completion_is_also_credited_on_its_own_day() {
    let h = harness();
    seed(&h);

    let reference = NaiveDate::from_ymd_opt(2024, 3, 6).expect("date");
    let days = h.analytics.daily_activities(AnalyticsPeriod::Week, reference);
    let tuesday = &days[1];
    let wednesday = &days[2];
    assert_eq!((tuesday.task_count, tuesday.completed_count), (1, 1));
    assert_eq!((wednesday.task_count, wednesday.completed_count), (0, 1));
}

#[test]
fn day_month_and_year_periods_resolve_their_buckets() {
    let h = harness();
    seed(&h);

    assert_eq!(h.analytics.daily_activities(AnalyticsPeriod::Day, thursday()).len(), 1);
    assert_eq!(h.analytics.daily_activities(AnalyticsPeriod::Month, thursday()).len(), 31);
    assert_eq!(h.analytics.daily_activities(AnalyticsPeriod::Year, thursday()).len(), 366);
    assert_eq!(
        h.analytics
            .daily_activities(AnalyticsPeriod::parse("quarter"), thursday())
            .len(),
        8
    );

    let month = h.analytics.completion_stats(AnalyticsPeriod::Month, thursday());
    assert_eq!(month.total_tasks, 3);
    assert_eq!(month.completed_tasks, 3);
}
