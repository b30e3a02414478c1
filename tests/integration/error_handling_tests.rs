// Store failures and malformed input at the service and command boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use taskflow_app_lib::commands::CommandError;
use taskflow_app_lib::db::repositories::{
    InMemoryTaskRepository, InMemoryTimeEntryRepository, TaskRepository, TimeEntryRepository,
};
use taskflow_app_lib::error::{AppError, AppResult};
use taskflow_app_lib::models::analytics::{AnalyticsPeriod, HeatmapLevel};
use taskflow_app_lib::models::task::{TaskPriority, TaskRecord, TaskStatus};
use taskflow_app_lib::models::time_entry::TimeEntryRecord;
use taskflow_app_lib::services::analytics_service::{AnalyticsConfig, AnalyticsService};
use taskflow_app_lib::services::dashboard_service::DashboardService;
use taskflow_app_lib::utils::clock::FixedClock;

/// Serves a fixed task list until switched off.
struct FlakyTasks {
    healthy: AtomicBool,
    tasks: Vec<TaskRecord>,
}

impl TaskRepository for FlakyTasks {
    fn list_tasks(&self) -> AppResult<Vec<TaskRecord>> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(self.tasks.clone())
        } else {
            Err(AppError::database("task store offline"))
        }
    }
}

struct BrokenEntries;

impl TimeEntryRepository for BrokenEntries {
    fn list_time_entries(&self) -> AppResult<Vec<TimeEntryRecord>> {
        Err(AppError::other("entry store offline"))
    }
}

fn task(id: &str, created_at: &str, status: TaskStatus) -> TaskRecord {
    TaskRecord {
        id: id.into(),
        title: format!("Task {id}"),
        description: None,
        status,
        priority: TaskPriority::Medium,
        category_id: None,
        due_date: None,
        has_reminder: false,
        created_at: Some(created_at.into()),
        completed_at: None,
        updated_at: None,
    }
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0)
            .single()
            .expect("now"),
    ))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 14).expect("date")
}

#[test]
fn failing_entry_store_yields_safe_defaults() {
    let analytics = Arc::new(AnalyticsService::new(
        Arc::new(InMemoryTaskRepository::with_tasks(vec![task(
            "a",
            "2024-03-14T09:00:00Z",
            TaskStatus::Completed,
        )])),
        Arc::new(BrokenEntries),
        clock(),
        AnalyticsConfig::default(),
    ));

    assert!(analytics.daily_activities(AnalyticsPeriod::Week, today()).is_empty());
    assert!(analytics.heatmap_data(AnalyticsPeriod::Week, today()).is_empty());
    assert!(analytics.most_time_spent_task(AnalyticsPeriod::Week, today()).is_none());
    assert!(analytics.most_completed_task(AnalyticsPeriod::Week, today()).is_none());
    assert_eq!(analytics.task_completion_rate(AnalyticsPeriod::Week), 0.0);
    assert_eq!(analytics.average_time_per_task(AnalyticsPeriod::Week), 0.0);
    assert_eq!(analytics.focus_score(AnalyticsPeriod::Week), 0);
    assert_eq!(analytics.completion_stats(AnalyticsPeriod::Week, today()).total_tasks, 0);
    assert_eq!(analytics.card_focus_score(AnalyticsPeriod::Week, today()).score, 0);

    let dashboard = DashboardService::new(Arc::clone(&analytics)).build(AnalyticsPeriod::Week, today());
    assert_eq!(dashboard.daily_activities.len(), 7);
    assert!(dashboard
        .heatmap
        .iter()
        .all(|cell| cell.count == 0 && cell.level == HeatmapLevel::None));
    assert!(dashboard.most_completed.is_none());
}

#[test]
fn failed_recalculation_replaces_snapshot_with_empty() {
    let tasks = Arc::new(FlakyTasks {
        healthy: AtomicBool::new(true),
        tasks: vec![task("a", "2024-03-14T09:00:00Z", TaskStatus::Completed)],
    });
    let analytics = AnalyticsService::new(
        tasks.clone(),
        Arc::new(InMemoryTimeEntryRepository::new()),
        clock(),
        AnalyticsConfig::default(),
    );

    analytics.recalculate_snapshot();
    assert_eq!(analytics.snapshot().productivity_metrics.tasks_completed.value, 1);

    tasks.healthy.store(false, Ordering::SeqCst);
    analytics.recalculate_snapshot();
    let snapshot = analytics.snapshot();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.productivity_metrics.tasks_completed.value, 0);
    assert_eq!(snapshot.productivity_metrics.focus_score.label, "Focus Score");
}

#[test]
fn malformed_records_never_fail_a_getter() {
    let tasks = vec![
        task("ok", "2024-03-13T09:00:00Z", TaskStatus::Completed),
        task("bad", "yesterday-ish", TaskStatus::Completed),
        TaskRecord {
            created_at: None,
            ..task("none", "", TaskStatus::Todo)
        },
    ];
    let entries = vec![
        TimeEntryRecord {
            id: "e1".into(),
            task_id: "ok".into(),
            start_time: "2024-03-13T10:00:00Z".into(),
            end_time: Some("garbage".into()),
        },
        TimeEntryRecord {
            id: "e2".into(),
            task_id: "ok".into(),
            start_time: "2024-03-13T11:00:00Z".into(),
            end_time: Some("2024-03-13T10:00:00Z".into()),
        },
    ];
    let analytics = AnalyticsService::new(
        Arc::new(InMemoryTaskRepository::with_tasks(tasks)),
        Arc::new(InMemoryTimeEntryRepository::with_entries(entries)),
        clock(),
        AnalyticsConfig::default(),
    );

    let days = analytics.daily_activities(AnalyticsPeriod::Week, today());
    let wednesday = &days[2];
    assert_eq!(wednesday.task_count, 1);
    assert_eq!(wednesday.completed_count, 1);
    // The unparsable end is treated as open (26h to now); the reversed entry clamps to zero.
    assert!((wednesday.hours_spent - 26.0).abs() < 1e-9);
    assert!(days.iter().all(|day| day.hours_spent >= 0.0));

    // Neither entry is closed, so no time-based achievement exists.
    assert!(analytics
        .most_time_spent_task(AnalyticsPeriod::Week, today())
        .is_none());
}

#[test]
fn app_errors_map_to_command_codes() {
    let validation: CommandError = AppError::validation("标题不能为空").into();
    assert_eq!(validation.code, "VALIDATION_ERROR");
    assert_eq!(validation.message, "标题不能为空");

    let not_found: CommandError = AppError::not_found().into();
    assert_eq!(not_found.code, "NOT_FOUND");

    let conflict: CommandError = AppError::conflict("duplicate").into();
    assert_eq!(conflict.code, "CONFLICT");

    let database: CommandError = AppError::database("disk I/O error").into();
    assert_eq!(database.code, "UNKNOWN");

    let json = serde_json::to_value(&not_found).expect("serialize");
    assert!(json.get("details").is_none());
    assert_eq!(json["code"], "NOT_FOUND");
}
