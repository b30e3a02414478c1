use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use taskflow_app_lib::db::repositories::{
    SqliteTaskRepository, SqliteTimeEntryRepository, TaskRepository, TaskStore,
    TimeEntryRepository, TimeEntryStore,
};
use taskflow_app_lib::db::DbPool;
use taskflow_app_lib::error::AppError;
use taskflow_app_lib::models::analytics::AnalyticsPeriod;
use taskflow_app_lib::models::task::{TaskCreateInput, TaskStatus, TaskUpdateInput};
use taskflow_app_lib::models::time_entry::TimeEntryRecord;
use taskflow_app_lib::services::analytics_service::{AnalyticsConfig, AnalyticsService};
use taskflow_app_lib::services::task_service::TaskService;
use taskflow_app_lib::services::timer_service::TimerService;
use taskflow_app_lib::utils::clock::FixedClock;
use tempfile::tempdir;

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0)
            .single()
            .expect("start time"),
    ))
}

fn entry(id: &str, task_id: &str, start: &str, end: Option<&str>) -> TimeEntryRecord {
    TimeEntryRecord {
        id: id.into(),
        task_id: task_id.into(),
        start_time: start.into(),
        end_time: end.map(Into::into),
    }
}

#[test]
fn tasks_round_trip_through_sqlite() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("nested").join("tasks.sqlite")).expect("db pool");
    let clock = clock();
    let service = TaskService::new(Arc::new(SqliteTaskRepository::new(pool.clone())), clock.clone());

    let first = service
        .create_task(TaskCreateInput {
            title: "Plan".into(),
            description: Some("  quarterly  ".into()),
            due_date: Some("2024-03-20".into()),
            has_reminder: Some(true),
            ..TaskCreateInput::default()
        })
        .expect("create first");
    service
        .create_task(TaskCreateInput {
            title: "Execute".into(),
            ..TaskCreateInput::default()
        })
        .expect("create second");

    clock.advance(Duration::hours(1));
    let updated = service
        .update_task(
            &first.id,
            TaskUpdateInput {
                status: Some("completed".into()),
                description: Some(None),
                ..TaskUpdateInput::default()
            },
        )
        .expect("update");
    assert_eq!(updated.status, TaskStatus::Completed);
    assert!(updated.description.is_none());

    // A fresh repository over the same file sees the same rows, newest first.
    let reopened = SqliteTaskRepository::new(DbPool::new(pool.path()).expect("reopen"));
    let tasks = reopened.list_tasks().expect("list");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].title, "Execute");
    assert_eq!(tasks[1], updated);
    assert!(tasks[1].has_reminder);
    assert_eq!(tasks[1].due_date.as_deref(), Some("2024-03-20"));

    service.delete_task(&first.id).expect("delete");
    assert!(reopened.find_task(&first.id).expect("find").is_none());
    assert!(service.delete_task(&first.id).expect_err("second delete").is_not_found());
}

#[test]
fn duplicate_ids_are_conflicts() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("dup.sqlite")).expect("db pool");
    let repo = SqliteTaskRepository::new(pool.clone());
    let service = TaskService::new(Arc::new(repo.clone()), clock());

    let task = service
        .create_task(TaskCreateInput {
            title: "Once".into(),
            ..TaskCreateInput::default()
        })
        .expect("create");
    let err = repo.insert_task(&task).expect_err("duplicate insert");
    assert!(matches!(err, AppError::Conflict { .. }));

    let entries = SqliteTimeEntryRepository::new(pool);
    let record = entry("e1", &task.id, "2024-03-14T09:00:00Z", None);
    entries.insert_time_entry(&record).expect("insert entry");
    assert!(matches!(
        entries.insert_time_entry(&record).expect_err("duplicate entry"),
        AppError::Conflict { .. }
    ));
    assert!(entries
        .update_time_entry(&entry("missing", "t", "2024-03-14T09:00:00Z", None))
        .expect_err("missing entry")
        .is_not_found());
}

#[test]
fn timer_entries_keep_insertion_order() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("timer.sqlite")).expect("db pool");
    let clock = clock();
    let store = Arc::new(SqliteTimeEntryRepository::new(pool));
    let timer = TimerService::new(store.clone(), clock.clone());

    let first = timer.start_timer("task-b").expect("start b");
    clock.advance(Duration::minutes(5));
    let second = timer.start_timer("task-a").expect("start a");
    clock.advance(Duration::minutes(25));
    let stopped = timer.stop_timer().expect("stop");
    assert_eq!(stopped.len(), 2);

    let listed = store.list_time_entries().expect("list");
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
    assert!(listed.iter().all(|entry| !entry.is_open()));
    assert_eq!(timer.task_duration_ms("task-b").expect("duration"), 30 * 60_000);
}

#[test]
fn analytics_over_sqlite_skip_malformed_and_orphaned_rows() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("analytics.sqlite")).expect("db pool");
    let clock = clock();
    let tasks = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let entries = Arc::new(SqliteTimeEntryRepository::new(pool.clone()));
    let service = TaskService::new(tasks.clone(), clock.clone());

    let kept = service
        .create_task(TaskCreateInput {
            title: "Kept".into(),
            ..TaskCreateInput::default()
        })
        .expect("create kept");
    let gone = service
        .create_task(TaskCreateInput {
            title: "Gone".into(),
            ..TaskCreateInput::default()
        })
        .expect("create gone");

    entries
        .insert_time_entry(&entry("e1", &kept.id, "2024-03-14T06:00:00Z", Some("2024-03-14T07:00:00Z")))
        .expect("kept entry");
    entries
        .insert_time_entry(&entry("e2", &gone.id, "2024-03-14T01:00:00Z", Some("2024-03-14T05:00:00Z")))
        .expect("orphan entry");
    entries
        .insert_time_entry(&entry("e3", &kept.id, "not a timestamp", Some("2024-03-14T08:00:00Z")))
        .expect("malformed entry");
    service.delete_task(&gone.id).expect("delete gone");

    let analytics = AnalyticsService::new(tasks, entries, clock, AnalyticsConfig::default());
    let today = NaiveDate::from_ymd_opt(2024, 3, 14).expect("date");

    let days = analytics.daily_activities(AnalyticsPeriod::Day, today);
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].task_count, 1);
    // The orphaned entry still counts toward tracked time.
    assert!((days[0].hours_spent - 5.0).abs() < 1e-9);

    // But it cannot name an achievement, so the leader is dropped.
    assert!(analytics
        .most_time_spent_task(AnalyticsPeriod::Day, today)
        .is_none());
}
