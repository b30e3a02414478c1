use std::sync::Arc;
use std::thread;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use taskflow_app_lib::db::repositories::{InMemoryTaskRepository, InMemoryTimeEntryRepository};
use taskflow_app_lib::models::analytics::AchievementKind;
use taskflow_app_lib::models::settings::AnalyticsSettings;
use taskflow_app_lib::models::task::{TaskCreateInput, TaskUpdateInput};
use taskflow_app_lib::services::analytics_service::{AnalyticsConfig, AnalyticsService};
use taskflow_app_lib::services::task_service::TaskService;
use taskflow_app_lib::services::timer_service::TimerService;
use taskflow_app_lib::utils::clock::{Clock, FixedClock};

struct Harness {
    clock: Arc<FixedClock>,
    tasks: TaskService,
    timer: TimerService,
    analytics: Arc<AnalyticsService>,
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
        analytics: Arc::new(AnalyticsService::new(
            task_store,
            entry_store,
            clock.clone(),
            AnalyticsConfig::default(),
        )),
        clock,
    }
}

/// Leaves the clock at 2024-03-14T10:00Z and returns the review task id.
fn seed(h: &Harness) -> String {
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

    review.id
}

#[test]
fn snapshot_is_empty_until_recalculated() {
    let h = harness();
    seed(&h);

    let before = h.analytics.snapshot();
    assert!(before.is_empty());
    assert_eq!(before.productivity_metrics.tasks_completed.value, 0);
    assert!(before.achievement_of_day.is_none());

    h.analytics.recalculate_snapshot();
    let after = h.analytics.snapshot();
    assert!(!after.is_empty());
    assert_eq!(after.generated_at, Some(h.clock.now()));
}

#[test]
fn snapshot_metrics_compare_against_prior_week() {
    let h = harness();
    seed(&h);
    h.analytics.recalculate_snapshot();
    let snapshot = h.analytics.snapshot();

    let range = snapshot.range.expect("range");
    assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 14).expect("today"));
    assert_eq!(snapshot.daily_activity.len(), 91);

    let metrics = &snapshot.productivity_metrics;
    assert_eq!(metrics.tasks_completed.label, "Tasks Completed");
    assert_eq!(metrics.tasks_completed.value, 1);
    // Prior week holds the old task twice: created completed, then completed.
    assert_eq!(metrics.tasks_completed.change, -50);
    assert_eq!(metrics.time_tracked.value, 2);
    assert_eq!(metrics.time_tracked.change, 100);
    // (2/3 completed + 1/91 tracked days) / 2
    assert_eq!(metrics.focus_score.value, 34);
    assert_eq!(metrics.focus_score.change, -16);

    let last = snapshot.heatmap.last().expect("heatmap");
    assert_eq!(last.count, 2);

    let achievement = snapshot.achievement_of_day.as_ref().expect("achievement");
    assert_eq!(achievement.kind, AchievementKind::MostTimeSpent);
    assert_eq!(achievement.task_title, "Write report");
    assert_eq!(achievement.value, 5_400_000);
}

#[test]
fn running_timer_can_take_over_the_achievement() {
    let h = harness();
    let review_id = seed(&h);
    h.timer.start_timer(&review_id).expect("start review timer");

    h.clock.advance(Duration::minutes(60));
    h.analytics.recalculate_snapshot();
    let first = h.analytics.snapshot();
    assert_eq!(
        first.achievement_of_day.as_ref().expect("achievement").task_title,
        "Write report"
    );

    h.clock.advance(Duration::minutes(60));
    h.analytics.recalculate_snapshot();
    let second = h.analytics.snapshot();
    let achievement = second.achievement_of_day.as_ref().expect("achievement");
    assert_eq!(achievement.task_title, "Review PR");
    assert_eq!(achievement.value, 7_200_000);

    // Earlier readers keep the snapshot they were handed.
    assert_eq!(
        first.achievement_of_day.as_ref().expect("achievement").task_title,
        "Write report"
    );
}

#[test]
fn timezone_setting_moves_today() {
    let h = harness();
    seed(&h);

    let settings = AnalyticsSettings {
        timezone: "Pacific/Kiritimati".into(),
        ..AnalyticsSettings::default()
    };
    h.analytics.apply_settings(&settings).expect("apply settings");
    assert_eq!(
        h.analytics.today(),
        NaiveDate::from_ymd_opt(2024, 3, 15).expect("kiritimati today")
    );

    h.analytics.recalculate_snapshot();
    let snapshot = h.analytics.snapshot();
    assert!(snapshot.achievement_of_day.is_none());
    // The review completed at 10:00Z, local midnight of the 15th, and is
    // credited on both its creation and completion days.
    assert_eq!(snapshot.productivity_metrics.tasks_completed.value, 2);
}

#[test]
fn readers_never_see_a_partial_snapshot() {
    let h = harness();
    seed(&h);

    thread::scope(|scope| {
        let analytics = &h.analytics;
        scope.spawn(move || {
            for _ in 0..20 {
                analytics.recalculate_snapshot();
            }
        });
        for _ in 0..4 {
            scope.spawn(move || {
                for _ in 0..50 {
                    let snapshot = analytics.snapshot();
                    if snapshot.is_empty() {
                        assert!(snapshot.daily_activity.is_empty());
                    } else {
                        assert_eq!(snapshot.daily_activity.len(), 91);
                        assert_eq!(snapshot.heatmap.len(), 91);
                    }
                }
            });
        }
    });

    assert!(!h.analytics.snapshot().is_empty());
}
