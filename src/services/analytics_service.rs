use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::db::repositories::{TaskRepository, TimeEntryRepository};
use crate::error::{AppError, AppResult};
use crate::models::analytics::{
    AnalyticsPeriod, AnalyticsSnapshot, CompletionStats, DailyActivity, DateRange, FocusScore,
    HeatmapData, TaskAchievement,
};
use crate::models::settings::{
    AnalyticsSettings, DEFAULT_CONSISTENCY_WINDOW_DAYS, DEFAULT_SNAPSHOT_WINDOW_DAYS,
};
use crate::models::task::TaskRecord;
use crate::models::time_entry::TimeEntryRecord;
use crate::services::achievements::{find_most_completed, find_most_time_spent};
use crate::services::activity_aggregator::build_daily_activities;
use crate::services::analytics_utils::local_date;
use crate::services::focus_score::{card_focus_from_activities, compute_period_focus_score};
use crate::services::heatmap::project_heatmap;
use crate::services::productivity_metrics::{
    average_time_per_task_ms, build_snapshot, completion_stats, task_completion_rate,
};
use crate::utils::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsConfig {
    pub timezone: Tz,
    pub snapshot_window_days: u32,
    pub consistency_window_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            snapshot_window_days: DEFAULT_SNAPSHOT_WINDOW_DAYS,
            consistency_window_days: DEFAULT_CONSISTENCY_WINDOW_DAYS,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_settings(settings: &AnalyticsSettings) -> AppResult<Self> {
        let timezone: Tz = settings
            .timezone
            .trim()
            .parse()
            .map_err(|err| AppError::validation(format!("无效的时区 {}: {err}", settings.timezone)))?;
        Ok(Self {
            timezone,
            snapshot_window_days: settings.snapshot_window_days,
            consistency_window_days: settings.consistency_window_days,
        })
    }
}

/// Records read once per computation so every figure in a result comes from
/// the same view of the stores.
#[derive(Debug, Clone)]
pub struct AnalyticsInputs {
    pub tasks: Vec<TaskRecord>,
    pub entries: Vec<TimeEntryRecord>,
    pub now: DateTime<Utc>,
    pub config: AnalyticsConfig,
}

impl AnalyticsInputs {
    pub fn today(&self) -> NaiveDate {
        local_date(self.now, self.config.timezone)
    }

    pub fn daily_activities(&self, range: &DateRange) -> Vec<DailyActivity> {
        build_daily_activities(
            &self.tasks,
            &self.entries,
            range,
            self.config.timezone,
            self.now,
        )
    }
}

/// Analytics over the task and time entry stores.
///
/// Two tiers: the period getters recompute from the repositories on every
/// call and never cache, while [`AnalyticsService::recalculate_snapshot`]
/// builds the rolling-window aggregate and swaps it in for
/// [`AnalyticsService::snapshot`] readers. Public getters never fail; errors
/// are logged and a neutral value is returned.
pub struct AnalyticsService {
    tasks: Arc<dyn TaskRepository>,
    time_entries: Arc<dyn TimeEntryRepository>,
    clock: Arc<dyn Clock>,
    config: RwLock<AnalyticsConfig>,
    snapshot: RwLock<Arc<AnalyticsSnapshot>>,
}

impl AnalyticsService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        time_entries: Arc<dyn TimeEntryRepository>,
        clock: Arc<dyn Clock>,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            tasks,
            time_entries,
            clock,
            config: RwLock::new(config),
            snapshot: RwLock::new(Arc::new(AnalyticsSnapshot::empty())),
        }
    }

    pub fn config(&self) -> AnalyticsConfig {
        *self
            .config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn apply_settings(&self, settings: &AnalyticsSettings) -> AppResult<()> {
        let next = AnalyticsConfig::from_settings(settings)?;
        let mut guard = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = next;
        info!(
            target: "app::analytics",
            timezone = next.timezone.name(),
            snapshot_window_days = next.snapshot_window_days,
            "analytics settings applied"
        );
        Ok(())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today in the configured zone.
    pub fn today(&self) -> NaiveDate {
        local_date(self.clock.now(), self.config().timezone)
    }

    pub fn load_inputs(&self) -> AppResult<AnalyticsInputs> {
        let tasks = self.tasks.list_tasks()?;
        let entries = self.time_entries.list_time_entries()?;
        Ok(AnalyticsInputs {
            tasks,
            entries,
            now: self.clock.now(),
            config: self.config(),
        })
    }

    pub fn daily_activities(
        &self,
        period: AnalyticsPeriod,
        reference: NaiveDate,
    ) -> Vec<DailyActivity> {
        recover(
            self.try_daily_activities(period, reference),
            "daily_activities",
            Vec::new,
        )
    }

    pub fn heatmap_data(&self, period: AnalyticsPeriod, reference: NaiveDate) -> Vec<HeatmapData> {
        recover(
            self.try_daily_activities(period, reference)
                .map(|days| project_heatmap(&days)),
            "heatmap_data",
            Vec::new,
        )
    }

    pub fn most_time_spent_task(
        &self,
        period: AnalyticsPeriod,
        reference: NaiveDate,
    ) -> Option<TaskAchievement> {
        recover(
            self.load_inputs().map(|inputs| {
                let range = DateRange::resolve(period, reference);
                find_most_time_spent(
                    &inputs.tasks,
                    &inputs.entries,
                    &range,
                    inputs.config.timezone,
                )
            }),
            "most_time_spent_task",
            || None,
        )
    }

    pub fn most_completed_task(
        &self,
        period: AnalyticsPeriod,
        reference: NaiveDate,
    ) -> Option<TaskAchievement> {
        recover(
            self.load_inputs().map(|inputs| {
                let range = DateRange::resolve(period, reference);
                find_most_completed(&inputs.tasks, &range, inputs.config.timezone)
            }),
            "most_completed_task",
            || None,
        )
    }

    /// Percent of tasks created in the current `period` that are completed.
    pub fn task_completion_rate(&self, period: AnalyticsPeriod) -> f64 {
        recover(
            self.load_inputs().map(|inputs| {
                let range = DateRange::current(period, inputs.today());
                task_completion_rate(&inputs.tasks, &range, inputs.config.timezone)
            }),
            "task_completion_rate",
            || 0.0,
        )
    }

    /// Milliseconds tracked per distinct task in the current `period`.
    pub fn average_time_per_task(&self, period: AnalyticsPeriod) -> f64 {
        recover(
            self.load_inputs().map(|inputs| {
                let range = DateRange::current(period, inputs.today());
                average_time_per_task_ms(
                    &inputs.entries,
                    &range,
                    inputs.config.timezone,
                    inputs.now,
                )
            }),
            "average_time_per_task",
            || 0.0,
        )
    }

    /// Period-scoped focus score (completion rate and time-per-task curve).
    pub fn focus_score(&self, period: AnalyticsPeriod) -> u32 {
        recover(
            self.load_inputs().map(|inputs| {
                let range = DateRange::current(period, inputs.today());
                let tz = inputs.config.timezone;
                let rate = task_completion_rate(&inputs.tasks, &range, tz);
                let average = average_time_per_task_ms(&inputs.entries, &range, tz, inputs.now);
                compute_period_focus_score(rate, average)
            }),
            "focus_score",
            || 0,
        )
    }

    /// Card focus score over the buckets of `period` around `reference`.
    pub fn card_focus_score(&self, period: AnalyticsPeriod, reference: NaiveDate) -> FocusScore {
        let window = self.config().consistency_window_days;
        let days = self.daily_activities(period, reference);
        card_focus_from_activities(&days, window)
    }

    pub fn completion_stats(
        &self,
        period: AnalyticsPeriod,
        reference: NaiveDate,
    ) -> CompletionStats {
        completion_stats(&self.daily_activities(period, reference))
    }

    /// Rebuilds the rolling snapshot. A failed rebuild leaves the empty
    /// snapshot in place.
    pub fn recalculate_snapshot(&self) {
        let next = match self.try_build_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(
                    target: "app::analytics",
                    error = %err,
                    "analytics snapshot recalculation failed"
                );
                AnalyticsSnapshot::empty()
            }
        };
        self.store_snapshot(Arc::new(next));
    }

    pub fn snapshot(&self) -> Arc<AnalyticsSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => {
                warn!(target: "app::analytics", "snapshot lock poisoned; reading through");
                Arc::clone(&poisoned.into_inner())
            }
        }
    }

    fn try_daily_activities(
        &self,
        period: AnalyticsPeriod,
        reference: NaiveDate,
    ) -> AppResult<Vec<DailyActivity>> {
        let inputs = self.load_inputs()?;
        let range = DateRange::resolve(period, reference);
        Ok(inputs.daily_activities(&range))
    }

    fn try_build_snapshot(&self) -> AppResult<AnalyticsSnapshot> {
        let inputs = self.load_inputs()?;
        let window_days = inputs.config.snapshot_window_days;
        Ok(build_snapshot(
            &inputs.tasks,
            &inputs.entries,
            inputs.today(),
            window_days,
            inputs.config.timezone,
            inputs.now,
        ))
    }

    fn store_snapshot(&self, snapshot: Arc<AnalyticsSnapshot>) {
        let buckets = snapshot.daily_activity.len();
        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(target: "app::analytics", "snapshot lock poisoned; overwriting");
                poisoned.into_inner()
            }
        };
        *guard = snapshot;
        debug!(target: "app::analytics", buckets, "analytics snapshot stored");
    }
}

fn recover<T>(result: AppResult<T>, operation: &'static str, fallback: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!(
                target: "app::analytics",
                error = %err,
                operation,
                "analytics computation failed; returning fallback"
            );
            fallback()
        }
    }
}
