use std::sync::Arc;

use chrono::NaiveDate;
use tracing::error;

use crate::error::AppResult;
use crate::models::analytics::{AnalyticsDashboard, AnalyticsPeriod, DateRange};
use crate::services::achievements::{find_most_completed, find_most_time_spent};
use crate::services::analytics_service::{AnalyticsInputs, AnalyticsService};
use crate::services::focus_score::card_focus_from_activities;
use crate::services::heatmap::project_heatmap;
use crate::services::productivity_metrics::completion_stats;

/// Assembles everything the analytics screen shows for one period from a
/// single read of the stores.
pub struct DashboardService {
    analytics: Arc<AnalyticsService>,
}

impl DashboardService {
    pub fn new(analytics: Arc<AnalyticsService>) -> Self {
        Self { analytics }
    }

    /// Never fails: on a store error the period's buckets come back zeroed.
    pub fn build(&self, period: AnalyticsPeriod, reference: NaiveDate) -> AnalyticsDashboard {
        match self.try_build(period, reference) {
            Ok(dashboard) => dashboard,
            Err(err) => {
                error!(
                    target: "app::analytics",
                    error = %err,
                    period = period.as_str(),
                    %reference,
                    "dashboard build failed; returning empty dashboard"
                );
                let config = self.analytics.config();
                let empty = AnalyticsInputs {
                    tasks: Vec::new(),
                    entries: Vec::new(),
                    now: self.analytics.now(),
                    config,
                };
                self.assemble(&empty, period, reference)
            }
        }
    }

    fn try_build(
        &self,
        period: AnalyticsPeriod,
        reference: NaiveDate,
    ) -> AppResult<AnalyticsDashboard> {
        let inputs = self.analytics.load_inputs()?;
        Ok(self.assemble(&inputs, period, reference))
    }

    fn assemble(
        &self,
        inputs: &AnalyticsInputs,
        period: AnalyticsPeriod,
        reference: NaiveDate,
    ) -> AnalyticsDashboard {
        let tz = inputs.config.timezone;
        let range = DateRange::resolve(period, reference);
        let daily_activities = inputs.daily_activities(&range);
        let heatmap = project_heatmap(&daily_activities);
        let stats = completion_stats(&daily_activities);
        let focus =
            card_focus_from_activities(&daily_activities, inputs.config.consistency_window_days);
        let snapshot = self.analytics.snapshot();

        AnalyticsDashboard {
            period,
            reference_date: reference,
            range,
            most_time_spent: find_most_time_spent(&inputs.tasks, &inputs.entries, &range, tz),
            most_completed: find_most_completed(&inputs.tasks, &range, tz),
            daily_activities,
            heatmap,
            stats,
            focus,
            metrics: snapshot.productivity_metrics.clone(),
            achievement_of_day: snapshot.achievement_of_day.clone(),
        }
    }
}
