use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::models::analytics::{
    AnalyticsDashboard, AnalyticsPeriod, AnalyticsSnapshot, CompletionStats, DailyActivity,
    FocusScore, HeatmapData, TaskAchievement,
};

use super::{AppState, CommandResult};

/// Query shared by the period-scoped analytics commands. Both fields are
/// optional: the period defaults to `week`, the date to today.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsQueryParams {
    pub period: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFocusResponse {
    pub period: AnalyticsPeriod,
    pub score: u32,
    pub completion_rate: f64,
    pub average_time_per_task_ms: f64,
}

pub fn analytics_daily_activities(
    state: &AppState,
    params: Option<AnalyticsQueryParams>,
) -> CommandResult<Vec<DailyActivity>> {
    let (period, reference) = resolve_query(state, params)?;
    Ok(state.analytics().daily_activities(period, reference))
}

pub fn analytics_heatmap(
    state: &AppState,
    params: Option<AnalyticsQueryParams>,
) -> CommandResult<Vec<HeatmapData>> {
    let (period, reference) = resolve_query(state, params)?;
    Ok(state.analytics().heatmap_data(period, reference))
}

pub fn analytics_most_time_spent(
    state: &AppState,
    params: Option<AnalyticsQueryParams>,
) -> CommandResult<Option<TaskAchievement>> {
    let (period, reference) = resolve_query(state, params)?;
    Ok(state.analytics().most_time_spent_task(period, reference))
}

pub fn analytics_most_completed(
    state: &AppState,
    params: Option<AnalyticsQueryParams>,
) -> CommandResult<Option<TaskAchievement>> {
    let (period, reference) = resolve_query(state, params)?;
    Ok(state.analytics().most_completed_task(period, reference))
}

pub fn analytics_completion_stats(
    state: &AppState,
    params: Option<AnalyticsQueryParams>,
) -> CommandResult<CompletionStats> {
    let (period, reference) = resolve_query(state, params)?;
    Ok(state.analytics().completion_stats(period, reference))
}

pub fn analytics_card_focus(
    state: &AppState,
    params: Option<AnalyticsQueryParams>,
) -> CommandResult<FocusScore> {
    let (period, reference) = resolve_query(state, params)?;
    Ok(state.analytics().card_focus_score(period, reference))
}

/// Rate, average and focus for the period containing today.
pub fn analytics_period_focus(
    state: &AppState,
    period: Option<String>,
) -> CommandResult<PeriodFocusResponse> {
    let period = parse_period(period.as_deref());
    let analytics = state.analytics();
    Ok(PeriodFocusResponse {
        period,
        score: analytics.focus_score(period),
        completion_rate: analytics.task_completion_rate(period),
        average_time_per_task_ms: analytics.average_time_per_task(period),
    })
}

pub fn analytics_snapshot(state: &AppState) -> CommandResult<AnalyticsSnapshot> {
    Ok(state.analytics().snapshot().as_ref().clone())
}

pub fn analytics_recalculate(state: &AppState) -> CommandResult<AnalyticsSnapshot> {
    let analytics = state.analytics();
    analytics.recalculate_snapshot();
    Ok(analytics.snapshot().as_ref().clone())
}

pub fn analytics_dashboard(
    state: &AppState,
    params: Option<AnalyticsQueryParams>,
) -> CommandResult<AnalyticsDashboard> {
    let (period, reference) = resolve_query(state, params)?;
    Ok(state.dashboard().build(period, reference))
}

fn resolve_query(
    state: &AppState,
    params: Option<AnalyticsQueryParams>,
) -> CommandResult<(AnalyticsPeriod, NaiveDate)> {
    let params = params.unwrap_or_default();
    let period = parse_period(params.period.as_deref());
    let reference = match params.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_reference_date(raw)?,
        _ => state.analytics().today(),
    };
    debug!(
        target: "app::command",
        period = period.as_str(),
        %reference,
        "analytics query resolved"
    );
    Ok((period, reference))
}

fn parse_period(raw: Option<&str>) -> AnalyticsPeriod {
    raw.map(AnalyticsPeriod::parse).unwrap_or_default()
}

fn parse_reference_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| {
        AppError::validation_with_details(
            "日期格式非法，应为 YYYY-MM-DD",
            serde_json::json!({ "date": raw, "reason": err.to_string() }),
        )
    })
}
