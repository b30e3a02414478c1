//! Heatmap projections. Cell values are intensity scores, not event counts.

use crate::models::analytics::{DailyActivity, HeatmapData};

/// Period view: `max(2 * completed, created)`.
pub fn project_heatmap(days: &[DailyActivity]) -> Vec<HeatmapData> {
    days.iter()
        .map(|day| HeatmapData::new(day.date, period_intensity(day)))
        .collect()
}

/// Rolling snapshot view: `completed + floor(hours)`.
pub fn project_snapshot_heatmap(days: &[DailyActivity]) -> Vec<HeatmapData> {
    days.iter()
        .map(|day| HeatmapData::new(day.date, snapshot_intensity(day)))
        .collect()
}

pub fn period_intensity(day: &DailyActivity) -> u32 {
    day.completed_count
        .saturating_mul(2)
        .max(day.task_count)
}

pub fn snapshot_intensity(day: &DailyActivity) -> u32 {
    let whole_hours = if day.hours_spent.is_finite() && day.hours_spent > 0.0 {
        day.hours_spent.floor() as u32
    } else {
        0
    };
    day.completed_count.saturating_add(whole_hours)
}
