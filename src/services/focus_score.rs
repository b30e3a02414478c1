//! Focus-score heuristics. The card score reads a run of daily buckets; the
//! period score reads completion rate and average time per task.

use crate::models::analytics::{DailyActivity, FocusScore};
use crate::services::analytics_utils::safe_ratio;

const COMPLETION_WEIGHT: f64 = 30.0;
const CONSISTENCY_WEIGHT: f64 = 40.0;
const PRODUCTIVITY_WEIGHT: f64 = 30.0;

const IDEAL_HOURS_LOW: f64 = 4.0;
const IDEAL_HOURS_HIGH: f64 = 6.0;
const OVERWORK_PENALTY_PER_HOUR: f64 = 5.0;

/// Peak of the period score's time bell curve: 30 minutes per task.
const IDEAL_MS_PER_TASK: f64 = 1_800_000.0;

pub const EMPTY_FOCUS_MESSAGE: &str = "Start tracking your productivity to see your focus score";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardFocusInputs {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub days_active: u32,
    pub average_hours_per_day: f64,
}

impl CardFocusInputs {
    /// `days_active` is the number of buckets supplied, active or not.
    pub fn from_activities(days: &[DailyActivity]) -> Self {
        let total_tasks = days.iter().map(|day| day.task_count).sum();
        let completed_tasks = days.iter().map(|day| day.completed_count).sum();
        let total_hours: f64 = days.iter().map(|day| day.hours_spent).sum();
        let days_active = u32::try_from(days.len()).unwrap_or(u32::MAX);

        Self {
            total_tasks,
            completed_tasks,
            days_active,
            average_hours_per_day: safe_ratio(total_hours, f64::from(days_active)),
        }
    }
}

pub fn completion_component(inputs: &CardFocusInputs) -> f64 {
    if inputs.total_tasks == 0 {
        return 0.0;
    }
    let ratio = safe_ratio(
        f64::from(inputs.completed_tasks),
        f64::from(inputs.total_tasks),
    );
    (ratio * COMPLETION_WEIGHT).min(COMPLETION_WEIGHT)
}

pub fn consistency_component(inputs: &CardFocusInputs, window_days: u32) -> f64 {
    let window = f64::from(window_days.max(1));
    (f64::from(inputs.days_active) / window * CONSISTENCY_WEIGHT).min(CONSISTENCY_WEIGHT)
}

/// Full marks for 4 to 6 hours a day, ramping up below and decaying above.
pub fn productivity_component(average_hours_per_day: f64) -> f64 {
    let avg = average_hours_per_day;
    if !avg.is_finite() || avg <= 0.0 {
        return 0.0;
    }
    if avg < IDEAL_HOURS_LOW {
        (avg / IDEAL_HOURS_LOW) * PRODUCTIVITY_WEIGHT
    } else if avg <= IDEAL_HOURS_HIGH {
        PRODUCTIVITY_WEIGHT
    } else {
        (PRODUCTIVITY_WEIGHT - (avg - IDEAL_HOURS_HIGH) * OVERWORK_PENALTY_PER_HOUR).max(0.0)
    }
}

pub fn focus_message(score: u32) -> &'static str {
    if score >= 85 {
        "Exceptional focus! You're in the productivity zone."
    } else if score >= 70 {
        "Great focus habits forming. Keep it up!"
    } else if score >= 50 {
        "Good progress. Try to improve consistency."
    } else {
        "Building focus takes time. Set small, achievable goals."
    }
}

pub fn compute_card_focus_score(inputs: &CardFocusInputs, window_days: u32) -> FocusScore {
    let total = completion_component(inputs)
        + consistency_component(inputs, window_days)
        + productivity_component(inputs.average_hours_per_day);
    let score = total.round().clamp(0.0, 100.0) as u32;

    FocusScore {
        score,
        message: focus_message(score).to_string(),
    }
}

/// Card score straight from buckets, with the empty-state message when there
/// are none.
pub fn card_focus_from_activities(days: &[DailyActivity], window_days: u32) -> FocusScore {
    if days.is_empty() {
        return FocusScore {
            score: 0,
            message: EMPTY_FOCUS_MESSAGE.to_string(),
        };
    }
    compute_card_focus_score(&CardFocusInputs::from_activities(days), window_days)
}

/// Bell curve over average milliseconds per task, 0..=100.
pub fn time_score(average_ms_per_task: f64) -> f64 {
    if !average_ms_per_task.is_finite() || average_ms_per_task <= 0.0 {
        return 0.0;
    }
    let spread = (average_ms_per_task - IDEAL_MS_PER_TASK) / IDEAL_MS_PER_TASK;
    (100.0 * (-(spread * spread)).exp()).min(100.0)
}

/// `round((completion_rate + time_score) / 2)`, with the rate in percent.
pub fn compute_period_focus_score(completion_rate: f64, average_ms_per_task: f64) -> u32 {
    let rate = if completion_rate.is_finite() {
        completion_rate.clamp(0.0, 100.0)
    } else {
        0.0
    };
    ((rate + time_score(average_ms_per_task)) / 2.0)
        .round()
        .clamp(0.0, 100.0) as u32
}
