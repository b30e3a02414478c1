use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Calendar-aligned aggregation granularity. Anything unrecognised falls back
/// to the trailing eight-day window ending at the reference date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsPeriod {
    Day,
    #[default]
    Week,
    Month,
    Year,
    #[serde(other)]
    Trailing,
}

impl AnalyticsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsPeriod::Day => "day",
            AnalyticsPeriod::Week => "week",
            AnalyticsPeriod::Month => "month",
            AnalyticsPeriod::Year => "year",
            AnalyticsPeriod::Trailing => "trailing",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => AnalyticsPeriod::Day,
            "week" => AnalyticsPeriod::Week,
            "month" => AnalyticsPeriod::Month,
            "year" => AnalyticsPeriod::Year,
            _ => AnalyticsPeriod::Trailing,
        }
    }
}

const TRAILING_WINDOW_DAYS: u64 = 7;

/// Inclusive range of local calendar days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Resolves `period` around `reference`. Weeks run Monday to Sunday.
    pub fn resolve(period: AnalyticsPeriod, reference: NaiveDate) -> Self {
        match period {
            AnalyticsPeriod::Day => Self::single(reference),
            AnalyticsPeriod::Week => Self::week_containing(reference, Weekday::Mon),
            AnalyticsPeriod::Month => {
                let start = reference.with_day(1).unwrap_or(reference);
                let end = start
                    .checked_add_months(chrono::Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(reference);
                Self::new(start, end)
            }
            AnalyticsPeriod::Year => {
                let start = NaiveDate::from_ymd_opt(reference.year(), 1, 1).unwrap_or(reference);
                let end = NaiveDate::from_ymd_opt(reference.year(), 12, 31).unwrap_or(reference);
                Self::new(start, end)
            }
            AnalyticsPeriod::Trailing => {
                let start = reference
                    .checked_sub_days(Days::new(TRAILING_WINDOW_DAYS))
                    .unwrap_or(reference);
                Self::new(start, reference)
            }
        }
    }

    /// "This" `period` around `today`. Weeks here run Sunday to Saturday;
    /// every other period resolves as usual.
    pub fn current(period: AnalyticsPeriod, today: NaiveDate) -> Self {
        match period {
            AnalyticsPeriod::Week => Self::week_containing(today, Weekday::Sun),
            other => Self::resolve(other, today),
        }
    }

    /// Seven days starting on `first`. Clipped at the ends of the calendar.
    pub fn week_containing(reference: NaiveDate, first: Weekday) -> Self {
        let offset =
            (reference.weekday().num_days_from_monday() + 7 - first.num_days_from_monday()) % 7;
        let start = reference
            .checked_sub_days(Days::new(u64::from(offset)))
            .unwrap_or(reference);
        let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
        Self::new(start, end)
    }

    /// The `days` days before `end` plus `end` itself.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(end);
        Self::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub task_count: u32,
    pub completed_count: u32,
    pub hours_spent: f64,
}

impl DailyActivity {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            task_count: 0,
            completed_count: 0,
            hours_spent: 0.0,
        }
    }
}

/// Legend bucket for a heatmap intensity score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapLevel {
    None,
    Low,
    Medium,
    High,
    Peak,
}

impl HeatmapLevel {
    pub fn from_intensity(intensity: u32) -> Self {
        match intensity {
            0 => HeatmapLevel::None,
            1..=2 => HeatmapLevel::Low,
            3..=5 => HeatmapLevel::Medium,
            6..=10 => HeatmapLevel::High,
            _ => HeatmapLevel::Peak,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeatmapLevel::None => "none",
            HeatmapLevel::Low => "low",
            HeatmapLevel::Medium => "medium",
            HeatmapLevel::High => "high",
            HeatmapLevel::Peak => "peak",
        }
    }
}

/// One heatmap cell. `count` is a weighted intensity score, not an event count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapData {
    pub date: NaiveDate,
    pub count: u32,
    pub level: HeatmapLevel,
}

impl HeatmapData {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self {
            date,
            count,
            level: HeatmapLevel::from_intensity(count),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityMetric {
    pub label: String,
    pub value: i64,
    pub change: i64,
}

impl ProductivityMetric {
    pub fn new(label: impl Into<String>, value: i64, change: i64) -> Self {
        Self {
            label: label.into(),
            value,
            change,
        }
    }
}

pub const TASKS_COMPLETED_LABEL: &str = "Tasks Completed";
pub const TIME_TRACKED_LABEL: &str = "Time Tracked (hrs)";
pub const FOCUS_SCORE_LABEL: &str = "Focus Score";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityMetrics {
    pub tasks_completed: ProductivityMetric,
    pub time_tracked: ProductivityMetric,
    pub focus_score: ProductivityMetric,
}

impl Default for ProductivityMetrics {
    fn default() -> Self {
        Self {
            tasks_completed: ProductivityMetric::new(TASKS_COMPLETED_LABEL, 0, 0),
            time_tracked: ProductivityMetric::new(TIME_TRACKED_LABEL, 0, 0),
            focus_score: ProductivityMetric::new(FOCUS_SCORE_LABEL, 0, 0),
        }
    }
}

/// Superlative over a period. Only `hours` is meaningful for the most-time
/// achievement and only `count` for the most-completed one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskAchievement {
    pub task_name: String,
    pub hours: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AchievementKind {
    MostTimeSpent,
    MostCompleted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AchievementOfDay {
    pub kind: AchievementKind,
    pub task_id: String,
    pub task_title: String,
    /// Milliseconds for `MostTimeSpent`, a count for `MostCompleted`.
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FocusScore {
    pub score: u32,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub completion_rate: u32,
    pub total_hours: f64,
    pub average_hours_per_task: f64,
    pub average_tasks_per_day: f64,
}

/// Rolling-window aggregate produced by an explicit recalculation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub generated_at: Option<DateTime<Utc>>,
    pub range: Option<DateRange>,
    pub daily_activity: Vec<DailyActivity>,
    pub heatmap: Vec<HeatmapData>,
    pub productivity_metrics: ProductivityMetrics,
    pub achievement_of_day: Option<AchievementOfDay>,
}

impl AnalyticsSnapshot {
    pub fn empty() -> Self {
        Self {
            generated_at: None,
            range: None,
            daily_activity: Vec::new(),
            heatmap: Vec::new(),
            productivity_metrics: ProductivityMetrics::default(),
            achievement_of_day: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.generated_at.is_none()
    }
}

impl Default for AnalyticsSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsDashboard {
    pub period: AnalyticsPeriod,
    pub reference_date: NaiveDate,
    pub range: DateRange,
    pub daily_activities: Vec<DailyActivity>,
    pub heatmap: Vec<HeatmapData>,
    pub most_time_spent: Option<TaskAchievement>,
    pub most_completed: Option<TaskAchievement>,
    pub stats: CompletionStats,
    pub focus: FocusScore,
    pub metrics: ProductivityMetrics,
    pub achievement_of_day: Option<AchievementOfDay>,
}
