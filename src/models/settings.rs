use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_SNAPSHOT_WINDOW_DAYS: u32 = 90;
pub const DEFAULT_CONSISTENCY_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_LOG_DIRECTIVES: &str = "info,app::analytics=debug,app::db=info";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsSettings {
    /// IANA zone used to decide which calendar day a timestamp falls on.
    pub timezone: String,
    pub snapshot_window_days: u32,
    /// Denominator of the consistency component of the card focus score.
    pub consistency_window_days: u32,
    pub log_directives: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            snapshot_window_days: DEFAULT_SNAPSHOT_WINDOW_DAYS,
            consistency_window_days: DEFAULT_CONSISTENCY_WINDOW_DAYS,
            log_directives: DEFAULT_LOG_DIRECTIVES.to_string(),
            updated_at: None,
        }
    }
}
