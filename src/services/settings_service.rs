use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::settings::AnalyticsSettings;
use crate::utils::clock::Clock;

pub const TIMEZONE_ENV: &str = "TASKFLOW_TIMEZONE";

const MIN_WINDOW_DAYS: u32 = 1;
const MAX_WINDOW_DAYS: u32 = 366;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdateInput {
    pub timezone: Option<String>,
    pub snapshot_window_days: Option<u32>,
    pub consistency_window_days: Option<u32>,
    pub log_directives: Option<String>,
}

/// Analytics settings backed by an optional JSON file. Without a file the
/// defaults are used and updates only live in memory.
pub struct SettingsService {
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    cache: RwLock<Option<AnalyticsSettings>>,
}

impl SettingsService {
    pub fn new(path: Option<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path,
            clock,
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> AppResult<AnalyticsSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let mut settings = self.load_from_file()?;
        apply_env_override(&mut settings, std::env::var(TIMEZONE_ENV).ok());
        validate(&settings)?;

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    pub fn update(&self, input: SettingsUpdateInput) -> AppResult<AnalyticsSettings> {
        let mut current = self.get()?;

        if let Some(timezone) = input.timezone {
            current.timezone = timezone.trim().to_string();
        }
        if let Some(days) = input.snapshot_window_days {
            current.snapshot_window_days = days;
        }
        if let Some(days) = input.consistency_window_days {
            current.consistency_window_days = days;
        }
        if let Some(directives) = input.log_directives {
            let trimmed = directives.trim();
            if trimmed.is_empty() {
                return Err(AppError::validation("日志过滤规则不能为空"));
            }
            current.log_directives = trimmed.to_string();
        }

        validate(&current)?;
        current.updated_at = Some(self.clock.now().to_rfc3339());
        self.persist(&current)?;

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(current.clone());
        }

        info!(
            target: "app::settings",
            timezone = %current.timezone,
            snapshot_window_days = current.snapshot_window_days,
            consistency_window_days = current.consistency_window_days,
            "analytics settings updated"
        );
        Ok(current)
    }

    fn load_from_file(&self) -> AppResult<AnalyticsSettings> {
        let Some(path) = self.path.as_ref() else {
            return Ok(AnalyticsSettings::default());
        };
        if !path.exists() {
            return Ok(AnalyticsSettings::default());
        }

        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            warn!(target: "app::settings", path = %path.display(), "settings file empty; using defaults");
            return Ok(AnalyticsSettings::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn persist(&self, settings: &AnalyticsSettings) -> AppResult<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(settings)?;
        fs::write(path, payload)?;
        Ok(())
    }
}

fn apply_env_override(settings: &mut AnalyticsSettings, value: Option<String>) {
    if let Some(timezone) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        info!(target: "app::settings", %timezone, "timezone overridden from environment");
        settings.timezone = timezone;
    }
}

fn validate(settings: &AnalyticsSettings) -> AppResult<()> {
    if settings.timezone.parse::<Tz>().is_err() {
        return Err(AppError::validation(format!(
            "无效的时区: {}",
            settings.timezone
        )));
    }
    ensure_window("snapshotWindowDays", settings.snapshot_window_days)?;
    ensure_window("consistencyWindowDays", settings.consistency_window_days)?;
    Ok(())
}

fn ensure_window(field: &str, days: u32) -> AppResult<()> {
    if (MIN_WINDOW_DAYS..=MAX_WINDOW_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(AppError::validation_with_details(
            format!("统计窗口需在 {MIN_WINDOW_DAYS} 到 {MAX_WINDOW_DAYS} 天之间"),
            serde_json::json!({ "field": field, "value": days }),
        ))
    }
}
