pub mod analytics;
pub mod settings;
pub mod task;
pub mod timer;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, info};

use crate::db::repositories::{
    InMemoryTaskRepository, InMemoryTimeEntryRepository, SqliteTaskRepository,
    SqliteTimeEntryRepository, TaskRepository, TaskStore, TimeEntryRepository, TimeEntryStore,
};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::AnalyticsSettings;
use crate::services::analytics_service::{AnalyticsConfig, AnalyticsService};
use crate::services::dashboard_service::DashboardService;
use crate::services::settings_service::{SettingsService, SettingsUpdateInput};
use crate::services::task_service::TaskService;
use crate::services::timer_service::TimerService;
use crate::utils::clock::Clock;

#[derive(Clone)]
pub struct AppState {
    task_service: Arc<TaskService>,
    timer_service: Arc<TimerService>,
    analytics_service: Arc<AnalyticsService>,
    dashboard_service: Arc<DashboardService>,
    settings_service: Arc<SettingsService>,
}

impl AppState {
    /// Volatile stores; settings come from `settings_path` when given.
    pub fn in_memory(settings_path: Option<PathBuf>, clock: Arc<dyn Clock>) -> AppResult<Self> {
        Self::with_stores(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::new(InMemoryTimeEntryRepository::new()),
            SettingsService::new(settings_path, Arc::clone(&clock)),
            clock,
        )
    }

    pub fn with_database(
        db_pool: DbPool,
        settings_path: Option<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        Self::with_stores(
            Arc::new(SqliteTaskRepository::new(db_pool.clone())),
            Arc::new(SqliteTimeEntryRepository::new(db_pool)),
            SettingsService::new(settings_path, Arc::clone(&clock)),
            clock,
        )
    }

    pub fn with_stores<T, E>(
        tasks: Arc<T>,
        time_entries: Arc<E>,
        settings_service: SettingsService,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self>
    where
        T: TaskStore + 'static,
        E: TimeEntryStore + 'static,
    {
        let settings = settings_service.get()?;
        let config = AnalyticsConfig::from_settings(&settings)?;

        let task_store: Arc<dyn TaskStore> = tasks.clone();
        let task_reader: Arc<dyn TaskRepository> = tasks;
        let entry_store: Arc<dyn TimeEntryStore> = time_entries.clone();
        let entry_reader: Arc<dyn TimeEntryRepository> = time_entries;

        let analytics_service = Arc::new(AnalyticsService::new(
            task_reader,
            entry_reader,
            Arc::clone(&clock),
            config,
        ));
        analytics_service.recalculate_snapshot();

        info!(
            target: "app::command",
            timezone = %settings.timezone,
            "application state initialized"
        );

        Ok(Self {
            task_service: Arc::new(TaskService::new(task_store, Arc::clone(&clock))),
            timer_service: Arc::new(TimerService::new(entry_store, clock)),
            dashboard_service: Arc::new(DashboardService::new(Arc::clone(&analytics_service))),
            analytics_service,
            settings_service: Arc::new(settings_service),
        })
    }

    pub fn tasks(&self) -> Arc<TaskService> {
        Arc::clone(&self.task_service)
    }

    pub fn timer(&self) -> Arc<TimerService> {
        Arc::clone(&self.timer_service)
    }

    pub fn analytics(&self) -> Arc<AnalyticsService> {
        Arc::clone(&self.analytics_service)
    }

    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard_service)
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }

    /// Persists new settings and rebuilds the snapshot under them.
    pub fn update_settings(&self, input: SettingsUpdateInput) -> AppResult<AnalyticsSettings> {
        let settings = self.settings_service.update(input)?;
        self.analytics_service.apply_settings(&settings)?;
        self.analytics_service.recalculate_snapshot();
        Ok(settings)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::NotFound => CommandError::new("NOT_FOUND", "请求的资源不存在", None),
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "序列化失败", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "文件系统读写失败", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}
