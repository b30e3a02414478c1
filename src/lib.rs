pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

use crate::commands::AppState;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::utils::clock::SystemClock;

const DATABASE_FILE: &str = "taskflow.sqlite";
const SETTINGS_FILE: &str = "analytics-settings.json";
const LOG_DIR: &str = "logs";

/// Wires logging, storage and services under `data_dir`.
pub fn bootstrap(data_dir: &Path) -> AppResult<AppState> {
    std::fs::create_dir_all(data_dir)?;

    let settings_path = data_dir.join(SETTINGS_FILE);
    let directives = crate::services::settings_service::SettingsService::new(
        Some(settings_path.clone()),
        Arc::new(SystemClock),
    )
    .get()
    .map(|settings| settings.log_directives)
    .ok();
    crate::utils::logger::init_logging(&data_dir.join(LOG_DIR), directives.as_deref())?;

    let pool = DbPool::new(data_dir.join(DATABASE_FILE))?;
    AppState::with_database(pool, Some(settings_path), Arc::new(SystemClock))
}
