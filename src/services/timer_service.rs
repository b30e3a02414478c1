use std::sync::Arc;

use tracing::info;

use crate::db::repositories::TimeEntryStore;
use crate::error::{AppError, AppResult};
use crate::models::time_entry::TimeEntryRecord;
use crate::services::analytics_utils::entry_duration_ms;
use crate::utils::clock::Clock;

/// Start/stop time tracking on top of the time entry store.
#[derive(Clone)]
pub struct TimerService {
    store: Arc<dyn TimeEntryStore>,
    clock: Arc<dyn Clock>,
}

impl TimerService {
    pub fn new(store: Arc<dyn TimeEntryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Opens an entry for `task_id`, or returns the one already running.
    pub fn start_timer(&self, task_id: &str) -> AppResult<TimeEntryRecord> {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(AppError::validation("任务 ID 不能为空"));
        }

        if let Some(running) = self
            .store
            .list_time_entries()?
            .into_iter()
            .find(|entry| entry.task_id == task_id && entry.is_open())
        {
            return Ok(running);
        }

        let entry = TimeEntryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            start_time: self.clock.now().to_rfc3339(),
            end_time: None,
        };
        self.store.insert_time_entry(&entry)?;
        info!(target: "app::timer", entry_id = %entry.id, task_id = %entry.task_id, "timer started");
        Ok(entry)
    }

    /// Closes every running entry at the current time.
    pub fn stop_timer(&self) -> AppResult<Vec<TimeEntryRecord>> {
        let end = self.clock.now().to_rfc3339();
        let mut stopped = Vec::new();
        for mut entry in self.store.list_time_entries()? {
            if !entry.is_open() {
                continue;
            }
            entry.end_time = Some(end.clone());
            self.store.update_time_entry(&entry)?;
            info!(target: "app::timer", entry_id = %entry.id, task_id = %entry.task_id, "timer stopped");
            stopped.push(entry);
        }
        Ok(stopped)
    }

    /// Total tracked milliseconds for `task_id`, running entries included.
    pub fn task_duration_ms(&self, task_id: &str) -> AppResult<i64> {
        let now = self.clock.now();
        Ok(self
            .store
            .list_time_entries()?
            .iter()
            .filter(|entry| entry.task_id == task_id)
            .filter_map(|entry| entry_duration_ms(entry, now))
            .sum())
    }

    pub fn active_entry(&self) -> AppResult<Option<TimeEntryRecord>> {
        Ok(self
            .store
            .list_time_entries()?
            .into_iter()
            .find(TimeEntryRecord::is_open))
    }

    pub fn list_entries(&self) -> AppResult<Vec<TimeEntryRecord>> {
        self.store.list_time_entries()
    }
}
