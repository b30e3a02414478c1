use serde::Serialize;

use crate::models::time_entry::TimeEntryRecord;

use super::{AppState, CommandResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDuration {
    pub task_id: String,
    pub duration_ms: i64,
}

pub fn timer_start(state: &AppState, task_id: String) -> CommandResult<TimeEntryRecord> {
    let entry = state.timer().start_timer(&task_id)?;
    state.analytics().recalculate_snapshot();
    Ok(entry)
}

pub fn timer_stop(state: &AppState) -> CommandResult<Vec<TimeEntryRecord>> {
    let stopped = state.timer().stop_timer()?;
    if !stopped.is_empty() {
        state.analytics().recalculate_snapshot();
    }
    Ok(stopped)
}

pub fn timer_active(state: &AppState) -> CommandResult<Option<TimeEntryRecord>> {
    Ok(state.timer().active_entry()?)
}

pub fn timer_task_duration(state: &AppState, task_id: String) -> CommandResult<TaskDuration> {
    let duration_ms = state.timer().task_duration_ms(&task_id)?;
    Ok(TaskDuration {
        task_id,
        duration_ms,
    })
}

pub fn timer_entries(state: &AppState) -> CommandResult<Vec<TimeEntryRecord>> {
    Ok(state.timer().list_entries()?)
}
