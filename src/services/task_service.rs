use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::db::repositories::TaskStore;
use crate::error::{AppError, AppResult};
use crate::models::task::{
    TaskCreateInput, TaskPriority, TaskRecord, TaskStatus, TaskUpdateInput,
};
use crate::services::analytics_utils::parse_timestamp;
use crate::utils::clock::Clock;

const MAX_TITLE_CHARS: usize = 200;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn create_task(&self, input: TaskCreateInput) -> AppResult<TaskRecord> {
        let now = self.clock.now().to_rfc3339();
        let status = normalize_status(input.status)?;

        let created_at = normalize_datetime_opt(input.created_at)?.unwrap_or_else(|| now.clone());
        let mut completed_at = normalize_datetime_opt(input.completed_at)?;
        if status == TaskStatus::Completed && completed_at.is_none() {
            completed_at = Some(now.clone());
        }

        let record = TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: normalize_title(&input.title)?,
            description: normalize_optional_string(input.description),
            status,
            priority: normalize_priority(input.priority)?,
            category_id: normalize_optional_string(input.category_id),
            due_date: normalize_due_date(input.due_date)?,
            has_reminder: input.has_reminder.unwrap_or(false),
            created_at: Some(created_at),
            completed_at,
            updated_at: Some(now),
        };

        self.store.insert_task(&record)?;
        info!(target: "app::tasks", task_id = %record.id, status = record.status.as_str(), "task created");
        Ok(record)
    }

    pub fn update_task(&self, id: &str, update: TaskUpdateInput) -> AppResult<TaskRecord> {
        let mut existing = self.get_task(id)?;
        let now = self.clock.now().to_rfc3339();
        apply_update(&mut existing, update, &now)?;
        existing.updated_at = Some(now);

        self.store.update_task(&existing)?;
        info!(target: "app::tasks", task_id = %existing.id, status = existing.status.as_str(), "task updated");
        Ok(existing)
    }

    pub fn delete_task(&self, id: &str) -> AppResult<()> {
        self.store.delete_task(id)?;
        info!(target: "app::tasks", task_id = %id, "task deleted");
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> AppResult<TaskRecord> {
        self.store.find_task(id)?.ok_or_else(AppError::not_found)
    }

    pub fn list_tasks(&self) -> AppResult<Vec<TaskRecord>> {
        let tasks = self.store.list_tasks()?;
        debug!(target: "app::tasks", count = tasks.len(), "tasks listed");
        Ok(tasks)
    }
}

fn apply_update(record: &mut TaskRecord, update: TaskUpdateInput, now: &str) -> AppResult<()> {
    if let Some(title) = update.title {
        record.title = normalize_title(&title)?;
    }

    if let Some(description) = update.description {
        record.description = normalize_optional_string(description);
    }

    if let Some(priority) = update.priority {
        record.priority = normalize_priority(Some(priority))?;
    }

    if let Some(category_id) = update.category_id {
        record.category_id = normalize_optional_string(category_id);
    }

    if let Some(due_date) = update.due_date {
        record.due_date = normalize_due_date(due_date)?;
    }

    if let Some(has_reminder) = update.has_reminder {
        record.has_reminder = has_reminder;
    }

    let explicit_completed_at = match update.completed_at {
        Some(value) => Some(normalize_datetime_opt(value)?),
        None => None,
    };

    if let Some(status) = update.status {
        let next = normalize_status(Some(status))?;
        let was_completed = record.status == TaskStatus::Completed;
        record.status = next;

        if next == TaskStatus::Completed && !was_completed && record.completed_at.is_none() {
            record.completed_at = Some(now.to_string());
        } else if next != TaskStatus::Completed && explicit_completed_at.is_none() {
            record.completed_at = None;
        }
    }

    if let Some(completed_at) = explicit_completed_at {
        record.completed_at = completed_at;
    }

    Ok(())
}

fn normalize_title(title: &str) -> AppResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("标题不能为空"));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::validation(format!(
            "标题长度需在 {MAX_TITLE_CHARS} 字以内"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_status(status: Option<String>) -> AppResult<TaskStatus> {
    match status {
        Some(value) => TaskStatus::parse(&value),
        None => Ok(TaskStatus::default()),
    }
}

fn normalize_priority(priority: Option<String>) -> AppResult<TaskPriority> {
    match priority {
        Some(value) => TaskPriority::parse(&value),
        None => Ok(TaskPriority::default()),
    }
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|val| {
        let trimmed = val.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn normalize_datetime_opt(value: Option<String>) -> AppResult<Option<String>> {
    if let Some(value) = value {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        parse_timestamp(trimmed).ok_or_else(|| AppError::validation("时间格式非法"))?;
        Ok(Some(trimmed.to_string()))
    } else {
        Ok(None)
    }
}

/// Accepts a calendar date or a full timestamp.
fn normalize_due_date(value: Option<String>) -> AppResult<Option<String>> {
    match normalize_optional_string(value) {
        Some(raw) => {
            let valid = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").is_ok()
                || parse_timestamp(&raw).is_some();
            if valid {
                Ok(Some(raw))
            } else {
                Err(AppError::validation("截止日期格式非法"))
            }
        }
        None => Ok(None),
    }
}
