use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::task::{TaskCreateInput, TaskPriority, TaskRecord, TaskStatus, TaskUpdateInput};
use crate::services::analytics_utils::parse_timestamp;

use super::{AppState, CommandResult};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskListFilters {
    pub search: Option<String>,
    pub statuses: Option<Vec<String>>,
    pub priorities: Option<Vec<String>>,
    pub category_id: Option<String>,
    /// `createdAt`, `updatedAt`, `priority` or `status`; store order when unset.
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub items: Vec<TaskRecord>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

pub fn tasks_list(
    state: &AppState,
    filters: Option<TaskListFilters>,
) -> CommandResult<TaskListResponse> {
    let records = state.tasks().list_tasks()?;
    Ok(filter_and_paginate(records, filters.unwrap_or_default()))
}

pub fn tasks_get(state: &AppState, id: String) -> CommandResult<TaskRecord> {
    Ok(state.tasks().get_task(&id)?)
}

pub fn tasks_create(state: &AppState, payload: TaskCreateInput) -> CommandResult<TaskRecord> {
    let record = state.tasks().create_task(payload)?;
    state.analytics().recalculate_snapshot();
    Ok(record)
}

pub fn tasks_update(
    state: &AppState,
    id: String,
    payload: TaskUpdateInput,
) -> CommandResult<TaskRecord> {
    let record = state.tasks().update_task(&id, payload)?;
    state.analytics().recalculate_snapshot();
    Ok(record)
}

pub fn tasks_delete(state: &AppState, id: String) -> CommandResult<()> {
    state.tasks().delete_task(&id)?;
    state.analytics().recalculate_snapshot();
    Ok(())
}

fn filter_and_paginate(records: Vec<TaskRecord>, filters: TaskListFilters) -> TaskListResponse {
    let statuses = normalize_set(filters.statuses);
    let priorities = normalize_set(filters.priorities);
    let category = filters
        .category_id
        .map(|value| value.trim().to_string())
        .filter(|v| !v.is_empty());
    let search = filters
        .search
        .map(|value| value.trim().to_lowercase())
        .filter(|v| !v.is_empty());

    let mut filtered: Vec<TaskRecord> = records
        .into_iter()
        .filter(|task| {
            match_filters(
                task,
                &statuses,
                &priorities,
                category.as_deref(),
                search.as_deref(),
            )
        })
        .collect();

    if let Some(sort_by) = filters.sort_by.as_deref() {
        sort_tasks(&mut filtered, sort_by, filters.sort_order.as_deref());
    }

    let page = filters.page.unwrap_or(1).max(1);
    let page_size = filters
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let total = filtered.len();
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total);
    let items = if start >= total {
        Vec::new()
    } else {
        filtered[start..end].to_vec()
    };

    debug!(
        target: "app::command",
        total,
        page,
        page_size,
        returned = items.len(),
        "tasks_list"
    );

    TaskListResponse {
        items,
        total,
        page,
        page_size,
    }
}

fn match_filters(
    task: &TaskRecord,
    statuses: &HashSet<String>,
    priorities: &HashSet<String>,
    category: Option<&str>,
    search: Option<&str>,
) -> bool {
    if !statuses.is_empty() && !statuses.contains(task.status.as_str()) {
        return false;
    }

    if !priorities.is_empty() && !priorities.contains(task.priority.as_str()) {
        return false;
    }

    if let Some(category) = category {
        if task.category_id.as_deref() != Some(category) {
            return false;
        }
    }

    if let Some(search) = search {
        let in_title = task.title.to_lowercase().contains(search);
        let in_description = task
            .description
            .as_ref()
            .map(|desc| desc.to_lowercase().contains(search))
            .unwrap_or(false);
        if !in_title && !in_description {
            return false;
        }
    }

    true
}

fn sort_tasks(tasks: &mut [TaskRecord], sort_by: &str, sort_order: Option<&str>) {
    let order_desc = sort_order.unwrap_or("desc").eq_ignore_ascii_case("desc");

    tasks.sort_by(|a, b| {
        let ordering = match sort_by {
            "updatedAt" => compare_timestamp(a.updated_at.as_deref(), b.updated_at.as_deref()),
            "priority" => priority_rank(a.priority).cmp(&priority_rank(b.priority)),
            "status" => status_rank(a.status).cmp(&status_rank(b.status)),
            _ => compare_timestamp(a.created_at.as_deref(), b.created_at.as_deref()),
        };

        if order_desc {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_timestamp(a: Option<&str>, b: Option<&str>) -> Ordering {
    let ts_a = a.and_then(parse_timestamp);
    let ts_b = b.and_then(parse_timestamp);
    ts_a.cmp(&ts_b)
}

fn priority_rank(priority: TaskPriority) -> u8 {
    match priority {
        TaskPriority::Low => 0,
        TaskPriority::Medium => 1,
        TaskPriority::High => 2,
    }
}

fn status_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::Todo => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::Completed => 2,
    }
}

fn normalize_set(values: Option<Vec<String>>) -> HashSet<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}
