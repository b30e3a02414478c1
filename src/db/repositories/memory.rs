use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{AppError, AppResult};
use crate::models::task::TaskRecord;
use crate::models::time_entry::TimeEntryRecord;

use super::{TaskRepository, TaskStore, TimeEntryRepository, TimeEntryStore};

/// Process-local task table. New tasks go to the front.
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<TaskRecord>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<TaskRecord>) -> Self {
        Self {
            tasks: RwLock::new(tasks),
        }
    }

    pub fn replace_all(&self, tasks: Vec<TaskRecord>) -> AppResult<()> {
        *write_guard(&self.tasks, "tasks")? = tasks;
        Ok(())
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn list_tasks(&self) -> AppResult<Vec<TaskRecord>> {
        Ok(read_guard(&self.tasks, "tasks")?.clone())
    }
}

impl TaskStore for InMemoryTaskRepository {
    fn find_task(&self, id: &str) -> AppResult<Option<TaskRecord>> {
        Ok(read_guard(&self.tasks, "tasks")?
            .iter()
            .find(|task| task.id == id)
            .cloned())
    }

    fn insert_task(&self, task: &TaskRecord) -> AppResult<()> {
        let mut tasks = write_guard(&self.tasks, "tasks")?;
        if tasks.iter().any(|existing| existing.id == task.id) {
            return Err(AppError::conflict(format!("任务已存在: {}", task.id)));
        }
        tasks.insert(0, task.clone());
        Ok(())
    }

    fn update_task(&self, task: &TaskRecord) -> AppResult<()> {
        let mut tasks = write_guard(&self.tasks, "tasks")?;
        match tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(())
            }
            None => Err(AppError::not_found()),
        }
    }

    fn delete_task(&self, id: &str) -> AppResult<()> {
        let mut tasks = write_guard(&self.tasks, "tasks")?;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Err(AppError::not_found());
        }
        Ok(())
    }
}

/// Process-local time entry table. New entries go to the back.
#[derive(Debug, Default)]
pub struct InMemoryTimeEntryRepository {
    entries: RwLock<Vec<TimeEntryRecord>>,
}

impl InMemoryTimeEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<TimeEntryRecord>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn replace_all(&self, entries: Vec<TimeEntryRecord>) -> AppResult<()> {
        *write_guard(&self.entries, "time_entries")? = entries;
        Ok(())
    }
}

impl TimeEntryRepository for InMemoryTimeEntryRepository {
    fn list_time_entries(&self) -> AppResult<Vec<TimeEntryRecord>> {
        Ok(read_guard(&self.entries, "time_entries")?.clone())
    }
}

impl TimeEntryStore for InMemoryTimeEntryRepository {
    fn insert_time_entry(&self, entry: &TimeEntryRecord) -> AppResult<()> {
        let mut entries = write_guard(&self.entries, "time_entries")?;
        if entries.iter().any(|existing| existing.id == entry.id) {
            return Err(AppError::conflict(format!("计时记录已存在: {}", entry.id)));
        }
        entries.push(entry.clone());
        Ok(())
    }

    fn update_time_entry(&self, entry: &TimeEntryRecord) -> AppResult<()> {
        let mut entries = write_guard(&self.entries, "time_entries")?;
        match entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(slot) => {
                *slot = entry.clone();
                Ok(())
            }
            None => Err(AppError::not_found()),
        }
    }
}

fn read_guard<'a, T>(lock: &'a RwLock<T>, table: &str) -> AppResult<RwLockReadGuard<'a, T>> {
    lock.read()
        .map_err(|_| AppError::other(format!("内存表读取失败: {table}")))
}

fn write_guard<'a, T>(lock: &'a RwLock<T>, table: &str) -> AppResult<RwLockWriteGuard<'a, T>> {
    lock.write()
        .map_err(|_| AppError::other(format!("内存表写入失败: {table}")))
}
