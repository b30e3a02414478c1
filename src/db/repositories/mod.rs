pub mod memory;
pub mod task_repository;
pub mod time_entry_repository;

use crate::error::AppResult;
use crate::models::task::TaskRecord;
use crate::models::time_entry::TimeEntryRecord;

pub use memory::{InMemoryTaskRepository, InMemoryTimeEntryRepository};
pub use task_repository::SqliteTaskRepository;
pub use time_entry_repository::SqliteTimeEntryRepository;

/// Read side consumed by analytics. Implementations return the full
/// collection in store order; callers filter client-side.
pub trait TaskRepository: Send + Sync {
    fn list_tasks(&self) -> AppResult<Vec<TaskRecord>>;
}

pub trait TimeEntryRepository: Send + Sync {
    fn list_time_entries(&self) -> AppResult<Vec<TimeEntryRecord>>;
}

pub trait TaskStore: TaskRepository {
    fn find_task(&self, id: &str) -> AppResult<Option<TaskRecord>>;

    fn insert_task(&self, task: &TaskRecord) -> AppResult<()>;

    /// Fails with `NotFound` when no task has `task.id`.
    fn update_task(&self, task: &TaskRecord) -> AppResult<()>;

    fn delete_task(&self, id: &str) -> AppResult<()>;
}

pub trait TimeEntryStore: TimeEntryRepository {
    fn insert_time_entry(&self, entry: &TimeEntryRecord) -> AppResult<()>;

    fn update_time_entry(&self, entry: &TimeEntryRecord) -> AppResult<()>;
}
