use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::task::{TaskPriority, TaskRecord, TaskStatus};

use super::{TaskRepository, TaskStore};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        title,
        description,
        status,
        priority,
        category_id,
        due_date,
        has_reminder,
        created_at,
        completed_at,
        updated_at
    FROM tasks
"#;

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub category_id: Option<String>,
    pub due_date: Option<String>,
    pub has_reminder: bool,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
    pub updated_at: Option<String>,
}

impl TaskRow {
    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            status: record.status.as_str().to_string(),
            priority: record.priority.as_str().to_string(),
            category_id: record.category_id.clone(),
            due_date: record.due_date.clone(),
            has_reminder: record.has_reminder,
            created_at: record.created_at.clone(),
            completed_at: record.completed_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<TaskRecord> {
        Ok(TaskRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            status: TaskStatus::parse(&self.status)?,
            priority: TaskPriority::parse(&self.priority)?,
            category_id: self.category_id,
            due_date: self.due_date,
            has_reminder: self.has_reminder,
            created_at: self.created_at,
            completed_at: self.completed_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for TaskRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(TaskRow {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            category_id: row.get("category_id")?,
            due_date: row.get("due_date")?,
            has_reminder: row.get::<_, i64>("has_reminder")? != 0,
            created_at: row.get("created_at")?,
            completed_at: row.get("completed_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Task table access on top of [`DbPool`].
#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    db: DbPool,
}

impl SqliteTaskRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn insert(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO tasks (
                    id,
                    title,
                    description,
                    status,
                    priority,
                    category_id,
                    due_date,
                    has_reminder,
                    created_at,
                    completed_at,
                    updated_at
                ) VALUES (
                    :id,
                    :title,
                    :description,
                    :status,
                    :priority,
                    :category_id,
                    :due_date,
                    :has_reminder,
                    :created_at,
                    :completed_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":description": &row.description,
                ":status": &row.status,
                ":priority": &row.priority,
                ":category_id": &row.category_id,
                ":due_date": &row.due_date,
                ":has_reminder": row.has_reminder as i64,
                ":created_at": &row.created_at,
                ":completed_at": &row.completed_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE tasks SET
                    title = :title,
                    description = :description,
                    status = :status,
                    priority = :priority,
                    category_id = :category_id,
                    due_date = :due_date,
                    has_reminder = :has_reminder,
                    created_at = :created_at,
                    completed_at = :completed_at,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":description": &row.description,
                ":status": &row.status,
                ":priority": &row.priority,
                ":category_id": &row.category_id,
                ":due_date": &row.due_date,
                ":has_reminder": row.has_reminder as i64,
                ":created_at": &row.created_at,
                ":completed_at": &row.completed_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<TaskRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", BASE_SELECT))?;
        let row = stmt
            .query_row([id], |row| TaskRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Newest insert first, matching the in-memory store.
    pub fn list_all(conn: &Connection) -> AppResult<Vec<TaskRow>> {
        let mut stmt = conn.prepare(&format!("{} ORDER BY rowid DESC", BASE_SELECT))?;
        let rows = stmt
            .query_map([], |row| TaskRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn list_tasks(&self) -> AppResult<Vec<TaskRecord>> {
        self.db.with_connection(|conn| {
            Self::list_all(conn)?
                .into_iter()
                .map(TaskRow::into_record)
                .collect()
        })
    }
}

impl TaskStore for SqliteTaskRepository {
    fn find_task(&self, id: &str) -> AppResult<Option<TaskRecord>> {
        self.db.with_connection(|conn| {
            Self::find_by_id(conn, id)?
                .map(TaskRow::into_record)
                .transpose()
        })
    }

    fn insert_task(&self, task: &TaskRecord) -> AppResult<()> {
        let row = TaskRow::from_record(task);
        self.db.with_connection(|conn| Self::insert(conn, &row))
    }

    fn update_task(&self, task: &TaskRecord) -> AppResult<()> {
        let row = TaskRow::from_record(task);
        self.db.with_connection(|conn| Self::update(conn, &row))
    }

    fn delete_task(&self, id: &str) -> AppResult<()> {
        self.db.with_connection(|conn| Self::delete(conn, id))
    }
}
