use std::convert::TryFrom;

use rusqlite::{named_params, Connection, Row};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::time_entry::TimeEntryRecord;

use super::{TimeEntryRepository, TimeEntryStore};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        task_id,
        start_time,
        end_time
    FROM time_entries
"#;

#[derive(Debug, Clone)]
pub struct TimeEntryRow {
    pub id: String,
    pub task_id: String,
    pub start_time: String,
    pub end_time: Option<String>,
}

impl From<&TimeEntryRecord> for TimeEntryRow {
    fn from(record: &TimeEntryRecord) -> Self {
        Self {
            id: record.id.clone(),
            task_id: record.task_id.clone(),
            start_time: record.start_time.clone(),
            end_time: record.end_time.clone(),
        }
    }
}

impl From<TimeEntryRow> for TimeEntryRecord {
    fn from(row: TimeEntryRow) -> Self {
        Self {
            id: row.id,
            task_id: row.task_id,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

impl TryFrom<&Row<'_>> for TimeEntryRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(TimeEntryRow {
            id: row.get("id")?,
            task_id: row.get("task_id")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteTimeEntryRepository {
    db: DbPool,
}

impl SqliteTimeEntryRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn insert(conn: &Connection, row: &TimeEntryRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO time_entries (id, task_id, start_time, end_time)
                VALUES (:id, :task_id, :start_time, :end_time)
            "#,
            named_params! {
                ":id": &row.id,
                ":task_id": &row.task_id,
                ":start_time": &row.start_time,
                ":end_time": &row.end_time,
            },
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, row: &TimeEntryRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE time_entries SET
                    task_id = :task_id,
                    start_time = :start_time,
                    end_time = :end_time
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":task_id": &row.task_id,
                ":start_time": &row.start_time,
                ":end_time": &row.end_time,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    /// Insertion order, matching the in-memory store.
    pub fn list_all(conn: &Connection) -> AppResult<Vec<TimeEntryRow>> {
        let mut stmt = conn.prepare(&format!("{} ORDER BY rowid ASC", BASE_SELECT))?;
        let rows = stmt
            .query_map([], |row| TimeEntryRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl TimeEntryRepository for SqliteTimeEntryRepository {
    fn list_time_entries(&self) -> AppResult<Vec<TimeEntryRecord>> {
        self.db.with_connection(|conn| {
            Ok(Self::list_all(conn)?
                .into_iter()
                .map(TimeEntryRecord::from)
                .collect())
        })
    }
}

impl TimeEntryStore for SqliteTimeEntryRepository {
    fn insert_time_entry(&self, entry: &TimeEntryRecord) -> AppResult<()> {
        let row = TimeEntryRow::from(entry);
        self.db.with_connection(|conn| Self::insert(conn, &row))
    }

    fn update_time_entry(&self, entry: &TimeEntryRecord) -> AppResult<()> {
        let row = TimeEntryRow::from(entry);
        self.db.with_connection(|conn| Self::update(conn, &row))
    }
}
