// SQLite-backed task store, the single source of truth

use crate::error::{Error, Result};
use crate::events::{EventBus, TaskEvent};
use crate::models::{DATE_FORMAT, NewTask, Task, TaskFilter, TaskRecord};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "uuid, image_uri, task_desc, due_date, complete";

/// Durable CRUD and query surface over the task collection.
///
/// All operations run synchronously on the calling thread; change
/// notifications fire on the [`EventBus`] after the mutation has been
/// committed, still inside the mutating call.
pub struct TaskStore {
    db: Connection,
    events: EventBus,
}

impl TaskStore {
    /// Open or create a store at the given database path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let db = Connection::open(path)?;
        let store = Self { db, events: EventBus::new() };
        store.create_schema()?;
        Ok(store)
    }

    /// Open a transient in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let store = Self { db: Connection::open_in_memory()?, events: EventBus::new() };
        store.create_schema()?;
        Ok(store)
    }

    /// The bus this store publishes change notifications on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn create_schema(&self) -> Result<()> {
        debug!("creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS todo (
                uuid TEXT PRIMARY KEY,
                image_uri TEXT NOT NULL,
                task_desc TEXT NOT NULL,
                due_date TEXT NOT NULL,
                complete INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_todo_complete_due_date ON todo (complete, due_date);
            "#,
        )?;

        Ok(())
    }

    /// Persist a new task, generating an id and filling defaults where the
    /// input leaves them out. Fails with [`Error::DuplicateKey`] when an
    /// explicit id collides with an existing row.
    pub fn create(&mut self, new: NewTask) -> Result<Task> {
        let task = new.into_task();

        let result = self.db.execute(
            "INSERT INTO todo (uuid, image_uri, task_desc, due_date, complete)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                task.id.to_string(),
                task.image_uri,
                task.description,
                task.due_date.format(DATE_FORMAT).to_string(),
                task.complete,
            ],
        );

        match result {
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::DuplicateKey(task.id));
            }
            other => other?,
        };

        debug!(id = %task.id, "created task");
        self.events.emit(&TaskEvent::Added(task.clone()));
        Ok(task)
    }

    /// Fetch a task by id.
    pub fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let mut stmt = self
            .db
            .prepare(&format!("SELECT {SELECT_COLUMNS} FROM todo WHERE uuid = ?1"))?;

        let task = stmt.query_row(params![id.to_string()], task_from_row).optional()?;
        Ok(task)
    }

    /// Replace every mutable field of the row matching `task.id`. Fails
    /// with [`Error::NotFound`] when no such row exists; never inserts.
    pub fn update(&mut self, task: &Task) -> Result<()> {
        let rows = self.db.execute(
            "UPDATE todo SET image_uri = ?1, task_desc = ?2, due_date = ?3, complete = ?4
             WHERE uuid = ?5",
            params![
                task.image_uri,
                task.description,
                task.due_date.format(DATE_FORMAT).to_string(),
                task.complete,
                task.id.to_string(),
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(task.id));
        }

        debug!(id = %task.id, "edited task");
        self.events.emit(&TaskEvent::Edited(task.clone()));
        Ok(())
    }

    /// Remove a task. Deleting an absent id succeeds silently; the
    /// `Deleted` notification fires only when a row actually went away.
    pub fn delete(&mut self, id: Uuid) -> Result<()> {
        let rows = self
            .db
            .execute("DELETE FROM todo WHERE uuid = ?1", params![id.to_string()])?;

        if rows > 0 {
            debug!(id = %id, "deleted task");
            self.events.emit(&TaskEvent::Deleted(id));
        }
        Ok(())
    }

    /// Remove every task.
    pub fn clear(&mut self) -> Result<()> {
        self.db.execute("DELETE FROM todo", [])?;
        info!("cleared all tasks");
        self.events.emit(&TaskEvent::Cleared);
        Ok(())
    }

    /// Number of tasks matching the filter.
    pub fn count(&self, filter: TaskFilter) -> Result<u64> {
        let count: i64 = match filter.complete() {
            None => self.db.query_row("SELECT COUNT(*) FROM todo", [], |row| row.get(0))?,
            Some(complete) => self.db.query_row(
                "SELECT COUNT(*) FROM todo WHERE complete = ?1",
                params![complete],
                |row| row.get(0),
            )?,
        };
        Ok(count as u64)
    }

    /// Up to `limit` tasks matching the filter, ordered by due date
    /// ascending (id as tie-break), skipping the first `offset` matches.
    /// A zero limit yields an empty page.
    pub fn page(&self, filter: TaskFilter, offset: u64, limit: u64) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();

        match filter.complete() {
            None => {
                let mut stmt = self.db.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM todo
                     ORDER BY due_date ASC, uuid ASC LIMIT ?1 OFFSET ?2"
                ))?;
                let rows = stmt.query_map(params![limit as i64, offset as i64], task_from_row)?;
                for row in rows {
                    tasks.push(row?);
                }
            }
            Some(complete) => {
                let mut stmt = self.db.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM todo WHERE complete = ?1
                     ORDER BY due_date ASC, uuid ASC LIMIT ?2 OFFSET ?3"
                ))?;
                let rows = stmt
                    .query_map(params![complete, limit as i64, offset as i64], task_from_row)?;
                for row in rows {
                    tasks.push(row?);
                }
            }
        }

        Ok(tasks)
    }

    /// Insert every record as a single transaction: either all of them
    /// persist or, on any failure, none do. Each record gets a fresh id
    /// and defaults for missing fields; malformed records fail the whole
    /// import with [`Error::Import`] before the store is touched.
    pub fn import(&mut self, records: Vec<TaskRecord>) -> Result<usize> {
        let tasks: Vec<Task> = records
            .into_iter()
            .map(|record| record.into_task().map_err(Error::import))
            .collect::<Result<_>>()?;

        let tx = self.db.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO todo (uuid, image_uri, task_desc, due_date, complete)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for task in &tasks {
                stmt.execute(params![
                    task.id.to_string(),
                    task.image_uri,
                    task.description,
                    task.due_date.format(DATE_FORMAT).to_string(),
                    task.complete,
                ])?;
            }
        }
        tx.commit()?;

        let count = tasks.len();
        info!(count, "imported tasks");
        self.events.emit(&TaskEvent::Imported(count));
        Ok(count)
    }

    /// Every task as a wire record (no identifiers), in id fetch order.
    pub fn export_all(&self) -> Result<Vec<TaskRecord>> {
        let mut stmt = self
            .db
            .prepare(&format!("SELECT {SELECT_COLUMNS} FROM todo ORDER BY uuid ASC"))?;

        let rows = stmt.query_map([], task_from_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(TaskRecord::from(&row?));
        }
        Ok(records)
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore").field("events", &self.events).finish_non_exhaustive()
    }
}

/// Decode a row in `SELECT_COLUMNS` order. A stored id or date that no
/// longer parses is surfaced as a conversion failure, not a panic.
fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    let due_date: String = row.get(3)?;
    let due_date = NaiveDate::parse_from_str(&due_date, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(Task {
        id,
        image_uri: row.get(1)?,
        description: row.get(2)?,
        due_date,
        complete: row.get(4)?,
    })
}
