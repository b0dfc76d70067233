// Data models for the todo store

use crate::error::{Error, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder used when a task is created or imported without a description.
pub const DEFAULT_DESCRIPTION: &str = "Unnamed Task";

/// A single to-do item, the only entity in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub image_uri: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub complete: bool,
}

impl Task {
    /// Which partition this task belongs to, determined solely by `complete`.
    pub fn partition(&self) -> Partition {
        if self.complete { Partition::Complete } else { Partition::Incomplete }
    }
}

/// Input for creating a task. Missing fields take defaults: empty image,
/// placeholder description, due today, incomplete.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    /// Explicit identifier; generated when `None`.
    pub id: Option<Uuid>,
    pub image_uri: String,
    pub description: String,
    /// Due date; today when `None`.
    pub due_date: Option<NaiveDate>,
    pub complete: bool,
}

impl NewTask {
    pub fn with_description(description: impl Into<String>) -> Self {
        Self { description: description.into(), ..Self::default() }
    }

    /// Materialize into a full task, generating the id and filling defaults.
    pub(crate) fn into_task(self) -> Task {
        Task {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            image_uri: self.image_uri,
            description: non_empty_or_default(self.description),
            due_date: self.due_date.unwrap_or_else(today),
            complete: self.complete,
        }
    }
}

/// Wire form of a task for import/export files: all fields except the
/// identifier. Unknown keys such as `uuid` are ignored on import; absent
/// `complete` reads as false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub image_uri: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub complete: bool,
}

impl TaskRecord {
    /// Validate and apply defaults, producing a task with a fresh id.
    /// Import never reuses caller-supplied identifiers.
    pub(crate) fn into_task(self) -> Result<Task> {
        Ok(Task {
            id: Uuid::new_v4(),
            image_uri: self.image_uri,
            description: non_empty_or_default(self.description),
            due_date: parse_due_date(&self.due_date)?,
            complete: self.complete,
        })
    }
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            image_uri: task.image_uri.clone(),
            description: task.description.clone(),
            due_date: task.due_date.format(DATE_FORMAT).to_string(),
            complete: task.complete,
        }
    }
}

/// Completion filter for counts and paged queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Complete,
    Incomplete,
}

impl TaskFilter {
    /// The `complete` column value this filter matches, `None` for all rows.
    pub(crate) fn complete(self) -> Option<bool> {
        match self {
            TaskFilter::All => None,
            TaskFilter::Complete => Some(true),
            TaskFilter::Incomplete => Some(false),
        }
    }
}

/// One of the two cached list partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Complete,
    Incomplete,
}

impl Partition {
    pub fn filter(self) -> TaskFilter {
        match self {
            Partition::Complete => TaskFilter::Complete,
            Partition::Incomplete => TaskFilter::Incomplete,
        }
    }
}

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's calendar date, the default due date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse an ISO `YYYY-MM-DD` due date. Empty strings take the default;
/// anything else unparsable is rejected rather than carried into the
/// store where it would poison the sort order.
pub(crate) fn parse_due_date(s: &str) -> Result<NaiveDate> {
    if s.is_empty() {
        return Ok(today());
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| Error::InvalidDate(s.to_string()))
}

fn non_empty_or_default(description: String) -> String {
    if description.is_empty() { DEFAULT_DESCRIPTION.to_string() } else { description }
}
