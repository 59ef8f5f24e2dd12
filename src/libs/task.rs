//! Task model shared by the store, the renderer and the reconciliation engine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Todo,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::Done => "DONE",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    /// Checkbox character used for this status in the agenda file.
    pub fn marker(&self) -> char {
        match self {
            TaskStatus::Todo => ' ',
            TaskStatus::Done => 'x',
            TaskStatus::Cancelled => 'c',
        }
    }

    /// Inverse of [`TaskStatus::marker`]. Any other character is unparsable.
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            ' ' => Some(TaskStatus::Todo),
            'x' => Some(TaskStatus::Done),
            'c' => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "DONE" => Ok(TaskStatus::Done),
            "CANCELLED" | "CANCELED" => Ok(TaskStatus::Cancelled),
            other => Err(format!("unknown task status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i32>,
    pub title: String,
    pub body: Option<String>,
    pub due_dt: Option<NaiveDateTime>,
    pub status: TaskStatus,
    pub task_type: Option<String>,
    pub tags: Option<String>,
    pub source: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Task {
    pub fn new(title: &str, due_dt: Option<NaiveDateTime>) -> Self {
        Task {
            id: None,
            title: title.to_string(),
            body: None,
            due_dt,
            status: TaskStatus::Todo,
            task_type: None,
            tags: None,
            source: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_type(mut self, task_type: &str) -> Self {
        self.task_type = Some(task_type.to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Tag list split from the comma separated `tags` column.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Field updates for one task. `None` leaves a field untouched; `due_dt`
/// uses a nested option so that a due date can be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due_dt: Option<Option<NaiveDateTime>>,
    pub status: Option<TaskStatus>,
    pub body: Option<Option<String>>,
    pub task_type: Option<Option<String>>,
    pub tags: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Whether the patch touches a fingerprint input.
    pub fn changes_identity(&self) -> bool {
        self.title.is_some() || self.due_dt.is_some()
    }

    /// Returns the task as it would look after the patch.
    pub fn apply_to(&self, task: &Task) -> Task {
        let mut next = task.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(due_dt) = self.due_dt {
            next.due_dt = due_dt;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(body) = &self.body {
            next.body = body.clone();
        }
        if let Some(task_type) = &self.task_type {
            next.task_type = task_type.clone();
        }
        if let Some(tags) = &self.tags {
            next.tags = tags.clone();
        }
        next
    }
}

/// Sort keys for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortField {
    Id,
    #[default]
    #[value(name = "due_dt", alias = "due")]
    DueDt,
    Title,
    Status,
}

impl SortField {
    /// Newest first for ids, ascending for everything else.
    pub fn default_ascending(&self) -> bool {
        !matches!(self, SortField::Id)
    }
}

/// Listing query. Due bounds are exclusive and tasks without a due date
/// pass both of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub due_before: Option<NaiveDateTime>,
    pub due_after: Option<NaiveDateTime>,
    pub sort: SortField,
    /// `None` picks [`SortField::default_ascending`].
    pub ascending: Option<bool>,
    pub limit: Option<usize>,
}

impl TaskQuery {
    pub fn is_ascending(&self) -> bool {
        self.ascending.unwrap_or_else(|| self.sort.default_ascending())
    }
}

#[derive(Debug, Clone)]
pub enum TaskFilter {
    All,
    Query(TaskQuery),
    ByIds(Vec<i32>),
}
