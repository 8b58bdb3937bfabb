use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::error::ClientResult;
use crate::models::require_title;

/// Progress of a task.
///
/// This is the only completion representation inside the client. Backends
/// that speak a plain `completed` flag are mapped at the wire boundary.
/// Serialized through [`TaskStatus::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Completed];

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Todo
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    /// Case-insensitive inverse of `as_str`; `DONE` is accepted as completed
    fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_uppercase();
        if value == "DONE" {
            return Some(Self::Completed);
        }
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    /// Resolve the two wire representations: a recognized `status` string wins,
    /// otherwise the `completed` flag decides.
    pub fn from_wire(status: Option<&str>, completed: bool) -> Self {
        status
            .and_then(Self::parse)
            .unwrap_or_else(|| Self::from_completed(completed))
    }

    /// The status reached by toggling completion
    pub fn toggled(&self) -> Self {
        if self.is_completed() {
            Self::Todo
        } else {
            Self::Completed
        }
    }
}

impl From<TaskStatus> for &'static str {
    fn from(status: TaskStatus) -> Self {
        status.as_str()
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown task status `{}`", value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaskWire", into = "TaskWire")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub project_id: i64,
    pub milestone_id: Option<i64>,
    pub due_date: Option<PrimitiveDateTime>,
    pub created_at: Option<PrimitiveDateTime>,
    pub updated_at: Option<PrimitiveDateTime>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskWire {
    #[serde(default)]
    id: i64,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(default)]
    project_id: i64,
    // Always sent, `null` unlinks the task on update
    #[serde(default)]
    milestone_id: Option<i64>,
    #[serde(default, with = "crate::dates::lenient")]
    due_date: Option<PrimitiveDateTime>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::dates::lenient"
    )]
    created_at: Option<PrimitiveDateTime>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::dates::lenient"
    )]
    updated_at: Option<PrimitiveDateTime>,
}

impl From<TaskWire> for Task {
    fn from(w: TaskWire) -> Self {
        Self {
            id: w.id,
            title: w.title,
            description: w.description,
            status: TaskStatus::from_wire(w.status.as_deref(), w.completed),
            project_id: w.project_id,
            milestone_id: w.milestone_id,
            due_date: w.due_date,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

impl From<Task> for TaskWire {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            completed: t.status.is_completed(),
            status: Some(t.status.as_str().to_string()),
            project_id: t.project_id,
            milestone_id: t.milestone_id,
            due_date: t.due_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Payload for creating a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub milestone_id: Option<i64>,
    pub due_date: Option<PrimitiveDateTime>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn in_milestone(mut self, milestone_id: i64) -> Self {
        self.milestone_id = Some(milestone_id);
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        require_title("Task", &self.title)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewTaskWire<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    completed: bool,
    status: &'static str,
    milestone_id: Option<i64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::dates::lenient"
    )]
    due_date: Option<PrimitiveDateTime>,
}

impl Serialize for NewTask {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        NewTaskWire {
            title: &self.title,
            description: self.description.as_deref(),
            completed: self.status.is_completed(),
            status: self.status.as_str(),
            milestone_id: self.milestone_id,
            due_date: self.due_date,
        }
        .serialize(serializer)
    }
}
