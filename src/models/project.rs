use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::error::{ClientError, ClientResult};
use crate::models::{Milestone, Task};

/// A project with its milestones and tasks, as mirrored by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, with = "crate::dates::lenient")]
    pub created_at: Option<PrimitiveDateTime>,
    #[serde(default, with = "crate::dates::lenient")]
    pub updated_at: Option<PrimitiveDateTime>,
}

impl Project {
    pub fn milestone(&self, milestone_id: i64) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == milestone_id)
    }

    pub fn milestone_mut(&mut self, milestone_id: i64) -> Option<&mut Milestone> {
        self.milestones.iter_mut().find(|m| m.id == milestone_id)
    }

    pub fn task(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Tasks of this project that point at the given milestone
    pub fn tasks_in_milestone(&self, milestone_id: i64) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(move |t| t.milestone_id == Some(milestone_id))
    }
}

/// Payload for creating a project
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewProject {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        require_title("Project", &self.title)
    }
}

/// Reject blank titles before anything is sent
pub fn require_title(entity: &str, title: &str) -> ClientResult<()> {
    if title.trim().is_empty() {
        return Err(ClientError::Validation(format!("{} title is required", entity)));
    }
    Ok(())
}
