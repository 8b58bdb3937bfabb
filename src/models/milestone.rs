use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::error::ClientResult;
use crate::models::{require_title, Task};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_id: i64,
    #[serde(default, with = "crate::dates::lenient")]
    pub start_date: Option<PrimitiveDateTime>,
    #[serde(default, with = "crate::dates::lenient")]
    pub due_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, with = "crate::dates::lenient")]
    pub created_at: Option<PrimitiveDateTime>,
    #[serde(default, with = "crate::dates::lenient")]
    pub updated_at: Option<PrimitiveDateTime>,
}

/// Payload for creating a milestone
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMilestone {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::dates::lenient"
    )]
    pub start_date: Option<PrimitiveDateTime>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::dates::lenient"
    )]
    pub due_date: Option<PrimitiveDateTime>,
    pub completed: bool,
}

impl NewMilestone {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        require_title("Milestone", &self.title)
    }
}

/// What happens to a milestone's tasks when the milestone is deleted.
///
/// Chosen once per store so that every call site agrees with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum MilestoneDeletePolicy {
    /// Tasks survive with their `milestone_id` cleared
    #[default]
    Unlink,
    /// Tasks are deleted along with the milestone
    Cascade,
}

impl FromStr for MilestoneDeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unlink" => Ok(Self::Unlink),
            "cascade" => Ok(Self::Cascade),
            other => Err(format!("unknown milestone delete policy: {}", other)),
        }
    }
}
