use crate::error::{ClientError, ClientResult};

/// The kinds of REST resources the client can address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Project,
    Milestone,
    Task,
    /// Tasks listed through their milestone (read-only)
    MilestoneTask,
    Comment,
}

/// Ids of the resources that enclose the one being addressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParentIds {
    pub project: Option<i64>,
    pub milestone: Option<i64>,
    pub task: Option<i64>,
}

impl ParentIds {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn project(project_id: i64) -> Self {
        Self {
            project: Some(project_id),
            ..Self::default()
        }
    }

    pub fn milestone(project_id: i64, milestone_id: i64) -> Self {
        Self {
            project: Some(project_id),
            milestone: Some(milestone_id),
            task: None,
        }
    }

    pub fn task(project_id: i64, task_id: i64) -> Self {
        Self {
            project: Some(project_id),
            milestone: None,
            task: Some(task_id),
        }
    }
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Milestone => "Milestone",
            Self::Task | Self::MilestoneTask => "Task",
            Self::Comment => "Comment",
        }
    }

    fn require(&self, id: Option<i64>, parent: &str) -> ClientResult<i64> {
        id.ok_or_else(|| {
            ClientError::Validation(format!("{} requires a {} id", self.name(), parent))
        })
    }

    /// Path of the collection, relative to `/api`
    pub fn collection_path(&self, parents: &ParentIds) -> ClientResult<String> {
        Ok(match self {
            Self::Project => "/projects".to_string(),
            Self::Milestone => {
                format!("/projects/{}/milestones", self.require(parents.project, "project")?)
            }
            Self::Task => format!("/projects/{}/tasks", self.require(parents.project, "project")?),
            Self::MilestoneTask => format!(
                "/projects/{}/milestones/{}/tasks",
                self.require(parents.project, "project")?,
                self.require(parents.milestone, "milestone")?
            ),
            Self::Comment => format!(
                "/projects/{}/tasks/{}/comments",
                self.require(parents.project, "project")?,
                self.require(parents.task, "task")?
            ),
        })
    }

    /// Path of a single resource, relative to `/api`
    pub fn item_path(&self, parents: &ParentIds, id: i64) -> ClientResult<String> {
        match self {
            Self::MilestoneTask => Err(ClientError::Validation(
                "Milestone task listings are read-only; address the task directly".to_string(),
            )),
            _ => Ok(format!("{}/{}", self.collection_path(parents)?, id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            ResourceKind::Project.collection_path(&ParentIds::none()).unwrap(),
            "/projects"
        );
        assert_eq!(
            ResourceKind::Project.item_path(&ParentIds::none(), 4).unwrap(),
            "/projects/4"
        );
        assert_eq!(
            ResourceKind::Milestone.item_path(&ParentIds::project(1), 5).unwrap(),
            "/projects/1/milestones/5"
        );
        assert_eq!(
            ResourceKind::MilestoneTask
                .collection_path(&ParentIds::milestone(1, 5))
                .unwrap(),
            "/projects/1/milestones/5/tasks"
        );
        assert_eq!(
            ResourceKind::Comment.item_path(&ParentIds::task(1, 9), 2).unwrap(),
            "/projects/1/tasks/9/comments/2"
        );
    }

    #[test]
    fn test_missing_parent_is_rejected() {
        let err = ResourceKind::Task
            .collection_path(&ParentIds::none())
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let err = ResourceKind::Comment
            .collection_path(&ParentIds::project(1))
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
