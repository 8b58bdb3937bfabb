use async_trait::async_trait;

use crate::entity::{self, task};
use crate::error::{AppError, AppResult};
use crate::repositories::{purge_tasks, Database, Repository, Tables};

/// Task repository
pub struct TaskRepository;

#[async_trait]
impl Repository<task::Model> for TaskRepository {
    async fn find_by_id(db: &Database, id: i64) -> AppResult<task::Model> {
        db.read()
            .await
            .tasks
            .get(&id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn count(db: &Database) -> AppResult<u64> {
        Ok(db.read().await.tasks.len() as u64)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Task".to_string())
}

/// A task may only point at a milestone of its own project
fn check_milestone(tables: &Tables, project_id: i64, milestone_id: Option<i64>) -> AppResult<()> {
    match milestone_id {
        None => Ok(()),
        Some(id) => match tables.milestones.get(&id) {
            Some(m) if m.project_id == project_id => Ok(()),
            _ => Err(AppError::Validation(format!(
                "Milestone {} does not belong to project {}",
                id, project_id
            ))),
        },
    }
}

impl TaskRepository {
    pub async fn create(
        db: &Database,
        project_id: i64,
        input: &task::Input,
    ) -> AppResult<task::Model> {
        let mut tables = db.write().await;
        check_milestone(&tables, project_id, input.milestone_id)?;
        let now = entity::now();

        let model = task::Model {
            id: tables.next_id(),
            project_id,
            milestone_id: input.milestone_id,
            title: input.title.clone(),
            description: input.description.clone(),
            status: input.status,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(model.id, model.clone());
        Ok(model)
    }

    /// Find a task that belongs to the given project
    pub async fn find_in_project(db: &Database, project_id: i64, id: i64) -> AppResult<task::Model> {
        db.read()
            .await
            .tasks
            .get(&id)
            .filter(|t| t.project_id == project_id)
            .cloned()
            .ok_or_else(not_found)
    }

    pub async fn list_by_project(db: &Database, project_id: i64) -> AppResult<Vec<task::Model>> {
        Ok(db
            .read()
            .await
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    pub async fn list_by_milestone(
        db: &Database,
        project_id: i64,
        milestone_id: i64,
    ) -> AppResult<Vec<task::Model>> {
        Ok(db
            .read()
            .await
            .tasks
            .values()
            .filter(|t| t.project_id == project_id && t.milestone_id == Some(milestone_id))
            .cloned()
            .collect())
    }

    /// Replace a task's columns; `milestone_id: None` unlinks it
    pub async fn update(
        db: &Database,
        project_id: i64,
        id: i64,
        input: &task::Input,
    ) -> AppResult<task::Model> {
        let mut tables = db.write().await;
        check_milestone(&tables, project_id, input.milestone_id)?;

        let model = tables
            .tasks
            .get_mut(&id)
            .filter(|t| t.project_id == project_id)
            .ok_or_else(not_found)?;

        model.title = input.title.clone();
        model.description = input.description.clone();
        model.status = input.status;
        model.milestone_id = input.milestone_id;
        model.due_date = input.due_date;
        model.updated_at = entity::now();

        Ok(model.clone())
    }

    pub async fn delete_in_project(db: &Database, project_id: i64, id: i64) -> AppResult<()> {
        let mut tables = db.write().await;
        let belongs = tables
            .tasks
            .get(&id)
            .is_some_and(|t| t.project_id == project_id);
        if !belongs {
            return Err(not_found());
        }

        purge_tasks(&mut tables, &[id]);
        Ok(())
    }
}
