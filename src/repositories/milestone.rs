use async_trait::async_trait;

use crate::entity::{self, milestone};
use crate::error::{AppError, AppResult};
use crate::models::MilestoneDeletePolicy;
use crate::repositories::{purge_tasks, Database, Repository, Tables};

/// Milestone repository
pub struct MilestoneRepository;

#[async_trait]
impl Repository<milestone::Model> for MilestoneRepository {
    async fn find_by_id(db: &Database, id: i64) -> AppResult<milestone::Model> {
        db.read()
            .await
            .milestones
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Milestone".to_string()))
    }

    async fn count(db: &Database) -> AppResult<u64> {
        Ok(db.read().await.milestones.len() as u64)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Milestone".to_string())
}

/// Remove a milestone and apply the policy to its tasks.
/// Returns the ids of the affected tasks.
fn remove(tables: &mut Tables, id: i64, policy: MilestoneDeletePolicy) -> Vec<i64> {
    let task_ids: Vec<i64> = tables
        .tasks
        .values()
        .filter(|t| t.milestone_id == Some(id))
        .map(|t| t.id)
        .collect();

    match policy {
        MilestoneDeletePolicy::Unlink => {
            let now = entity::now();
            for task_id in &task_ids {
                if let Some(task) = tables.tasks.get_mut(task_id) {
                    task.milestone_id = None;
                    task.updated_at = now;
                }
            }
        }
        MilestoneDeletePolicy::Cascade => purge_tasks(tables, &task_ids),
    }

    tables.milestones.remove(&id);
    task_ids
}

impl MilestoneRepository {
    pub async fn create(
        db: &Database,
        project_id: i64,
        input: &milestone::Input,
    ) -> AppResult<milestone::Model> {
        let mut tables = db.write().await;
        let now = entity::now();

        let model = milestone::Model {
            id: tables.next_id(),
            project_id,
            title: input.title.clone(),
            description: input.description.clone(),
            start_date: input.start_date,
            due_date: input.due_date,
            completed: input.completed,
            created_at: now,
            updated_at: now,
        };
        tables.milestones.insert(model.id, model.clone());
        Ok(model)
    }

    /// Find a milestone that belongs to the given project
    pub async fn find_in_project(
        db: &Database,
        project_id: i64,
        id: i64,
    ) -> AppResult<milestone::Model> {
        db.read()
            .await
            .milestones
            .get(&id)
            .filter(|m| m.project_id == project_id)
            .cloned()
            .ok_or_else(not_found)
    }

    pub async fn list_by_project(db: &Database, project_id: i64) -> AppResult<Vec<milestone::Model>> {
        Ok(db
            .read()
            .await
            .milestones
            .values()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }

    pub async fn update(
        db: &Database,
        project_id: i64,
        id: i64,
        input: &milestone::Input,
    ) -> AppResult<milestone::Model> {
        let mut tables = db.write().await;
        let model = tables
            .milestones
            .get_mut(&id)
            .filter(|m| m.project_id == project_id)
            .ok_or_else(not_found)?;

        model.title = input.title.clone();
        model.description = input.description.clone();
        model.start_date = input.start_date;
        model.due_date = input.due_date;
        model.completed = input.completed;
        model.updated_at = entity::now();

        Ok(model.clone())
    }

    /// Delete a milestone of a project, unlinking or deleting its tasks
    pub async fn delete_with_policy(
        db: &Database,
        project_id: i64,
        id: i64,
        policy: MilestoneDeletePolicy,
    ) -> AppResult<Vec<i64>> {
        let mut tables = db.write().await;
        let belongs = tables
            .milestones
            .get(&id)
            .is_some_and(|m| m.project_id == project_id);
        if !belongs {
            return Err(not_found());
        }

        Ok(remove(&mut tables, id, policy))
    }
}
