use async_trait::async_trait;

use crate::entity::{self, project};
use crate::error::{AppError, AppResult};
use crate::repositories::{purge_tasks, Database, Repository, Tables};

/// Project repository
pub struct ProjectRepository;

#[async_trait]
impl Repository<project::Model> for ProjectRepository {
    async fn find_by_id(db: &Database, id: i64) -> AppResult<project::Model> {
        db.read()
            .await
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Project".to_string()))
    }

    async fn count(db: &Database) -> AppResult<u64> {
        Ok(db.read().await.projects.len() as u64)
    }
}

/// Drop a project with its milestones, tasks and their comments
fn cascade_delete(tables: &mut Tables, project_id: i64) {
    let task_ids: Vec<i64> = tables
        .tasks
        .values()
        .filter(|t| t.project_id == project_id)
        .map(|t| t.id)
        .collect();
    purge_tasks(tables, &task_ids);
    tables.milestones.retain(|_, m| m.project_id != project_id);
    tables.projects.remove(&project_id);
}

/// Ownership check shared by every project-scoped repository
pub(crate) fn owned<'a>(
    tables: &'a Tables,
    project_id: i64,
    user_id: i64,
) -> AppResult<&'a project::Model> {
    tables
        .projects
        .get(&project_id)
        .filter(|p| p.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("Project".to_string()))
}

impl ProjectRepository {
    /// Delete a project regardless of owner, with everything under it
    pub async fn delete(db: &Database, id: i64) -> AppResult<()> {
        let mut tables = db.write().await;
        if !tables.projects.contains_key(&id) {
            return Err(AppError::NotFound("Project".to_string()));
        }
        cascade_delete(&mut tables, id);
        Ok(())
    }

    /// Create a new project
    pub async fn create(
        db: &Database,
        user_id: i64,
        input: &project::Input,
    ) -> AppResult<project::Model> {
        let mut tables = db.write().await;
        let now = entity::now();

        let model = project::Model {
            id: tables.next_id(),
            user_id,
            title: input.title.clone(),
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(model.id, model.clone());
        Ok(model)
    }

    /// Find project by ID and verify ownership
    pub async fn find_by_id_and_user(
        db: &Database,
        id: i64,
        user_id: i64,
    ) -> AppResult<project::Model> {
        let tables = db.read().await;
        owned(&tables, id, user_id).cloned()
    }

    /// List projects for a specific user, oldest first
    pub async fn list_by_user(db: &Database, user_id: i64) -> AppResult<Vec<project::Model>> {
        Ok(db
            .read()
            .await
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    /// Update project (with ownership check)
    pub async fn update(
        db: &Database,
        id: i64,
        user_id: i64,
        input: &project::Input,
    ) -> AppResult<project::Model> {
        let mut tables = db.write().await;
        owned(&tables, id, user_id)?;

        let model = tables
            .projects
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Project".to_string()))?;
        model.title = input.title.clone();
        model.description = input.description.clone();
        model.updated_at = entity::now();

        Ok(model.clone())
    }

    /// Delete project (with ownership check)
    pub async fn delete_by_user(db: &Database, id: i64, user_id: i64) -> AppResult<()> {
        let mut tables = db.write().await;
        owned(&tables, id, user_id)?;
        cascade_delete(&mut tables, id);
        Ok(())
    }
}
