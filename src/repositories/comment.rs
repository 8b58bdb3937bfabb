use async_trait::async_trait;

use crate::entity::{self, comment};
use crate::error::{AppError, AppResult};
use crate::repositories::{Database, Repository};

/// Comment repository
pub struct CommentRepository;

#[async_trait]
impl Repository<comment::Model> for CommentRepository {
    async fn find_by_id(db: &Database, id: i64) -> AppResult<comment::Model> {
        db.read()
            .await
            .comments
            .get(&id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn count(db: &Database) -> AppResult<u64> {
        Ok(db.read().await.comments.len() as u64)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Comment".to_string())
}

impl CommentRepository {
    pub async fn create(
        db: &Database,
        task_id: i64,
        user_id: i64,
        content: &str,
    ) -> AppResult<comment::Model> {
        let mut tables = db.write().await;
        let now = entity::now();

        let model = comment::Model {
            id: tables.next_id(),
            task_id,
            user_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(model.id, model.clone());
        Ok(model)
    }

    /// Comments of a task with their authors' names, oldest first
    pub async fn list_by_task(
        db: &Database,
        task_id: i64,
    ) -> AppResult<Vec<(comment::Model, Option<String>)>> {
        let tables = db.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.task_id == task_id)
            .map(|c| {
                let author = tables.users.get(&c.user_id).map(|u| u.name.clone());
                (c.clone(), author)
            })
            .collect())
    }

    /// Change the content of a comment; only its author may do so
    pub async fn update_by_author(
        db: &Database,
        task_id: i64,
        id: i64,
        user_id: i64,
        content: &str,
    ) -> AppResult<comment::Model> {
        let mut tables = db.write().await;
        let model = tables
            .comments
            .get_mut(&id)
            .filter(|c| c.task_id == task_id)
            .ok_or_else(not_found)?;

        if model.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can edit a comment".to_string(),
            ));
        }

        model.content = content.to_string();
        model.updated_at = entity::now();
        Ok(model.clone())
    }

    pub async fn delete_by_author(
        db: &Database,
        task_id: i64,
        id: i64,
        user_id: i64,
    ) -> AppResult<()> {
        let mut tables = db.write().await;
        let author = tables
            .comments
            .get(&id)
            .filter(|c| c.task_id == task_id)
            .map(|c| c.user_id)
            .ok_or_else(not_found)?;

        if author != user_id {
            return Err(AppError::Forbidden(
                "Only the author can delete a comment".to_string(),
            ));
        }

        tables.comments.remove(&id);
        Ok(())
    }
}
