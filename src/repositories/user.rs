use async_trait::async_trait;

use crate::entity::{self, user};
use crate::error::{AppError, AppResult};
use crate::repositories::{Database, Repository};

/// User repository
pub struct UserRepository;

#[async_trait]
impl Repository<user::Model> for UserRepository {
    async fn find_by_id(db: &Database, id: i64) -> AppResult<user::Model> {
        db.read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    async fn count(db: &Database) -> AppResult<u64> {
        Ok(db.read().await.users.len() as u64)
    }
}

impl UserRepository {
    /// Create a new user
    pub async fn create(
        db: &Database,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> AppResult<user::Model> {
        let mut tables = db.write().await;

        if tables.users.values().any(|u| u.email == email) {
            return Err(AppError::Conflict("Email".to_string()));
        }

        let model = user::Model {
            id: tables.next_id(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.to_string(),
            picture: None,
            created_at: entity::now(),
        };
        tables.users.insert(model.id, model.clone());
        Ok(model)
    }

    /// Find user by email (for login)
    pub async fn find_by_email(db: &Database, email: &str) -> AppResult<user::Model> {
        db.read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Remember a refresh token so it can be exchanged once
    pub async fn store_refresh_token(db: &Database, user_id: i64, token: &str) -> AppResult<()> {
        db.write()
            .await
            .refresh_tokens
            .insert(token.to_string(), user_id);
        Ok(())
    }

    /// Consume a refresh token, returning its owner
    pub async fn take_refresh_token(db: &Database, token: &str) -> AppResult<i64> {
        db.write()
            .await
            .refresh_tokens
            .remove(token)
            .ok_or(AppError::InvalidToken)
    }

    /// Forget every refresh token of a user
    pub async fn revoke_refresh_tokens(db: &Database, user_id: i64) -> AppResult<()> {
        db.write()
            .await
            .refresh_tokens
            .retain(|_, owner| *owner != user_id);
        Ok(())
    }
}
