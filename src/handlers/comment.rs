use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dates::{DateFormat, WireDate};
use crate::entity::comment;
use crate::error::AppResult;
use crate::handlers::common::{validate_required, wire_datetime};
use crate::middlewares::AuthUser;
use crate::repositories::{
    CommentRepository, ProjectRepository, Repository, TaskRepository, UserRepository,
};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub task_id: i64,
    pub user_id: i64,
    pub user_name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub created_at: Option<WireDate>,
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<WireDate>,
}

impl CommentResponse {
    pub fn new(c: comment::Model, user_name: Option<String>, format: DateFormat) -> Self {
        Self {
            id: c.id,
            content: c.content,
            task_id: c.task_id,
            user_id: c.user_id,
            user_name,
            created_at: wire_datetime(format, Some(c.created_at)),
            updated_at: wire_datetime(format, Some(c.updated_at)),
        }
    }
}

/// Comments are reachable only through a task of a project the caller owns
async fn check_task(state: &AppState, user: &AuthUser, project_id: i64, task_id: i64) -> AppResult<()> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;
    TaskRepository::find_in_project(&state.db, project_id, task_id).await?;
    Ok(())
}

// ============ Handlers ============

/// Comment on a task
#[utoipa::path(
    post,
    path = "/api/projects/{id}/tasks/{task_id}/comments",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created successfully", body = CommentResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Comments"
)]
pub async fn create_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(i64, i64)>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<CommentResponse>)> {
    check_task(&state, &user, project_id, task_id).await?;
    validate_required(&payload.content, "Content")?;

    let comment = CommentRepository::create(&state.db, task_id, user.id, payload.content.trim()).await?;
    let author = UserRepository::find_by_id(&state.db, user.id)
        .await
        .ok()
        .map(|u| u.name);

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse::new(comment, author, state.config.date_format)),
    ))
}

/// List the comments of a task, oldest first
#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks/{task_id}/comments",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Comments of the task", body = [CommentResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Comments"
)]
pub async fn list_comments(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<CommentResponse>>> {
    check_task(&state, &user, project_id, task_id).await?;

    let format = state.config.date_format;
    let comments = CommentRepository::list_by_task(&state.db, task_id).await?;
    Ok(Json(
        comments
            .into_iter()
            .map(|(c, author)| CommentResponse::new(c, author, format))
            .collect(),
    ))
}

/// Edit a comment; only its author may
#[utoipa::path(
    put,
    path = "/api/projects/{id}/tasks/{task_id}/comments/{comment_id}",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("task_id" = i64, Path, description = "Task ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated successfully", body = CommentResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Comments"
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, task_id, comment_id)): Path<(i64, i64, i64)>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<Json<CommentResponse>> {
    check_task(&state, &user, project_id, task_id).await?;
    validate_required(&payload.content, "Content")?;

    let comment = CommentRepository::update_by_author(
        &state.db,
        task_id,
        comment_id,
        user.id,
        payload.content.trim(),
    )
    .await?;
    let author = UserRepository::find_by_id(&state.db, user.id)
        .await
        .ok()
        .map(|u| u.name);

    Ok(Json(CommentResponse::new(
        comment,
        author,
        state.config.date_format,
    )))
}

/// Delete a comment; only its author may
#[utoipa::path(
    delete,
    path = "/api/projects/{id}/tasks/{task_id}/comments/{comment_id}",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("task_id" = i64, Path, description = "Task ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Comments"
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, task_id, comment_id)): Path<(i64, i64, i64)>,
) -> AppResult<StatusCode> {
    check_task(&state, &user, project_id, task_id).await?;

    CommentRepository::delete_by_author(&state.db, task_id, comment_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
