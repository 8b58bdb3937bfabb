use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use utoipa::ToSchema;

use crate::dates::{DateFormat, WireDate};
use crate::entity::task;
use crate::error::AppResult;
use crate::handlers::common::{validate_optional, validate_required, wire_date, wire_datetime};
use crate::middlewares::AuthUser;
use crate::models::TaskStatus;
use crate::repositories::{ProjectRepository, TaskRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

/// Body of task create and update. Completion may be sent as a `status`
/// string, a `completed` flag, or both; the string wins.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[schema(example = "IN_PROGRESS")]
    pub status: Option<String>,
    pub milestone_id: Option<i64>,
    #[serde(default, with = "crate::dates::lenient")]
    #[schema(value_type = Option<String>)]
    pub due_date: Option<PrimitiveDateTime>,
}

impl TaskRequest {
    fn into_input(self) -> AppResult<task::Input> {
        validate_required(&self.title, "Title")?;

        Ok(task::Input {
            title: self.title.trim().to_string(),
            description: validate_optional(self.description),
            status: TaskStatus::from_wire(self.status.as_deref(), self.completed),
            milestone_id: self.milestone_id,
            due_date: self.due_date,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "TODO")]
    pub status: String,
    pub completed: bool,
    pub project_id: i64,
    pub milestone_id: Option<i64>,
    #[schema(value_type = Option<String>)]
    pub due_date: Option<WireDate>,
    #[schema(value_type = Option<String>)]
    pub created_at: Option<WireDate>,
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<WireDate>,
}

impl TaskResponse {
    pub fn new(t: task::Model, format: DateFormat) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status.as_str().to_string(),
            completed: t.status.is_completed(),
            project_id: t.project_id,
            milestone_id: t.milestone_id,
            due_date: wire_date(format, t.due_date),
            created_at: wire_datetime(format, Some(t.created_at)),
            updated_at: wire_datetime(format, Some(t.updated_at)),
        }
    }
}

// ============ Handlers ============

/// Create a task, optionally inside a milestone
#[utoipa::path(
    post,
    path = "/api/projects/{id}/tasks",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    request_body = TaskRequest,
    responses(
        (status = 201, description = "Task created successfully", body = TaskResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn create_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<TaskRequest>,
) -> AppResult<(StatusCode, Json<TaskResponse>)> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    let input = payload.into_input()?;
    let task = TaskRepository::create(&state.db, project_id, &input).await?;
    tracing::debug!(project_id, task_id = task.id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse::new(task, state.config.date_format)),
    ))
}

/// List all tasks of a project
#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Tasks of the project", body = [TaskResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn list_tasks(
    user: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> AppResult<Json<Vec<TaskResponse>>> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    let format = state.config.date_format;
    let tasks = TaskRepository::list_by_project(&state.db, project_id).await?;
    Ok(Json(
        tasks
            .into_iter()
            .map(|t| TaskResponse::new(t, format))
            .collect(),
    ))
}

/// Get a task by ID
#[utoipa::path(
    get,
    path = "/api/projects/{id}/tasks/{task_id}",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task details", body = TaskResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn get_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(i64, i64)>,
) -> AppResult<Json<TaskResponse>> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    let task = TaskRepository::find_in_project(&state.db, project_id, task_id).await?;
    Ok(Json(TaskResponse::new(task, state.config.date_format)))
}

/// Replace a task. A null `milestoneId` removes it from its milestone.
#[utoipa::path(
    put,
    path = "/api/projects/{id}/tasks/{task_id}",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    request_body = TaskRequest,
    responses(
        (status = 200, description = "Task updated successfully", body = TaskResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn update_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(i64, i64)>,
    Json(payload): Json<TaskRequest>,
) -> AppResult<Json<TaskResponse>> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    let input = payload.into_input()?;
    let task = TaskRepository::update(&state.db, project_id, task_id, &input).await?;
    Ok(Json(TaskResponse::new(task, state.config.date_format)))
}

/// Delete a task and its comments
#[utoipa::path(
    delete,
    path = "/api/projects/{id}/tasks/{task_id}",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("task_id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Task not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tasks"
)]
pub async fn delete_task(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    TaskRepository::delete_in_project(&state.db, project_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
