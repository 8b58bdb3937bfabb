use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use utoipa::ToSchema;

use crate::dates::{DateFormat, WireDate};
use crate::entity::{milestone, task};
use crate::error::AppResult;
use crate::handlers::common::{validate_optional, validate_required, wire_date, wire_datetime};
use crate::handlers::TaskResponse;
use crate::middlewares::AuthUser;
use crate::repositories::{MilestoneRepository, ProjectRepository, TaskRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "crate::dates::lenient")]
    #[schema(value_type = Option<String>)]
    pub start_date: Option<PrimitiveDateTime>,
    #[serde(default, with = "crate::dates::lenient")]
    #[schema(value_type = Option<String>)]
    pub due_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub completed: bool,
}

impl MilestoneRequest {
    fn into_input(self) -> AppResult<milestone::Input> {
        validate_required(&self.title, "Title")?;

        Ok(milestone::Input {
            title: self.title.trim().to_string(),
            description: validate_optional(self.description),
            start_date: self.start_date,
            due_date: self.due_date,
            completed: self.completed,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub project_id: i64,
    #[schema(value_type = Option<String>)]
    pub start_date: Option<WireDate>,
    #[schema(value_type = Option<String>)]
    pub due_date: Option<WireDate>,
    pub completed: bool,
    pub tasks: Vec<TaskResponse>,
    #[schema(value_type = Option<String>)]
    pub created_at: Option<WireDate>,
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<WireDate>,
}

impl MilestoneResponse {
    /// Build the response from a milestone and the project's tasks; only the
    /// tasks pointing at this milestone are listed
    pub fn new(m: milestone::Model, tasks: &[task::Model], format: DateFormat) -> Self {
        let tasks = tasks
            .iter()
            .filter(|t| t.milestone_id == Some(m.id))
            .cloned()
            .map(|t| TaskResponse::new(t, format))
            .collect();

        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            project_id: m.project_id,
            start_date: wire_date(format, m.start_date),
            due_date: wire_date(format, m.due_date),
            completed: m.completed,
            tasks,
            created_at: wire_datetime(format, Some(m.created_at)),
            updated_at: wire_datetime(format, Some(m.updated_at)),
        }
    }
}

// ============ Handlers ============

/// Create a milestone in a project
#[utoipa::path(
    post,
    path = "/api/projects/{id}/milestones",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    request_body = MilestoneRequest,
    responses(
        (status = 201, description = "Milestone created successfully", body = MilestoneResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Milestones"
)]
pub async fn create_milestone(
    user: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<MilestoneRequest>,
) -> AppResult<(StatusCode, Json<MilestoneResponse>)> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    let input = payload.into_input()?;
    let milestone = MilestoneRepository::create(&state.db, project_id, &input).await?;
    tracing::debug!(project_id, milestone_id = milestone.id, "Milestone created");

    Ok((
        StatusCode::CREATED,
        Json(MilestoneResponse::new(milestone, &[], state.config.date_format)),
    ))
}

/// List the milestones of a project with their tasks
#[utoipa::path(
    get,
    path = "/api/projects/{id}/milestones",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Milestones of the project", body = [MilestoneResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Milestones"
)]
pub async fn list_milestones(
    user: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> AppResult<Json<Vec<MilestoneResponse>>> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    let format = state.config.date_format;
    let milestones = MilestoneRepository::list_by_project(&state.db, project_id).await?;
    let tasks = TaskRepository::list_by_project(&state.db, project_id).await?;

    Ok(Json(
        milestones
            .into_iter()
            .map(|m| MilestoneResponse::new(m, &tasks, format))
            .collect(),
    ))
}

/// Get a milestone by ID
#[utoipa::path(
    get,
    path = "/api/projects/{id}/milestones/{milestone_id}",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("milestone_id" = i64, Path, description = "Milestone ID")
    ),
    responses(
        (status = 200, description = "Milestone details", body = MilestoneResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Milestone not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Milestones"
)]
pub async fn get_milestone(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, milestone_id)): Path<(i64, i64)>,
) -> AppResult<Json<MilestoneResponse>> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    let milestone = MilestoneRepository::find_in_project(&state.db, project_id, milestone_id).await?;
    let tasks = TaskRepository::list_by_milestone(&state.db, project_id, milestone_id).await?;
    Ok(Json(MilestoneResponse::new(
        milestone,
        &tasks,
        state.config.date_format,
    )))
}

/// Replace a milestone's fields; its tasks are left alone
#[utoipa::path(
    put,
    path = "/api/projects/{id}/milestones/{milestone_id}",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("milestone_id" = i64, Path, description = "Milestone ID")
    ),
    request_body = MilestoneRequest,
    responses(
        (status = 200, description = "Milestone updated successfully", body = MilestoneResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Milestone not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Milestones"
)]
pub async fn update_milestone(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, milestone_id)): Path<(i64, i64)>,
    Json(payload): Json<MilestoneRequest>,
) -> AppResult<Json<MilestoneResponse>> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    let input = payload.into_input()?;
    let milestone = MilestoneRepository::update(&state.db, project_id, milestone_id, &input).await?;
    let tasks = TaskRepository::list_by_milestone(&state.db, project_id, milestone_id).await?;
    Ok(Json(MilestoneResponse::new(
        milestone,
        &tasks,
        state.config.date_format,
    )))
}

/// Delete a milestone. Its tasks are unlinked or deleted according to the
/// server's configured policy.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}/milestones/{milestone_id}",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("milestone_id" = i64, Path, description = "Milestone ID")
    ),
    responses(
        (status = 204, description = "Milestone deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Milestone not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Milestones"
)]
pub async fn delete_milestone(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, milestone_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;

    let policy = state.config.milestone_delete_policy;
    let affected =
        MilestoneRepository::delete_with_policy(&state.db, project_id, milestone_id, policy).await?;
    tracing::debug!(project_id, milestone_id, ?policy, tasks = affected.len(), "Milestone deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// List the tasks of one milestone
#[utoipa::path(
    get,
    path = "/api/projects/{id}/milestones/{milestone_id}/tasks",
    params(
        ("id" = i64, Path, description = "Project ID"),
        ("milestone_id" = i64, Path, description = "Milestone ID")
    ),
    responses(
        (status = 200, description = "Tasks of the milestone", body = [TaskResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Milestone not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Milestones"
)]
pub async fn list_milestone_tasks(
    user: AuthUser,
    State(state): State<AppState>,
    Path((project_id, milestone_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<TaskResponse>>> {
    ProjectRepository::find_by_id_and_user(&state.db, project_id, user.id).await?;
    MilestoneRepository::find_in_project(&state.db, project_id, milestone_id).await?;

    let format = state.config.date_format;
    let tasks = TaskRepository::list_by_milestone(&state.db, project_id, milestone_id).await?;
    Ok(Json(
        tasks
            .into_iter()
            .map(|t| TaskResponse::new(t, format))
            .collect(),
    ))
}
