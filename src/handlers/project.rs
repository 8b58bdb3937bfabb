use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dates::WireDate;
use crate::entity::project;
use crate::error::AppResult;
use crate::handlers::common::{validate_optional, validate_required, wire_datetime};
use crate::handlers::{MilestoneResponse, TaskResponse};
use crate::middlewares::AuthUser;
use crate::repositories::{MilestoneRepository, ProjectRepository, TaskRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

/// Body of project create and update. Nested milestones and tasks sent by
/// clients are ignored; they have their own endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
}

impl ProjectRequest {
    fn into_input(self) -> AppResult<project::Input> {
        validate_required(&self.title, "Title")?;

        Ok(project::Input {
            title: self.title.trim().to_string(),
            description: validate_optional(self.description),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub milestones: Vec<MilestoneResponse>,
    pub tasks: Vec<TaskResponse>,
    #[schema(value_type = Option<String>)]
    pub created_at: Option<WireDate>,
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<WireDate>,
}

impl ProjectResponse {
    /// Assemble the full tree of a project
    async fn load(state: &AppState, p: project::Model) -> AppResult<Self> {
        let format = state.config.date_format;
        let milestones = MilestoneRepository::list_by_project(&state.db, p.id).await?;
        let tasks = TaskRepository::list_by_project(&state.db, p.id).await?;

        Ok(Self {
            id: p.id,
            title: p.title,
            description: p.description,
            milestones: milestones
                .into_iter()
                .map(|m| MilestoneResponse::new(m, &tasks, format))
                .collect(),
            tasks: tasks
                .into_iter()
                .map(|t| TaskResponse::new(t, format))
                .collect(),
            created_at: wire_datetime(format, Some(p.created_at)),
            updated_at: wire_datetime(format, Some(p.updated_at)),
        })
    }
}

// ============ Handlers ============

/// Create a new project
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = ProjectRequest,
    responses(
        (status = 201, description = "Project created successfully", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 400, description = "Validation error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn create_project(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ProjectRequest>,
) -> AppResult<(StatusCode, Json<ProjectResponse>)> {
    let input = payload.into_input()?;

    let project = ProjectRepository::create(&state.db, user.id, &input).await?;
    tracing::info!(project_id = project.id, user_id = user.id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::load(&state, project).await?),
    ))
}

/// List all projects of the current user with their milestones and tasks
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "List of projects", body = [ProjectResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn list_projects(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProjectResponse>>> {
    let projects = ProjectRepository::list_by_user(&state.db, user.id).await?;

    let mut data = Vec::with_capacity(projects.len());
    for project in projects {
        data.push(ProjectResponse::load(&state, project).await?);
    }

    Ok(Json(data))
}

/// Get a project by ID
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn get_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProjectResponse>> {
    let project = ProjectRepository::find_by_id_and_user(&state.db, id, user.id).await?;
    Ok(Json(ProjectResponse::load(&state, project).await?))
}

/// Update a project
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    request_body = ProjectRequest,
    responses(
        (status = 200, description = "Project updated successfully", body = ProjectResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn update_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let input = payload.into_input()?;

    let project = ProjectRepository::update(&state.db, id, user.id, &input).await?;
    Ok(Json(ProjectResponse::load(&state, project).await?))
}

/// Delete a project with everything in it
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = i64, Path, description = "Project ID")
    ),
    responses(
        (status = 204, description = "Project deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn delete_project(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    ProjectRepository::delete_by_user(&state.db, id, user.id).await?;
    tracing::info!(project_id = id, user_id = user.id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}
