// Library crate for taskdeck
// The client half (client, store, dates, models) mirrors the server's project
// tree; the backend half (handlers, repositories, services) is the reference
// in-memory server used by the `server` binary and the tests.

pub mod client;
pub mod config;
pub mod dates;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    create_comment, create_milestone, create_project, create_task, current_user, delete_comment,
    delete_milestone, delete_project, delete_task, get_milestone, get_project, get_task,
    list_comments, list_milestone_tasks, list_milestones, list_projects, list_tasks, login,
    logout, refresh, register, update_comment, update_milestone, update_project, update_task,
};
use crate::middlewares::auth_middleware;
use crate::state::AppState;

pub use crate::client::{ApiClient, Session};
pub use crate::store::{CommentStore, EntityStore};

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require an access token)
    let protected_routes = Router::new()
        // Project routes
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        // Milestone routes (nested under projects)
        .route(
            "/api/projects/{id}/milestones",
            get(list_milestones).post(create_milestone),
        )
        .route(
            "/api/projects/{id}/milestones/{milestone_id}",
            get(get_milestone)
                .put(update_milestone)
                .delete(delete_milestone),
        )
        .route(
            "/api/projects/{id}/milestones/{milestone_id}/tasks",
            get(list_milestone_tasks),
        )
        // Task routes (nested under projects)
        .route("/api/projects/{id}/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/projects/{id}/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        // Comment routes (nested under tasks)
        .route(
            "/api/projects/{id}/tasks/{task_id}/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/api/projects/{id}/tasks/{task_id}/comments/{comment_id}",
            axum::routing::put(update_comment).delete(delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(|| async { "Hello, taskdeck!" }))
        // Public auth routes
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/user", get(current_user))
        // Protected routes
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
