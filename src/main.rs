use anyhow::Context;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use taskdeck::config::ServerConfig;
use taskdeck::handlers::{
    AuthResponse, CommentRequest, CommentResponse, CurrentUserResponse, LoginRequest,
    MessageResponse, MilestoneRequest, MilestoneResponse, ProjectRequest, ProjectResponse,
    RefreshRequest, RegisterRequest, TaskRequest, TaskResponse, TokenRefreshResponse,
};
use taskdeck::state::AppState;
use taskdeck::telemetry::init_tracing;
use taskdeck::{build_router, handlers};

/// Security scheme for Bearer token
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::current_user,
        handlers::project::create_project,
        handlers::project::list_projects,
        handlers::project::get_project,
        handlers::project::update_project,
        handlers::project::delete_project,
        handlers::milestone::create_milestone,
        handlers::milestone::list_milestones,
        handlers::milestone::get_milestone,
        handlers::milestone::update_milestone,
        handlers::milestone::delete_milestone,
        handlers::milestone::list_milestone_tasks,
        handlers::task::create_task,
        handlers::task::list_tasks,
        handlers::task::get_task,
        handlers::task::update_task,
        handlers::task::delete_task,
        handlers::comment::create_comment,
        handlers::comment::list_comments,
        handlers::comment::update_comment,
        handlers::comment::delete_comment,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        RefreshRequest,
        TokenRefreshResponse,
        CurrentUserResponse,
        MessageResponse,
        ProjectRequest,
        ProjectResponse,
        MilestoneRequest,
        MilestoneResponse,
        TaskRequest,
        TaskResponse,
        CommentRequest,
        CommentResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Projects", description = "Project management endpoints"),
        (name = "Milestones", description = "Milestone management endpoints"),
        (name = "Tasks", description = "Task management endpoints"),
        (name = "Comments", description = "Task comment endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    let addr = config.server_addr();
    tracing::info!(
        date_format = ?config.date_format,
        milestone_delete_policy = ?config.milestone_delete_policy,
        "Starting with in-memory storage"
    );
    let state = AppState::new(config);

    // Build the main application router
    let app = build_router(state)
        // Add Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
