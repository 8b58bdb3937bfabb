pub mod auth;
pub mod comment;
pub mod common;
pub mod milestone;
pub mod project;
pub mod task;

pub use auth::{
    current_user, login, logout, refresh, register, AuthResponse, CurrentUserResponse,
    LoginRequest, RefreshRequest, RegisterRequest, TokenRefreshResponse,
};
pub use comment::{
    create_comment, delete_comment, list_comments, update_comment, CommentRequest,
    CommentResponse,
};
pub use common::{validate_optional, validate_required, MessageResponse};
pub use milestone::{
    create_milestone, delete_milestone, get_milestone, list_milestone_tasks, list_milestones,
    update_milestone, MilestoneRequest, MilestoneResponse,
};
pub use project::{
    create_project, delete_project, get_project, list_projects, update_project, ProjectRequest,
    ProjectResponse,
};
pub use task::{
    create_task, delete_task, get_task, list_tasks, update_task, TaskRequest, TaskResponse,
};
