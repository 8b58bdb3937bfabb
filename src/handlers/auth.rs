use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::handlers::common::{validate_required, MessageResponse};
use crate::middlewares::MaybeAuthUser;
use crate::repositories::{Repository, UserRepository};
use crate::services::{AuthService, TokenKind};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub authenticated: bool,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    pub authenticated: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

/// Issue a token pair for a user and remember the refresh token
async fn sign_in(state: &AppState, user: user::Model) -> AppResult<AuthResponse> {
    let pair = AuthService::generate_pair(user.id, &user.email, &state.config)?;
    UserRepository::store_refresh_token(&state.db, user.id, &pair.refresh_token).await?;

    Ok(AuthResponse {
        token: pair.access_token,
        refresh_token: pair.refresh_token,
        authenticated: true,
        name: user.name,
        email: user.email,
    })
}

// ============ Handlers ============

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = AuthResponse),
        (status = 409, description = "Email already exists"),
        (status = 400, description = "Validation error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate_required(&payload.email, "Email")?;
    validate_required(&payload.name, "Name")?;
    if payload.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = AuthService::hash_password(&payload.password)?;
    let user = UserRepository::create(&state.db, &payload.email, &password_hash, &payload.name).await?;
    tracing::info!(user_id = user.id, "User registered");

    Ok(Json(sign_in(&state, user).await?))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepository::find_by_email(&state.db, &payload.email)
        .await
        .map_err(|_| AppError::InvalidCredentials)?;

    let is_valid = AuthService::verify_password(&payload.password, &user.password_hash)?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    Ok(Json(sign_in(&state, user).await?))
}

/// Exchange a refresh token for a new token pair. Each refresh token works once.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = TokenRefreshResponse),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<TokenRefreshResponse>> {
    let claims =
        AuthService::verify_token(&payload.refresh_token, TokenKind::Refresh, &state.config)?;
    let owner = UserRepository::take_refresh_token(&state.db, &payload.refresh_token).await?;
    if owner != claims.sub {
        return Err(AppError::InvalidToken);
    }

    let user = UserRepository::find_by_id(&state.db, owner)
        .await
        .map_err(|_| AppError::InvalidToken)?;
    let pair = AuthService::generate_pair(user.id, &user.email, &state.config)?;
    UserRepository::store_refresh_token(&state.db, user.id, &pair.refresh_token).await?;
    tracing::debug!(user_id = user.id, "Tokens refreshed");

    Ok(Json(TokenRefreshResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
    }))
}

/// Sign out, revoking the caller's refresh tokens
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> AppResult<Json<MessageResponse>> {
    if let Some(user) = user {
        UserRepository::revoke_refresh_tokens(&state.db, user.id).await?;
        tracing::info!(user_id = user.id, "User logged out");
    }

    Ok(Json(MessageResponse::new("Logged out")))
}

/// Who the caller is; `authenticated: false` without a valid access token
#[utoipa::path(
    get,
    path = "/api/auth/user",
    responses(
        (status = 200, description = "Current user info", body = CurrentUserResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn current_user(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> AppResult<Json<CurrentUserResponse>> {
    let Some(user) = user else {
        return Ok(Json(CurrentUserResponse::default()));
    };

    match UserRepository::find_by_id(&state.db, user.id).await {
        Ok(user) => Ok(Json(CurrentUserResponse {
            authenticated: true,
            name: Some(user.name),
            email: Some(user.email),
            picture: user.picture,
        })),
        Err(AppError::NotFound(_)) => Ok(Json(CurrentUserResponse::default())),
        Err(e) => Err(e),
    }
}
