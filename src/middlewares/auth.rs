use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::services::{AuthService, TokenKind};
use crate::state::AppState;

/// The caller behind a verified access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Handler argument for routes behind `auth_middleware`
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Caller on public routes; `None` when the token is missing or invalid
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(&parts.headers, &state.config).ok()))
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Resolve the access token of a request. Refresh tokens are refused.
pub fn authenticate(headers: &HeaderMap, config: &ServerConfig) -> AppResult<AuthUser> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = AuthService::verify_token(token, TokenKind::Access, config)?;

    Ok(AuthUser {
        id: claims.sub,
        email: claims.email,
    })
}

/// Rejects the request unless it carries a valid access token
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(request.headers(), &state.config)?;
    tracing::debug!(user_id = user.id, "Request authenticated");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
