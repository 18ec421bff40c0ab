//! Session authentication
//!
//! Login exchanges an identity-provider access token for a Shelfmark
//! session; every other `/api` route runs behind the session middleware,
//! which resolves the bearer token to the owning user.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// Authenticated user, injected into request extensions by the middleware
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

/// Session middleware for protected routes.
///
/// Returns 401 when the bearer token is missing, unknown, or expired.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let user_id = db::sessions::lookup_session_user(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// POST /api/auth/login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub provider_token: String,
}

/// POST /api/auth/login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
}

/// POST /api/auth/login
///
/// Verifies the provider token, upserts the user, and issues a session.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let identity = state.identity.verify_token(&request.provider_token).await?;

    let username = identity.username.unwrap_or_else(|| identity.sub.clone());
    let user = db::users::upsert_user(&state.db, &identity.sub, &username).await?;
    let session = db::sessions::create_session(&state.db, user.user_id).await?;

    info!(user_id = %user.user_id, "Session issued");

    Ok(Json(LoginResponse {
        token: session.token,
        user_id: user.user_id,
        username: user.username,
    }))
}

/// POST /api/auth/logout
///
/// Deletes the caller's session. Runs behind the middleware, so the token
/// is known to be valid.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    if let Some(token) = bearer_token(&headers) {
        db::sessions::delete_session(&state.db, &token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
