//! Profile API handlers

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::db::users::User;
use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// Profile as exposed over the API
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub username: String,
    pub bio: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            bio: user.bio,
        }
    }
}

/// PUT /api/profile request
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
    #[serde(default)]
    pub bio: String,
}

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = db::users::get_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("Session user missing from database".to_string()))?;
    Ok(Json(user.into()))
}

/// PUT /api/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = db::users::update_profile(&state.db, user_id, &request.username, &request.bio)
        .await?
        .ok_or_else(|| ApiError::Internal("Session user missing from database".to_string()))?;
    Ok(Json(user.into()))
}

/// Build profile routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/profile", get(get_profile).put(update_profile))
}
