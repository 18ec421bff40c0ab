//! Tag API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::db::tags::Tag;
use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// POST /api/tags request
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

/// GET /api/tags
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Tag>>> {
    if let Some(tags) = state.caches.tags.get(user_id).await {
        return Ok(Json(tags));
    }

    let tags = db::tags::list_tags(&state.db, user_id).await?;
    state.caches.tags.put(user_id, tags.clone()).await;
    Ok(Json(tags))
}

/// POST /api/tags
///
/// Create-on-demand: a duplicate name answers 200 with the existing row
/// instead of erroring.
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    let (tag, created) = db::tags::create_tag(&state.db, user_id, &request.name).await?;

    if created {
        state.caches.tags.insert(user_id, tag.clone()).await;
    }

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(tag)))
}

/// DELETE /api/tags/:id
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !db::tags::delete_tag(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound(format!("Tag not found: {}", id)));
    }

    state.caches.tags.remove(user_id, id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Build tag routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tags", get(list_tags).post(create_tag))
        .route("/api/tags/:id", axum::routing::delete(delete_tag))
}
