//! Favorite author API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::db::favorite_authors::FavoriteAuthor;
use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// POST /api/favorite-authors request
#[derive(Debug, Deserialize)]
pub struct CreateFavoriteAuthorRequest {
    pub author: String,
}

/// GET /api/favorite-authors
pub async fn list_favorite_authors(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<FavoriteAuthor>>> {
    if let Some(favorites) = state.caches.favorite_authors.get(user_id).await {
        return Ok(Json(favorites));
    }

    let favorites = db::favorite_authors::list_favorite_authors(&state.db, user_id).await?;
    state
        .caches
        .favorite_authors
        .put(user_id, favorites.clone())
        .await;
    Ok(Json(favorites))
}

/// POST /api/favorite-authors
pub async fn create_favorite_author(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<CreateFavoriteAuthorRequest>,
) -> ApiResult<(StatusCode, Json<FavoriteAuthor>)> {
    let favorite =
        db::favorite_authors::create_favorite_author(&state.db, user_id, &request.author).await?;
    state
        .caches
        .favorite_authors
        .insert(user_id, favorite.clone())
        .await;
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// DELETE /api/favorite-authors/:id
pub async fn delete_favorite_author(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !db::favorite_authors::delete_favorite_author(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound(format!("Favorite author not found: {}", id)));
    }

    state.caches.favorite_authors.remove(user_id, id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Build favorite author routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/favorite-authors",
            get(list_favorite_authors).post(create_favorite_author),
        )
        .route(
            "/api/favorite-authors/:id",
            axum::routing::delete(delete_favorite_author),
        )
}
