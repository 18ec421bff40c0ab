//! Quote API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::db::quotes::{NewQuote, Quote, QuoteUpdate};
use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// GET /api/quotes
pub async fn list_quotes(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Quote>>> {
    if let Some(quotes) = state.caches.quotes.get(user_id).await {
        return Ok(Json(quotes));
    }

    let quotes = db::quotes::list_quotes(&state.db, user_id).await?;
    state.caches.quotes.put(user_id, quotes.clone()).await;
    Ok(Json(quotes))
}

/// POST /api/quotes
pub async fn create_quote(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<NewQuote>,
) -> ApiResult<(StatusCode, Json<Quote>)> {
    let quote = db::quotes::create_quote(&state.db, user_id, request).await?;
    state.caches.quotes.insert(user_id, quote.clone()).await;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// PATCH /api/quotes/:id
pub async fn update_quote(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(update): Json<QuoteUpdate>,
) -> ApiResult<Json<Quote>> {
    let quote = db::quotes::update_quote(&state.db, user_id, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Quote not found: {}", id)))?;

    state.caches.quotes.replace(user_id, quote.clone()).await;
    Ok(Json(quote))
}

/// DELETE /api/quotes/:id
pub async fn delete_quote(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !db::quotes::delete_quote(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound(format!("Quote not found: {}", id)));
    }

    state.caches.quotes.remove(user_id, id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Build quote routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/quotes", get(list_quotes).post(create_quote))
        .route(
            "/api/quotes/:id",
            axum::routing::patch(update_quote).delete(delete_quote),
        )
}
