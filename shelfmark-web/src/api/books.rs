//! Book API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::db::books::{Book, BookUpdate, NewBook};
use crate::db::tags::Tag;
use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// POST /api/books request: the confirmed draft plus optional tag ids
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    #[serde(flatten)]
    pub book: NewBook,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Per-tag outcome of a link batch. The batch is not transactional; some
/// links can succeed while others fail, and the caller sees which.
#[derive(Debug, Serialize)]
pub struct TagLinkOutcome {
    pub tag_id: Uuid,
    pub linked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/books response
#[derive(Debug, Serialize)]
pub struct CreateBookResponse {
    pub book: Book,
    pub tags: Vec<TagLinkOutcome>,
}

/// PUT /api/books/:id/tags request
#[derive(Debug, Deserialize)]
pub struct AssignTagsRequest {
    pub tag_ids: Vec<Uuid>,
}

/// PUT /api/books/:id/tags response
#[derive(Debug, Serialize)]
pub struct AssignTagsResponse {
    pub tags: Vec<Tag>,
    pub results: Vec<TagLinkOutcome>,
}

/// GET /api/books
pub async fn list_books(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Book>>> {
    if let Some(books) = state.caches.books.get(user_id).await {
        return Ok(Json(books));
    }

    let books = db::books::list_books(&state.db, user_id).await?;
    state.caches.books.put(user_id, books.clone()).await;
    Ok(Json(books))
}

/// GET /api/books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Book>> {
    let book = db::books::get_book(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book not found: {}", id)))?;
    Ok(Json(book))
}

/// POST /api/books
///
/// Persists a confirmed draft. Requested tag links are issued concurrently
/// and awaited jointly; their outcomes ride along in the response.
pub async fn create_book(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<CreateBookRequest>,
) -> ApiResult<(StatusCode, Json<CreateBookResponse>)> {
    let book = db::books::create_book(&state.db, user_id, request.book).await?;
    state.caches.books.insert(user_id, book.clone()).await;

    let tags = link_tags(&state, user_id, book.id, &request.tag_ids).await;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookResponse { book, tags }),
    ))
}

/// PATCH /api/books/:id
pub async fn update_book(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(update): Json<BookUpdate>,
) -> ApiResult<Json<Book>> {
    let book = db::books::update_book(&state.db, user_id, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book not found: {}", id)))?;

    state.caches.books.replace(user_id, book.clone()).await;
    Ok(Json(book))
}

/// DELETE /api/books/:id
pub async fn delete_book(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !db::books::delete_book(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound(format!("Book not found: {}", id)));
    }

    state.caches.books.remove(user_id, id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/books/:id/tags
pub async fn list_book_tags(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Tag>>> {
    ensure_book_exists(&state, user_id, id).await?;
    let tags = db::tags::list_book_tags(&state.db, user_id, id).await?;
    Ok(Json(tags))
}

/// PUT /api/books/:id/tags
///
/// Replaces the book's tag links with the given set.
pub async fn assign_tags(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignTagsRequest>,
) -> ApiResult<Json<AssignTagsResponse>> {
    ensure_book_exists(&state, user_id, id).await?;

    db::tags::unlink_book_tags(&state.db, user_id, id).await?;
    let results = link_tags(&state, user_id, id, &request.tag_ids).await;
    let tags = db::tags::list_book_tags(&state.db, user_id, id).await?;

    Ok(Json(AssignTagsResponse { tags, results }))
}

async fn ensure_book_exists(state: &AppState, user_id: Uuid, id: Uuid) -> ApiResult<()> {
    db::books::get_book(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book not found: {}", id)))?;
    Ok(())
}

/// Issue the link writes concurrently and await them jointly
async fn link_tags(
    state: &AppState,
    user_id: Uuid,
    book_id: Uuid,
    tag_ids: &[Uuid],
) -> Vec<TagLinkOutcome> {
    let results = join_all(tag_ids.iter().map(|tag_id| {
        let pool = state.db.clone();
        let tag_id = *tag_id;
        async move {
            (
                tag_id,
                db::tags::link_book_tag(&pool, user_id, book_id, tag_id).await,
            )
        }
    }))
    .await;

    results
        .into_iter()
        .map(|(tag_id, result)| match result {
            Ok(()) => TagLinkOutcome {
                tag_id,
                linked: true,
                error: None,
            },
            Err(e) => {
                tracing::warn!(tag_id = %tag_id, error = %e, "Tag link failed");
                TagLinkOutcome {
                    tag_id,
                    linked: false,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

/// Build book routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/books", get(list_books).post(create_book))
        .route(
            "/api/books/:id",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .route("/api/books/:id/tags", get(list_book_tags).put(assign_tags))
}
