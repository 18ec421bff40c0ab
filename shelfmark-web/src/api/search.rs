//! Book search
//!
//! A filtered variant of the book list: case-insensitive substring match on
//! title and/or author, an OR-list of author names for the search-by-all-
//! favorite-authors action, and an optional tag-id filter that narrows the
//! result to books carrying any of those tags.

use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::db::books::Book;
use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

/// GET /api/search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Title substring
    pub title: Option<String>,

    /// Author substring
    pub author: Option<String>,

    /// Comma-separated author OR-list; combined with `author`
    pub authors: Option<String>,

    /// Comma-separated tag ids; matching books must carry at least one
    pub tags: Option<String>,
}

/// GET /api/search
pub async fn search(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Book>>> {
    let title = query
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let mut authors: Vec<String> = Vec::new();
    if let Some(author) = query.author.as_deref().map(str::trim) {
        if !author.is_empty() {
            authors.push(author.to_string());
        }
    }
    if let Some(list) = &query.authors {
        authors.extend(
            list.split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        );
    }

    let allowed_ids = match &query.tags {
        Some(list) => {
            let tag_ids = parse_tag_ids(list)?;
            Some(db::tags::book_ids_for_tags(&state.db, user_id, &tag_ids).await?)
        }
        None => None,
    };

    let books = db::books::search_books(
        &state.db,
        user_id,
        title,
        &authors,
        allowed_ids.as_deref(),
    )
    .await?;

    Ok(Json(books))
}

fn parse_tag_ids(list: &str) -> Result<Vec<Uuid>, ApiError> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            Uuid::parse_str(t)
                .map_err(|_| ApiError::BadRequest(format!("Invalid tag id: {}", t)))
        })
        .collect()
}

/// Build search routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/search", get(search))
}
