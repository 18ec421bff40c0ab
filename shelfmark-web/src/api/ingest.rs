//! Ingestion API handlers: photo upload and standalone recognition

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use shelfmark_common::types::BookInfo;

use crate::api::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::ingest::{self, BookDraft};
use crate::AppState;

/// Request body ceiling for uploads; above the image limit itself so the
/// pipeline can answer oversized inputs with its own message
const UPLOAD_BODY_LIMIT: usize = 6 * 1024 * 1024;

/// POST /api/recognize request
#[derive(Debug, Deserialize)]
pub struct RecognizeRequest {
    pub image: String,
}

/// POST /api/upload
///
/// Multipart upload with an `image` field. Runs the full pipeline and
/// answers with an unsaved draft; the book row is only written when the
/// user confirms via POST /api/books.
pub async fn upload(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<Json<BookDraft>> {
    let mut image_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("image") {
            // Declared type is checked up front; the pipeline still sniffs
            // the actual bytes
            if let Some(content_type) = field.content_type() {
                if !content_type.starts_with("image/") {
                    return Err(ApiError::BadRequest(format!(
                        "Expected an image, got {}",
                        content_type
                    )));
                }
            }

            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read image field: {}", e)))?;
            image_bytes = Some(bytes.to_vec());
            break;
        }
    }

    let image_bytes =
        image_bytes.ok_or_else(|| ApiError::BadRequest("Missing image field".to_string()))?;

    tracing::info!(user_id = %user_id, bytes = image_bytes.len(), "Photo upload received");

    let draft = ingest::photo_to_draft(&state.storage, &state.recognition, image_bytes).await?;
    Ok(Json(draft))
}

/// POST /api/recognize
///
/// Runs recognition alone against an already-stored image URL.
pub async fn recognize(
    State(state): State<AppState>,
    Extension(CurrentUser(_user_id)): Extension<CurrentUser>,
    Json(request): Json<RecognizeRequest>,
) -> ApiResult<Json<BookInfo>> {
    if request.image.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing image URL".to_string()));
    }

    let info = state.recognition.recognize(&request.image).await?;
    Ok(Json(info))
}

/// Build ingestion routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/upload",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/recognize", post(recognize))
}
