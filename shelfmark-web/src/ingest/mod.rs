//! Photo-to-book-draft ingestion pipeline
//!
//! capture/select -> normalize & compress -> upload to storage -> submit to
//! recognition -> draft. Each external step fails independently and keeps
//! its own error message; nothing is retried automatically, and no book row
//! is written until the user confirms the draft.

pub mod compress;

use serde::Serialize;
use shelfmark_common::types::BookInfo;
use shelfmark_common::{Error, Result};
use tracing::{debug, info};

use crate::clients::{RecognitionClient, StorageClient};

/// Unsaved, user-editable book draft produced by the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct BookDraft {
    #[serde(rename = "bookInfo")]
    pub book_info: BookInfo,
    #[serde(rename = "coverUrl")]
    pub cover_url: String,
}

/// Run the full pipeline on a raw uploaded image
pub async fn photo_to_draft(
    storage: &StorageClient,
    recognition: &RecognitionClient,
    image_bytes: Vec<u8>,
) -> Result<BookDraft> {
    let compressed = tokio::task::spawn_blocking(move || compress::compress_image(&image_bytes))
        .await
        .map_err(|e| Error::Internal(format!("Compression task failed: {}", e)))??;

    debug!(
        bytes = compressed.bytes.len(),
        width = compressed.width,
        height = compressed.height,
        attempts = compressed.attempts,
        "Image compressed"
    );

    let cover_url = storage.upload_image(compressed.bytes, "cover.jpg").await?;
    info!(cover_url = %cover_url, "Cover image uploaded");

    // A recognition failure below leaves the uploaded object in storage,
    // unreferenced; no cleanup is attempted here
    let book_info = recognition.recognize(&cover_url).await?;

    Ok(BookDraft {
        book_info,
        cover_url,
    })
}
