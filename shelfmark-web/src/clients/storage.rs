//! Object storage client
//!
//! Uploads compressed cover images to the external storage service, which
//! answers with a durable public URL. Upload is the one external call with
//! an explicit client-side deadline; a timeout or HTTP error is terminal
//! for the attempt and is never retried here.

use reqwest::{multipart, Client};
use serde::Deserialize;
use shelfmark_common::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Client-side upload deadline
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Object storage client
pub struct StorageClient {
    http_client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl StorageClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(UPLOAD_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// Upload a JPEG image; returns the stable public URL
    pub async fn upload_image(&self, bytes: Vec<u8>, filename: &str) -> Result<String> {
        let url = format!("{}/upload", self.base_url);
        debug!(url = %url, bytes = bytes.len(), "Uploading cover image");

        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("image/jpeg")
            .map_err(|e| Error::Internal(format!("Failed to build upload part: {}", e)))?;
        let form = multipart::Form::new().part("image", part);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::External(format!("Upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(Error::External(format!(
                "Upload failed with HTTP {}: {}",
                status, detail
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::External(format!("Upload failed: invalid response: {}", e)))?;

        debug!(cover_url = %parsed.url, "Upload complete");
        Ok(parsed.url)
    }
}
