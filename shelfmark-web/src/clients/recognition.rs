//! Recognition workflow client
//!
//! Submits a stored image URL to the external recognition workflow and
//! turns its best-effort answer into a `BookInfo`. The workflow's payload
//! carries a `text` field holding either a JSON-encoded object or freeform
//! text; freeform answers become the title rather than being discarded.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shelfmark_common::types::BookInfo;
use shelfmark_common::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Recognition workflows are slow; allow well beyond the upload deadline
const RECOGNITION_TIMEOUT: Duration = Duration::from_secs(60);

/// Recognition workflow client
pub struct RecognitionClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl RecognitionClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(RECOGNITION_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Submit an image URL to the workflow and parse the answer
    pub async fn recognize(&self, image_url: &str) -> Result<BookInfo> {
        let url = format!("{}/recognize", self.base_url);
        debug!(url = %url, image = %image_url, "Submitting image for recognition");

        let mut request = self
            .http_client
            .post(&url)
            .json(&RecognizeRequest { image: image_url });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::External(format!("Recognition failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<RecognizeResponse>(&body) {
                Ok(RecognizeResponse {
                    error: Some(error),
                    details: Some(details),
                    ..
                }) => format!("{} ({})", error, details),
                Ok(RecognizeResponse {
                    error: Some(error), ..
                }) => error,
                _ => body,
            };
            return Err(Error::External(format!(
                "Recognition failed with HTTP {}: {}",
                status, detail
            )));
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| Error::External(format!("Recognition failed: invalid response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(Error::External(format!("Recognition failed: {}", error)));
        }

        let info = parse_book_info(&parsed.text.unwrap_or_default());
        debug!(title = %info.title, author = %info.author, "Recognition complete");
        Ok(info)
    }
}

/// Parse the workflow's text payload.
///
/// Strict JSON decode first; anything that does not decode to the expected
/// object becomes the title wholesale, with author and publisher left
/// empty. The recognition attempt is never discarded outright.
pub fn parse_book_info(text: &str) -> BookInfo {
    match serde_json::from_str::<BookInfo>(text) {
        Ok(info) => info,
        Err(_) => BookInfo {
            title: text.trim().to_string(),
            author: String::new(),
            publisher: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_payload() {
        let info = parse_book_info(r#"{"title":"T","author":"A","publisher":"P"}"#);
        assert_eq!(
            info,
            BookInfo {
                title: "T".to_string(),
                author: "A".to_string(),
                publisher: "P".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_freeform_payload_becomes_title() {
        let info = parse_book_info("Some freeform guess");
        assert_eq!(info.title, "Some freeform guess");
        assert_eq!(info.author, "");
        assert_eq!(info.publisher, "");
    }

    #[test]
    fn test_parse_partial_object_defaults_missing_fields() {
        let info = parse_book_info(r#"{"title":"Only Title"}"#);
        assert_eq!(info.title, "Only Title");
        assert_eq!(info.author, "");
    }

    #[test]
    fn test_parse_trims_freeform_whitespace() {
        let info = parse_book_info("  The Dispossessed \n");
        assert_eq!(info.title, "The Dispossessed");
    }
}
