//! Shared helpers for integration tests
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use http_body_util::BodyExt;
use shelfmark_web::clients::{IdentityClient, RecognitionClient, StorageClient};
use shelfmark_web::AppState;
use uuid::Uuid;

/// Unroutable base URL for clients a test never exercises
pub const UNUSED_SERVICE: &str = "http://127.0.0.1:1";

/// Application state over an in-memory database, with all external
/// clients pointed at an unroutable address
pub async fn create_test_state() -> AppState {
    create_test_state_with(UNUSED_SERVICE, UNUSED_SERVICE, UNUSED_SERVICE).await
}

/// Application state with explicit external service base URLs
pub async fn create_test_state_with(
    storage_url: &str,
    recognition_url: &str,
    identity_url: &str,
) -> AppState {
    let pool = shelfmark_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database");

    AppState::new(
        pool,
        StorageClient::new(storage_url),
        RecognitionClient::new(recognition_url, None),
        IdentityClient::new(identity_url),
    )
}

/// Create a user and an active session; returns (user_id, bearer token)
pub async fn seed_session(state: &AppState, username: &str) -> (Uuid, String) {
    let user = shelfmark_web::db::users::upsert_user(
        &state.db,
        &format!("subject-{}", username),
        username,
    )
    .await
    .expect("Failed to seed user");

    let session = shelfmark_web::db::sessions::create_session(&state.db, user.user_id)
        .await
        .expect("Failed to seed session");

    (user.user_id, session.token)
}

/// Build a request, optionally authenticated and optionally carrying JSON
pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON
pub async fn response_json(response: Response<axum::body::Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "Response body was not JSON ({}): {}",
            e,
            String::from_utf8_lossy(&bytes)
        )
    })
}
