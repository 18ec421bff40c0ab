//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

/// GET /health
///
/// Unauthenticated liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "module": "shelfmark-web",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build health routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
