//! shelfmark-web library interface
//!
//! Exposes the application state and router for the binary and for
//! integration tests.

pub mod api;
pub mod cache;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;

pub use crate::error::{ApiError, ApiResult};

use axum::{middleware, routing::post, Router};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::cache::ScopedCache;
use crate::clients::{IdentityClient, RecognitionClient, StorageClient};
use crate::db::books::Book;
use crate::db::favorite_authors::FavoriteAuthor;
use crate::db::loans::Loan;
use crate::db::quotes::Quote;
use crate::db::tags::Tag;

/// Per-entity cached collections, reconciled by successful mutations
#[derive(Clone, Default)]
pub struct Caches {
    pub books: ScopedCache<Book>,
    pub tags: ScopedCache<Tag>,
    pub loans: ScopedCache<Loan>,
    pub quotes: ScopedCache<Quote>,
    pub favorite_authors: ScopedCache<FavoriteAuthor>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Object storage client
    pub storage: Arc<StorageClient>,
    /// Recognition workflow client
    pub recognition: Arc<RecognitionClient>,
    /// Identity provider client
    pub identity: Arc<IdentityClient>,
    /// Cached collections
    pub caches: Caches,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        storage: StorageClient,
        recognition: RecognitionClient,
        identity: IdentityClient,
    ) -> Self {
        Self {
            db,
            storage: Arc::new(storage),
            recognition: Arc::new(recognition),
            identity: Arc::new(identity),
            caches: Caches::default(),
        }
    }
}

/// Build the application router.
///
/// Everything under `/api` except login runs behind the session
/// middleware; `/health` is open.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(api::books::routes())
        .merge(api::tags::routes())
        .merge(api::loans::routes())
        .merge(api::quotes::routes())
        .merge(api::favorite_authors::routes())
        .merge(api::profile::routes())
        .merge(api::search::routes())
        .merge(api::ingest::routes())
        .route("/api/auth/logout", post(api::auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_session,
        ));

    Router::new()
        .merge(protected)
        .route("/api/auth/login", post(api::auth::login))
        .merge(api::health::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
