//! shelfmark-web - personal book-tracking service
//!
//! HTTP API for registering books (manually or from a photo of the cover),
//! rating/commenting/tagging them, tracking loan-outs, and keeping quotes.
//! Page rendering, identity, object storage, and recognition stay with
//! their external services.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelfmark_web::clients::{IdentityClient, RecognitionClient, StorageClient};
use shelfmark_web::config::{Cli, ServiceConfig};
use shelfmark_web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::load(&cli);

    info!("Starting shelfmark-web");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    shelfmark_common::config::ensure_data_dir(&config.data_dir)?;
    let db_path = shelfmark_common::config::database_path(&config.data_dir);
    info!("Database: {}", db_path.display());

    let db_pool = shelfmark_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    let purged = shelfmark_web::db::sessions::delete_expired_sessions(&db_pool).await?;
    if purged > 0 {
        info!(purged, "Purged expired sessions");
    }

    info!("Object storage: {}", config.storage_base_url);
    info!("Recognition workflow: {}", config.recognition_base_url);
    info!("Identity provider: {}", config.identity_base_url);

    let state = AppState::new(
        db_pool,
        StorageClient::new(&config.storage_base_url),
        RecognitionClient::new(
            &config.recognition_base_url,
            config.recognition_api_key.clone(),
        ),
        IdentityClient::new(&config.identity_base_url),
    );

    let app = shelfmark_web::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
