//! hivewatch-server - Colony report verification service
//!
//! Receives citizen hive sightings, verifies the photo with a
//! pretrained label model, and persists accepted reports with a
//! file-backed fallback when the document store is down.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use hivewatch_server::classify::SharedModel;
use hivewatch_server::config::ServerConfig;
use hivewatch_server::store::{DocumentStore, FallbackStore, FileStore};
use hivewatch_server::uploads::UploadStore;
use hivewatch_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting hivewatch-server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load()?;
    std::fs::create_dir_all(&config.data_dir)?;
    info!("Data directory: {}", config.data_dir.display());

    let uploads = UploadStore::new(config.uploads_dir())?;

    // Primary document store; the handle is kept even when the
    // database is down since reachability is probed per call.
    let primary = match DocumentStore::connect(&config.mongodb_uri, &config.database).await {
        Ok(store) => {
            if store.is_reachable().await {
                info!("Connected to document store at {}", config.mongodb_uri);
            } else {
                warn!(
                    "Document store at {} unreachable, file fallback active",
                    config.mongodb_uri
                );
            }
            Some(store)
        }
        Err(e) => {
            warn!("Document store disabled ({}), file fallback only", e);
            None
        }
    };
    let fallback = FileStore::new(config.reports_file(), config.contacts_file());
    let store = Arc::new(FallbackStore::new(primary, fallback));

    let model = Arc::new(SharedModel::new(config.model_path(), config.labels_path()));
    // Warm the model in the background so the first verification
    // request doesn't pay for the load.
    {
        let model = model.clone();
        tokio::spawn(async move { model.warm().await });
    }

    let bind_address = config.bind_address.clone();
    let port = config.port;
    let state = AppState::new(config, model, store.clone(), store, uploads);
    let app = hivewatch_server::build_router(state);

    let listener = tokio::net::TcpListener::bind((bind_address.as_str(), port)).await?;
    info!("Listening on http://{}:{}", bind_address, port);
    info!("Health check: http://{}:{}/api/health", bind_address, port);

    axum::serve(listener, app).await?;

    Ok(())
}
