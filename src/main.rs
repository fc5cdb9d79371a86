// SPDX-License-Identifier: MIT

//! Registry-Enrich API Server
//!
//! Looks up company legal/fiscal profiles from the external business
//! registry and serves them to the invoicing product behind a two-tier
//! cache.

use registry_enrich::{
    config::Config,
    db::FirestoreDb,
    services::{ProfileService, RegistryClient, SearchService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Registry-Enrich API");

    if config.registry.base_url.is_none() {
        tracing::warn!("Registry base URL not configured; enrichment calls will fail");
    }

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // One registry client per process so the token slot is shared
    let registry = RegistryClient::new(config.registry.clone());
    let search = SearchService::new(registry.clone(), db.clone());
    let profiles = ProfileService::new(registry, db.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        search,
        profiles,
    });

    // Build router
    let app = registry_enrich::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("registry_enrich=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
