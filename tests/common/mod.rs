// SPDX-License-Identifier: MIT

use registry_enrich::config::Config;
use registry_enrich::db::FirestoreDb;
use registry_enrich::routes::create_router;
use registry_enrich::services::{ProfileService, RegistryClient, SearchService};
use registry_enrich::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let registry = RegistryClient::new(config.registry.clone());
    let search = SearchService::new(registry.clone(), db.clone());
    let profiles = ProfileService::new(registry, db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        search,
        profiles,
    });

    (create_router(state.clone()), state)
}
