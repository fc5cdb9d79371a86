// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Tenants (minimal rows the snapshot lifecycle depends on)
//! - Tenant snapshots (last normalized company profile per tenant)
//! - Lookup cache (query-keyed search/report cache with passive expiry)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{LookupCacheEntry, QueryType, Tenant, TenantProfileSnapshot};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator connection is unauthenticated to avoid local
        // credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Tenant Operations ───────────────────────────────────────

    /// Get a tenant row by id.
    pub async fn get_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TENANTS)
            .obj()
            .one(tenant_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a tenant row.
    pub async fn upsert_tenant(&self, tenant: &Tenant) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TENANTS)
            .document_id(&tenant.tenant_id)
            .object(tenant)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Tenant Snapshot Operations ──────────────────────────────

    /// Get the profile snapshot for a tenant.
    pub async fn get_snapshot(
        &self,
        tenant_id: &str,
    ) -> Result<Option<TenantProfileSnapshot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TENANT_SNAPSHOTS)
            .obj()
            .one(tenant_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert the profile snapshot for a tenant.
    pub async fn upsert_snapshot(&self, snapshot: &TenantProfileSnapshot) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TENANT_SNAPSHOTS)
            .document_id(&snapshot.tenant_id)
            .object(snapshot)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Lookup Cache Operations ─────────────────────────────────

    /// Get a lookup cache row.
    ///
    /// Expiry is the caller's concern; expired rows are returned as-is and
    /// treated as misses by the services (passive expiry, no sweeping).
    pub async fn get_lookup(
        &self,
        query_type: QueryType,
        query_value: &str,
    ) -> Result<Option<LookupCacheEntry>, AppError> {
        let doc_id = LookupCacheEntry::document_id(query_type, query_value);
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LOOKUP_CACHE)
            .obj()
            .one(&doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert a lookup cache row.
    pub async fn put_lookup(&self, entry: &LookupCacheEntry) -> Result<(), AppError> {
        let doc_id = LookupCacheEntry::document_id(entry.query_type, &entry.query_value);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LOOKUP_CACHE)
            .document_id(&doc_id)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
