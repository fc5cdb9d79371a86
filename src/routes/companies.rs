// SPDX-License-Identifier: MIT

//! Company enrichment routes.
//!
//! The profile route implements the three-tier lookup order: tenant
//! snapshot first (no network), then the lookup cache, then the registry.
//! The tiers are ordered by cost; reordering them re-introduces network
//! latency on the hot path.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthTenant;
use crate::models::{CompanyProfile, SearchResultItem, TenantProfileSnapshot};
use crate::sanitize::{normalize_query, sanitize_tax_id};
use crate::services::{ProfileOptions, SearchOptions};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Enrichment routes (require tenant authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/companies/search", get(search_companies))
        .route("/api/companies/{tax_id}/profile", get(get_company_profile))
}

// ─── Search ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SearchParams {
    q: String,
    /// Try wildcard variants and merge across candidates
    #[serde(default)]
    deep: bool,
    /// Skip the lookup cache
    #[serde(default)]
    refresh: bool,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub companies: Vec<SearchResultItem>,
}

/// Search the registry for companies by name or tax id.
async fn search_companies(
    State(state): State<Arc<AppState>>,
    Extension(tenant): Extension<AuthTenant>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    tracing::info!(
        tenant = %tenant.tenant_id,
        deep = params.deep,
        "Company search requested"
    );

    let companies = state
        .search
        .search(
            &params.q,
            SearchOptions {
                bypass_cache: params.refresh,
                deep_search: params.deep,
            },
        )
        .await?;

    Ok(Json(SearchResponse { companies }))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ProfileParams {
    /// Skip snapshot and lookup cache
    #[serde(default)]
    refresh: bool,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub profile: CompanyProfile,
    /// Tier that served the profile: snapshot, cache, or registry
    pub source: &'static str,
}

/// Fetch the normalized company profile for a tax id.
async fn get_company_profile(
    State(state): State<Arc<AppState>>,
    Extension(tenant): Extension<AuthTenant>,
    Path(tax_id): Path<String>,
    Query(params): Query<ProfileParams>,
) -> Result<Json<ProfileResponse>> {
    let requested = sanitize_tax_id(&tax_id).unwrap_or_else(|| normalize_query(&tax_id));
    if requested.is_empty() {
        return Err(AppError::BadRequest("empty company identifier".to_string()));
    }

    let now = chrono::Utc::now();

    // Tier 1: tenant snapshot, cheapest, no network
    if let Some(snapshot) = state.db.get_snapshot(&tenant.tenant_id).await? {
        if snapshot.is_fresh(&requested, params.refresh, now) {
            tracing::info!(tenant = %tenant.tenant_id, "Profile served from tenant snapshot");
            return Ok(Json(ProfileResponse {
                profile: snapshot.profile,
                source: "snapshot",
            }));
        }
    }

    // Tiers 2 and 3: lookup cache, then registry
    let (profile, source) = state
        .profiles
        .get_company_profile(
            &tax_id,
            ProfileOptions {
                bypass_cache: params.refresh,
            },
        )
        .await?;

    tracing::info!(
        tenant = %tenant.tenant_id,
        company = %requested,
        source = source.as_str(),
        "Profile resolved"
    );

    // Snapshot write-back, only when the tenant row exists. The verified
    // flag is recomputed on every write, cache hit or not.
    if state.db.get_tenant(&tenant.tenant_id).await?.is_some() {
        let snapshot = TenantProfileSnapshot::from_profile(
            tenant.tenant_id.clone(),
            profile.clone(),
            &requested,
            now,
        );
        if let Err(e) = state.db.upsert_snapshot(&snapshot).await {
            tracing::warn!(tenant = %tenant.tenant_id, error = %e, "Failed to write tenant snapshot");
        }
    }

    Ok(Json(ProfileResponse {
        profile,
        source: source.as_str(),
    }))
}
