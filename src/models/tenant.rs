// SPDX-License-Identifier: MIT

//! Tenant rows and the per-tenant profile snapshot.

use crate::json_path;
use crate::models::company::CompanyProfile;
use crate::sanitize::sanitize_tax_id;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum snapshot age before a lookup falls through to cache/network.
pub const SNAPSHOT_MAX_AGE_DAYS: i64 = 30;

/// Paths where a tax identifier has been observed in stored report payloads.
const RAW_TAX_ID_PATHS: &[&str] = &[
    "nif",
    "cif",
    "taxId",
    "vatNumber",
    "company.nif",
    "company.cif",
    "company.taxId",
    "data.company.nif",
];

/// A tenant of the invoicing product.
///
/// Only the fields the enrichment flow needs; the rest of the tenant CRUD
/// lives outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub tenant_id: String,
    pub name: String,
    /// Tax id the tenant registered with, if any
    pub tax_id: Option<String>,
    pub created_at: String,
}

/// Persisted copy of the last successfully normalized company profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantProfileSnapshot {
    pub tenant_id: String,
    pub profile: CompanyProfile,
    pub last_sync_at: DateTime<Utc>,
    /// True only if the normalized profile's tax id exactly matched the
    /// requested tax id when the snapshot was written
    pub tax_id_verified: bool,
}

impl TenantProfileSnapshot {
    /// Build a snapshot from a freshly normalized profile.
    ///
    /// `tax_id_verified` is recomputed on every write, whether the profile
    /// came from the cache or from the network.
    pub fn from_profile(
        tenant_id: String,
        profile: CompanyProfile,
        requested_tax_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let tax_id_verified = profile.tax_id.as_deref() == Some(requested_tax_id);
        Self {
            tenant_id,
            profile,
            last_sync_at: now,
            tax_id_verified,
        }
    }

    /// Tax id this snapshot can vouch for: the normalized field, the stored
    /// registry source id, or whatever the raw payload still carries.
    pub fn recoverable_tax_id(&self) -> Option<String> {
        if let Some(tax_id) = &self.profile.tax_id {
            return Some(tax_id.clone());
        }
        if let Some(source_id) = &self.profile.registry_source_id {
            if let Some(tax_id) = sanitize_tax_id(source_id) {
                return Some(tax_id);
            }
        }
        json_path::first_string_at(&self.profile.raw, RAW_TAX_ID_PATHS)
            .and_then(|raw| sanitize_tax_id(&raw))
    }

    /// Freshness predicate for reusing a snapshot without touching the
    /// cache or the network. All four conditions must hold; the tax-id
    /// comparison prevents serving a stale profile for a different company
    /// that happens to share the tenant row.
    pub fn is_fresh(&self, requested_tax_id: &str, bypass: bool, now: DateTime<Utc>) -> bool {
        if bypass || !self.tax_id_verified {
            return false;
        }
        if now - self.last_sync_at > Duration::days(SNAPSHOT_MAX_AGE_DAYS) {
            return false;
        }
        self.recoverable_tax_id().as_deref() == Some(requested_tax_id)
    }
}
