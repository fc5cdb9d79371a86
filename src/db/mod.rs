// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const TENANTS: &str = "tenants";
    /// Per-tenant profile snapshots (keyed by tenant_id)
    pub const TENANT_SNAPSHOTS: &str = "tenant_snapshots";
    /// Generic lookup cache (keyed by query type + normalized value)
    pub const LOOKUP_CACHE: &str = "lookup_cache";
}
