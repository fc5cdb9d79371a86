// SPDX-License-Identifier: MIT

//! Lookup cache and tenant snapshot persistence tests (emulator only).

use chrono::{Duration, Utc};
use registry_enrich::models::{LookupCacheEntry, QueryType, Tenant};
use serde_json::json;

mod common;
use common::test_db;

#[tokio::test]
async fn test_lookup_cache_upsert_and_read() {
    require_emulator!();
    let db = test_db().await;

    let now = Utc::now();
    let entry = LookupCacheEntry::new(
        QueryType::TaxId,
        "B00000001".to_string(),
        json!({"company": {"nif": "B00000001"}}),
        json!({"name": "ACME SL", "tax_id": "B00000001"}),
        30,
        now,
    );
    db.put_lookup(&entry).await.unwrap();

    let read = db
        .get_lookup(QueryType::TaxId, "B00000001")
        .await
        .unwrap()
        .expect("cache row should exist");
    assert_eq!(read.query_value, "B00000001");
    assert!(!read.is_expired(Utc::now()));

    // Upsert overwrites in place
    let replacement = LookupCacheEntry::new(
        QueryType::TaxId,
        "B00000001".to_string(),
        json!({"company": {"nif": "B00000001", "situacion": "Activa"}}),
        json!({"name": "ACME SL", "tax_id": "B00000001", "status": "Activa"}),
        30,
        now,
    );
    db.put_lookup(&replacement).await.unwrap();

    let read = db
        .get_lookup(QueryType::TaxId, "B00000001")
        .await
        .unwrap()
        .expect("cache row should exist");
    assert_eq!(read.normalized["status"], json!("Activa"));
}

#[tokio::test]
async fn test_expired_row_is_returned_but_reads_as_expired() {
    require_emulator!();
    let db = test_db().await;

    // Passive expiry: the row stays in place, readers ignore it
    let entry = LookupCacheEntry::new(
        QueryType::Name,
        "STALE SEARCH".to_string(),
        json!({}),
        json!([]),
        7,
        Utc::now() - Duration::days(8),
    );
    db.put_lookup(&entry).await.unwrap();

    let read = db
        .get_lookup(QueryType::Name, "STALE SEARCH")
        .await
        .unwrap()
        .expect("expired rows are not deleted");
    assert!(read.is_expired(Utc::now()));
}

#[tokio::test]
async fn test_query_types_do_not_collide() {
    require_emulator!();
    let db = test_db().await;

    let entry = LookupCacheEntry::new(
        QueryType::Name,
        "B00000002".to_string(),
        json!({}),
        json!([]),
        7,
        Utc::now(),
    );
    db.put_lookup(&entry).await.unwrap();

    // Same value under the other query type is a distinct key
    let missing = db.get_lookup(QueryType::TaxId, "B00000002").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_tenant_row_roundtrip() {
    require_emulator!();
    let db = test_db().await;

    let tenant = Tenant {
        tenant_id: "tenant-itest".to_string(),
        name: "Test Tenant SL".to_string(),
        tax_id: Some("B00000003".to_string()),
        created_at: Utc::now().to_rfc3339(),
    };
    db.upsert_tenant(&tenant).await.unwrap();

    let read = db
        .get_tenant("tenant-itest")
        .await
        .unwrap()
        .expect("tenant should exist");
    assert_eq!(read.tax_id.as_deref(), Some("B00000003"));
}
