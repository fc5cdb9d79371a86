// SPDX-License-Identifier: MIT

//! Generic lookup cache rows shared by search and profile fetches.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// TTL for cached name searches.
pub const NAME_SEARCH_TTL_DAYS: i64 = 7;
/// TTL for cached tax-id report fetches.
pub const PROFILE_TTL_DAYS: i64 = 30;

/// What kind of query produced a cache row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    #[serde(rename = "TAX_ID")]
    TaxId,
    #[serde(rename = "NAME")]
    Name,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::TaxId => "TAX_ID",
            QueryType::Name => "NAME",
        }
    }
}

/// One row of the lookup cache, keyed by `(query_type, query_value)`.
///
/// Rows are upserted on every successful upstream fetch. Expired rows are
/// not deleted, only ignored on read (passive expiry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupCacheEntry {
    pub query_type: QueryType,
    /// Normalized query value (trimmed, upper-cased)
    pub query_value: String,
    /// Untouched upstream payload
    pub raw: Value,
    /// Normalized result (search item array or company profile)
    pub normalized: Value,
    pub expires_at: DateTime<Utc>,
}

impl LookupCacheEntry {
    pub fn new(
        query_type: QueryType,
        query_value: String,
        raw: Value,
        normalized: Value,
        ttl_days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            query_type,
            query_value,
            raw,
            normalized,
            expires_at: now + Duration::days(ttl_days),
        }
    }

    /// A row at or past its expiry is a miss.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Firestore document id for a cache key.
    ///
    /// The query value is URL-encoded; company names can contain anything.
    pub fn document_id(query_type: QueryType, query_value: &str) -> String {
        format!(
            "{}_{}",
            query_type.as_str(),
            urlencoding::encode(query_value)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_expiry_boundary() {
        let now = Utc::now();
        let entry = LookupCacheEntry::new(
            QueryType::Name,
            "ACME SL".to_string(),
            json!({}),
            json!([]),
            NAME_SEARCH_TTL_DAYS,
            now,
        );

        assert!(!entry.is_expired(now));
        assert!(!entry.is_expired(now + Duration::days(7) - Duration::seconds(1)));
        // expires_at <= now counts as expired
        assert!(entry.is_expired(now + Duration::days(7)));
        assert!(entry.is_expired(now + Duration::days(8)));
    }

    #[test]
    fn test_document_id_encodes_value() {
        assert_eq!(
            LookupCacheEntry::document_id(QueryType::TaxId, "B12345678"),
            "TAX_ID_B12345678"
        );
        assert_eq!(
            LookupCacheEntry::document_id(QueryType::Name, "ACME S.L. / MADRID"),
            "NAME_ACME%20S.L.%20%2F%20MADRID"
        );
    }

    #[test]
    fn test_query_type_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_value(QueryType::TaxId).unwrap(),
            json!("TAX_ID")
        );
        assert_eq!(serde_json::to_value(QueryType::Name).unwrap(), json!("NAME"));
    }
}
