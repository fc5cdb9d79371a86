// SPDX-License-Identifier: MIT

//! Multi-candidate company search against the registry.
//!
//! The registry's search endpoint is case-sensitive in surprising ways and
//! has changed its response envelope across versions, so a single user
//! query fans out into several candidate terms and every response shape is
//! probed for the result array.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::json_path;
use crate::models::lookup::NAME_SEARCH_TTL_DAYS;
use crate::models::{LookupCacheEntry, QueryType, SearchResultItem};
use crate::sanitize::{normalize_query, sanitize_tax_id};
use crate::services::RegistryClient;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;

/// Keys under which the result array has been observed.
const RESULT_ARRAY_PATHS: &[&str] = &[
    "companies",
    "results",
    "items",
    "data.companies",
    "result.companies",
];

const NAME_PATHS: &[&str] = &["name", "nombre", "denominacion", "razonSocial", "legalName"];
const TAX_ID_PATHS: &[&str] = &["taxId", "nif", "cif", "vatNumber"];
const PROVINCE_PATHS: &[&str] = &["province", "provincia"];
const CITY_PATHS: &[&str] = &["city", "localidad", "municipio"];
const ID_PATHS: &[&str] = &["id", "companyId", "codigo"];

/// Options for a search call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub bypass_cache: bool,
    pub deep_search: bool,
}

/// Company search service with lookup-cache write-through.
#[derive(Clone)]
pub struct SearchService {
    registry: RegistryClient,
    db: FirestoreDb,
}

impl SearchService {
    pub fn new(registry: RegistryClient, db: FirestoreDb) -> Self {
        Self { registry, db }
    }

    /// Search the registry for companies matching `query`.
    ///
    /// Non-deep mode returns the first candidate term that yields results.
    /// Deep mode tries every candidate (including wildcard variants) and
    /// merges the deduplicated union.
    pub async fn search(
        &self,
        query: &str,
        opts: SearchOptions,
    ) -> Result<Vec<SearchResultItem>, AppError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(AppError::BadRequest("empty search query".to_string()));
        }
        let cache_key = normalize_query(trimmed);

        if !opts.bypass_cache {
            if let Some(items) = self.cached_results(&cache_key).await? {
                tracing::debug!(query = %cache_key, count = items.len(), "Search served from lookup cache");
                return Ok(items);
            }
        }

        let candidates = search_candidates(trimmed, opts.deep_search);
        let mut merged: Vec<SearchResultItem> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut last_error: Option<AppError> = None;

        for candidate in &candidates {
            let raw: Value = match self
                .registry
                .get_json("companies/search", &[("q", candidate.as_str())])
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    // One candidate failing must not abort the rest
                    tracing::warn!(candidate = %candidate, error = %e, "Search candidate failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let items = normalize_search_results(&raw);
            if items.is_empty() {
                continue;
            }

            if !opts.deep_search {
                // First hit wins; remaining variants are skipped
                self.write_cache(&cache_key, raw, &items).await;
                return Ok(items);
            }

            for item in items {
                if seen.insert(dedup_key(&item)) {
                    merged.push(item);
                }
            }
        }

        if merged.is_empty() {
            // An empty result with no errors is a valid answer
            return match last_error {
                Some(err) => Err(err),
                None => Ok(Vec::new()),
            };
        }

        self.write_cache(&cache_key, serde_json::json!({ "deep": true }), &merged)
            .await;
        Ok(merged)
    }

    /// Read a cached result list, treating expired and malformed rows as
    /// misses.
    async fn cached_results(
        &self,
        cache_key: &str,
    ) -> Result<Option<Vec<SearchResultItem>>, AppError> {
        let Some(entry) = self.db.get_lookup(QueryType::Name, cache_key).await? else {
            return Ok(None);
        };
        if entry.is_expired(Utc::now()) {
            return Ok(None);
        }
        match serde_json::from_value(entry.normalized) {
            Ok(items) => Ok(Some(items)),
            Err(e) => {
                tracing::warn!(query = %cache_key, error = %e, "Cached search row is malformed, refetching");
                Ok(None)
            }
        }
    }

    /// Write-through after a successful fetch. A failed cache write is
    /// logged but does not fail the search; the results are already in hand.
    async fn write_cache(&self, cache_key: &str, raw: Value, items: &[SearchResultItem]) {
        let normalized = match serde_json::to_value(items) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize search results for cache");
                return;
            }
        };
        let entry = LookupCacheEntry::new(
            QueryType::Name,
            cache_key.to_string(),
            raw,
            normalized,
            NAME_SEARCH_TTL_DAYS,
            Utc::now(),
        );
        if let Err(e) = self.db.put_lookup(&entry).await {
            tracing::warn!(query = %cache_key, error = %e, "Failed to write search results to lookup cache");
        }
    }
}

/// Candidate query terms, in the order they are tried.
///
/// Deep search adds an exact-phrase form and two wildcard forms. Variants
/// that collapse to the same string (an all-caps query and its upper-case
/// form) are only tried once.
pub fn search_candidates(query: &str, deep: bool) -> Vec<String> {
    let trimmed = query.trim().to_string();
    let mut candidates = vec![
        trimmed.clone(),
        trimmed.to_uppercase(),
        trimmed.to_lowercase(),
    ];
    if deep {
        candidates.push(format!("\"{}\"", trimmed));
        candidates.push(format!("{}*", trimmed));
        candidates.push(format!("*{}*", trimmed));
    }

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.clone()));
    candidates
}

/// Locate the result array in a search response and normalize each item.
pub fn normalize_search_results(raw: &Value) -> Vec<SearchResultItem> {
    let items: &Vec<Value> = match raw {
        // Some endpoint versions return the bare array
        Value::Array(items) => items,
        _ => match json_path::first_array_at(raw, RESULT_ARRAY_PATHS) {
            Some(items) => items,
            None => return Vec::new(),
        },
    };
    items.iter().filter_map(normalize_search_item).collect()
}

/// Normalize one raw search item. Items without any recognizable name are
/// dropped.
pub fn normalize_search_item(item: &Value) -> Option<SearchResultItem> {
    let name = json_path::first_string_at(item, NAME_PATHS)?;
    let tax_id =
        json_path::first_string_at(item, TAX_ID_PATHS).and_then(|raw| sanitize_tax_id(&raw));
    let registry_id = json_path::first_string_at(item, ID_PATHS).or_else(|| tax_id.clone());

    Some(SearchResultItem {
        name,
        tax_id,
        province: json_path::first_string_at(item, PROVINCE_PATHS),
        city: json_path::first_string_at(item, CITY_PATHS),
        registry_id,
    })
}

/// Case-insensitive merge key for deep-search deduplication.
pub fn dedup_key(item: &SearchResultItem) -> String {
    format!(
        "{}|{}|{}",
        item.registry_id.as_deref().unwrap_or(""),
        item.tax_id.as_deref().unwrap_or(""),
        item.name
    )
    .to_lowercase()
}
