// SPDX-License-Identifier: MIT

//! Normalized company shapes produced by the enrichment client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of a company search result.
///
/// Transient: only the normalized array is cached, never the raw items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultItem {
    pub name: String,
    pub tax_id: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub registry_id: Option<String>,
}

/// Postal address block of a company profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
}

/// A legal representative or administrator of a company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Representative {
    pub name: String,
    pub role: Option<String>,
}

/// Canonical normalized company profile.
///
/// `raw` retains the untouched upstream payload for audit/debug and for
/// re-deriving fields the normalizer missed in older cached rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub legal_name: Option<String>,
    pub trade_name: Option<String>,
    /// Upper-cased, whitespace-stripped; absent unless it contains a digit
    pub tax_id: Option<String>,
    pub industry_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub legal_form: Option<String>,
    pub status: Option<String>,
    pub employees: Option<u64>,
    pub sales: Option<f64>,
    pub sales_year: Option<i32>,
    pub capital_social: Option<f64>,
    pub last_balance_date: Option<String>,
    /// Registry-internal id; falls back to the sanitized tax id
    pub registry_source_id: Option<String>,
    #[serde(default)]
    pub address: Address,
    pub constitution_date: Option<String>,
    #[serde(default)]
    pub representatives: Vec<Representative>,
    /// Untouched upstream payload
    #[serde(default)]
    pub raw: Value,
}
