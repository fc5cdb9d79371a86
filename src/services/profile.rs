// SPDX-License-Identifier: MIT

//! Full company report fetch and normalization.
//!
//! The report endpoint nests the company object in different envelopes
//! depending on API version, names most fields in two or three ways, and
//! has been observed to place legal-representative data at arbitrary
//! nesting depths. Normalization is therefore ordered-path extraction for
//! flat fields plus a bounded recursive walk for representatives.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::json_path;
use crate::models::lookup::PROFILE_TTL_DAYS;
use crate::models::{Address, CompanyProfile, LookupCacheEntry, QueryType, Representative};
use crate::sanitize::{coerce_number, normalize_query, sanitize_tax_id};
use crate::services::RegistryClient;
use chrono::Utc;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};

/// Envelopes the company object has been observed under.
const COMPANY_ENVELOPE_PATHS: &[&str] =
    &["company", "data.company", "result.company", "report.company"];

const NAME_PATHS: &[&str] = &["name", "nombre", "denominacion", "razonSocial"];
const LEGAL_NAME_PATHS: &[&str] = &["legalName", "razonSocial", "denominacionSocial"];
const TRADE_NAME_PATHS: &[&str] = &["tradeName", "nombreComercial", "marca"];
const TAX_ID_PATHS: &[&str] = &["taxId", "nif", "cif", "vatNumber", "identificacionFiscal"];
const INDUSTRY_PATHS: &[&str] = &["industryCode", "cnae", "actividad.codigo", "sic"];
const EMAIL_PATHS: &[&str] = &["email", "correo"];
const PHONE_PATHS: &[&str] = &["phone", "telefono"];
const WEBSITE_PATHS: &[&str] = &["website", "web", "url"];
const LEGAL_FORM_PATHS: &[&str] = &["legalForm", "formaJuridica", "forma_juridica"];
const STATUS_PATHS: &[&str] = &["status", "situacion", "estado"];
const EMPLOYEES_PATHS: &[&str] = &["employees", "empleados", "numeroEmpleados"];
const SALES_PATHS: &[&str] = &["sales", "ventas", "facturacion"];
const SALES_YEAR_PATHS: &[&str] = &["salesYear", "ejercicio", "anioVentas"];
const CAPITAL_PATHS: &[&str] = &["capitalSocial", "capital"];
const BALANCE_DATE_PATHS: &[&str] = &["lastBalanceDate", "fechaUltimoBalance"];
const SOURCE_ID_PATHS: &[&str] = &["id", "companyId", "codigo"];
const CONSTITUTION_PATHS: &[&str] = &["constitutionDate", "fechaConstitucion"];

const STREET_PATHS: &[&str] = &["address.street", "domicilio.direccion", "direccion", "domicilioSocial"];
const ZIP_PATHS: &[&str] = &["address.zip", "address.postalCode", "domicilio.codigoPostal", "codigoPostal"];
const ADDRESS_CITY_PATHS: &[&str] = &["address.city", "domicilio.localidad", "localidad", "municipio"];
const ADDRESS_PROVINCE_PATHS: &[&str] = &["address.province", "domicilio.provincia", "provincia"];
const COUNTRY_PATHS: &[&str] = &["address.country", "domicilio.pais", "pais"];

/// Keys (case-insensitive) under which representative data has been seen.
const REPRESENTATIVE_KEY_ALIASES: &[&str] = &[
    "administradores",
    "representatives",
    "representantes",
    "administrador",
    "representante",
];
const REP_NAME_PATHS: &[&str] = &["name", "nombre", "nombreCompleto", "fullName"];
const REP_ROLE_PATHS: &[&str] = &["role", "cargo", "puesto"];

/// Depth bound for the representative walk. Real payloads stay shallow;
/// the bound tolerates malformed ones.
const MAX_TRAVERSAL_DEPTH: usize = 20;

/// Options for a profile fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileOptions {
    pub bypass_cache: bool,
}

/// Which tier served a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    Cache,
    Registry,
}

impl ProfileSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSource::Cache => "cache",
            ProfileSource::Registry => "registry",
        }
    }
}

/// Company report resolver with lookup-cache write-through.
#[derive(Clone)]
pub struct ProfileService {
    registry: RegistryClient,
    db: FirestoreDb,
}

impl ProfileService {
    pub fn new(registry: RegistryClient, db: FirestoreDb) -> Self {
        Self { registry, db }
    }

    /// Fetch the normalized profile for a tax identifier or registry id.
    pub async fn get_company_profile(
        &self,
        tax_id_or_registry_id: &str,
        opts: ProfileOptions,
    ) -> Result<(CompanyProfile, ProfileSource), AppError> {
        let key = normalize_query(tax_id_or_registry_id);
        if key.is_empty() {
            return Err(AppError::BadRequest(
                "empty company identifier".to_string(),
            ));
        }

        if !opts.bypass_cache {
            if let Some(profile) = self.cached_profile(&key).await? {
                tracing::debug!(company = %key, "Profile served from lookup cache");
                return Ok((profile, ProfileSource::Cache));
            }
        }

        let path = format!("companies/{}/report", urlencoding::encode(&key));
        let raw: Value = self.registry.get_json(&path, &[]).await?;
        let profile = normalize_profile(&raw, &key);

        // Write-through only after a fully parsed success; a failed cache
        // write is logged but the profile is already in hand
        match serde_json::to_value(&profile) {
            Ok(normalized) => {
                let entry = LookupCacheEntry::new(
                    QueryType::TaxId,
                    key.clone(),
                    raw,
                    normalized,
                    PROFILE_TTL_DAYS,
                    Utc::now(),
                );
                if let Err(e) = self.db.put_lookup(&entry).await {
                    tracing::warn!(company = %key, error = %e, "Failed to write profile to lookup cache");
                }
            }
            Err(e) => {
                tracing::warn!(company = %key, error = %e, "Failed to serialize profile for cache")
            }
        }

        Ok((profile, ProfileSource::Registry))
    }

    /// Read a cached profile, upgrading fields whose extraction rules
    /// postdate the cached row.
    async fn cached_profile(&self, key: &str) -> Result<Option<CompanyProfile>, AppError> {
        let Some(entry) = self.db.get_lookup(QueryType::TaxId, key).await? else {
            return Ok(None);
        };
        if entry.is_expired(Utc::now()) {
            return Ok(None);
        }
        match serde_json::from_value::<CompanyProfile>(entry.normalized) {
            Ok(profile) => Ok(Some(upgrade_cached_profile(profile, &entry.raw))),
            Err(e) => {
                tracing::warn!(company = %key, error = %e, "Cached profile row is malformed, refetching");
                Ok(None)
            }
        }
    }
}

/// Re-derive `legal_form`, `status`, and `representatives` from the stored
/// raw payload when the cached normalized row predates their extraction
/// rules. Avoids a network refetch just to backfill a field.
pub fn upgrade_cached_profile(mut profile: CompanyProfile, raw: &Value) -> CompanyProfile {
    let company = company_envelope(raw);
    if profile.legal_form.is_none() {
        profile.legal_form = json_path::first_string_at(company, LEGAL_FORM_PATHS);
    }
    if profile.status.is_none() {
        profile.status = json_path::first_string_at(company, STATUS_PATHS);
    }
    if profile.representatives.is_empty() {
        profile.representatives = extract_representatives(company);
    }
    if profile.raw.is_null() {
        profile.raw = raw.clone();
    }
    profile
}

/// Locate the company object inside whatever envelope this API version
/// used. Falls back to the root.
fn company_envelope(raw: &Value) -> &Value {
    for path in COMPANY_ENVELOPE_PATHS {
        if let Some(v) = json_path::resolve_path(raw, path) {
            if v.is_object() {
                return v;
            }
        }
    }
    raw
}

/// Build the canonical profile from a raw report payload.
///
/// Field extraction is best-effort: a missing field stays absent and is
/// logged at debug level, never an error. `requested` is the normalized
/// identifier the report was fetched with; it only seeds the name when the
/// payload carries none.
pub fn normalize_profile(raw: &Value, requested: &str) -> CompanyProfile {
    let company = company_envelope(raw);

    let legal_name = json_path::first_string_at(company, LEGAL_NAME_PATHS);
    let name = json_path::first_string_at(company, NAME_PATHS)
        .or_else(|| legal_name.clone())
        .unwrap_or_else(|| {
            tracing::debug!(company = %requested, "Report carries no usable name");
            requested.to_string()
        });

    let tax_id = json_path::first_string_at(company, TAX_ID_PATHS)
        .and_then(|v| sanitize_tax_id(&v));
    let registry_source_id =
        json_path::first_string_at(company, SOURCE_ID_PATHS).or_else(|| tax_id.clone());

    CompanyProfile {
        name,
        legal_name,
        trade_name: json_path::first_string_at(company, TRADE_NAME_PATHS),
        tax_id,
        industry_code: json_path::first_string_at(company, INDUSTRY_PATHS),
        email: json_path::first_string_at(company, EMAIL_PATHS),
        phone: json_path::first_string_at(company, PHONE_PATHS),
        website: json_path::first_string_at(company, WEBSITE_PATHS),
        legal_form: json_path::first_string_at(company, LEGAL_FORM_PATHS),
        status: json_path::first_string_at(company, STATUS_PATHS),
        employees: number_at(company, EMPLOYEES_PATHS)
            .filter(|n| *n >= 0.0)
            .map(|n| n as u64),
        sales: number_at(company, SALES_PATHS),
        sales_year: number_at(company, SALES_YEAR_PATHS).map(|n| n as i32),
        capital_social: number_at(company, CAPITAL_PATHS),
        last_balance_date: json_path::first_string_at(company, BALANCE_DATE_PATHS),
        registry_source_id,
        address: Address {
            street: json_path::first_string_at(company, STREET_PATHS),
            zip: json_path::first_string_at(company, ZIP_PATHS),
            city: json_path::first_string_at(company, ADDRESS_CITY_PATHS),
            province: json_path::first_string_at(company, ADDRESS_PROVINCE_PATHS),
            country: json_path::first_string_at(company, COUNTRY_PATHS),
        },
        constitution_date: json_path::first_string_at(company, CONSTITUTION_PATHS),
        representatives: extract_representatives(company),
        raw: raw.clone(),
    }
}

fn number_at(company: &Value, paths: &[&str]) -> Option<f64> {
    json_path::first_at_paths(company, paths).and_then(coerce_number)
}

/// Collect legal representatives from anywhere in the payload.
///
/// Breadth-first walk over the JSON tree, matching keys against the alias
/// set case-insensitively, bounded at [`MAX_TRAVERSAL_DEPTH`] levels.
/// Results are deduplicated by lower-cased name, first seen wins.
pub fn extract_representatives(root: &Value) -> Vec<Representative> {
    let mut found = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(&Value, usize)> = VecDeque::new();
    queue.push_back((root, 0));

    while let Some((value, depth)) = queue.pop_front() {
        if depth > MAX_TRAVERSAL_DEPTH {
            continue;
        }
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if is_representative_key(key) {
                        collect_representatives(child, &mut found, &mut seen);
                    } else {
                        queue.push_back((child, depth + 1));
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    queue.push_back((item, depth + 1));
                }
            }
            _ => {}
        }
    }

    found
}

fn is_representative_key(key: &str) -> bool {
    REPRESENTATIVE_KEY_ALIASES
        .iter()
        .any(|alias| key.eq_ignore_ascii_case(alias))
}

/// A matched key's value may be an array of entries, a single object, or a
/// bare name string.
fn collect_representatives(
    value: &Value,
    found: &mut Vec<Representative>,
    seen: &mut HashSet<String>,
) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_one(item, found, seen);
            }
        }
        _ => collect_one(value, found, seen),
    }
}

fn collect_one(value: &Value, found: &mut Vec<Representative>, seen: &mut HashSet<String>) {
    let rep = match value {
        Value::String(name) => {
            let name = name.trim();
            if name.is_empty() {
                return;
            }
            Representative {
                name: name.to_string(),
                role: None,
            }
        }
        Value::Object(_) => {
            let Some(name) = json_path::first_string_at(value, REP_NAME_PATHS) else {
                return;
            };
            Representative {
                name,
                role: json_path::first_string_at(value, REP_ROLE_PATHS),
            }
        }
        _ => return,
    };

    if seen.insert(rep.name.to_lowercase()) {
        found.push(rep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_full_report() {
        let raw = json!({
            "data": {
                "company": {
                    "denominacion": "ACME SOLUTIONS SL",
                    "nombreComercial": "Acme",
                    "nif": " b 12345678",
                    "cnae": "6201",
                    "telefono": "+34 910000000",
                    "web": "https://acme.example",
                    "formaJuridica": "Sociedad Limitada",
                    "situacion": "Activa",
                    "empleados": "42",
                    "ventas": 1250000.5,
                    "ejercicio": 2024,
                    "capitalSocial": "3000",
                    "domicilio": {
                        "direccion": "Calle Mayor 1",
                        "codigoPostal": 28001,
                        "localidad": "Madrid",
                        "provincia": "Madrid"
                    },
                    "fechaConstitucion": "2001-03-15",
                    "administradores": [
                        {"nombre": "Jane Roe", "cargo": "Administrador Unico"}
                    ]
                }
            }
        });

        let profile = normalize_profile(&raw, "B12345678");
        assert_eq!(profile.name, "ACME SOLUTIONS SL");
        assert_eq!(profile.trade_name.as_deref(), Some("Acme"));
        assert_eq!(profile.tax_id.as_deref(), Some("B12345678"));
        assert_eq!(profile.industry_code.as_deref(), Some("6201"));
        assert_eq!(profile.legal_form.as_deref(), Some("Sociedad Limitada"));
        assert_eq!(profile.status.as_deref(), Some("Activa"));
        assert_eq!(profile.employees, Some(42));
        assert_eq!(profile.sales, Some(1_250_000.5));
        assert_eq!(profile.sales_year, Some(2024));
        assert_eq!(profile.capital_social, Some(3000.0));
        assert_eq!(profile.address.street.as_deref(), Some("Calle Mayor 1"));
        assert_eq!(profile.address.zip.as_deref(), Some("28001"));
        assert_eq!(profile.constitution_date.as_deref(), Some("2001-03-15"));
        // No explicit id field: source id falls back to the sanitized tax id
        assert_eq!(profile.registry_source_id.as_deref(), Some("B12345678"));
        assert_eq!(profile.representatives.len(), 1);
        assert_eq!(profile.representatives[0].name, "Jane Roe");
        assert_eq!(
            profile.representatives[0].role.as_deref(),
            Some("Administrador Unico")
        );
        assert_eq!(profile.raw, raw);
    }

    #[test]
    fn test_normalize_sparse_report_never_fails() {
        let raw = json!({"company": {"nombre": "EMPRESA SA"}});
        let profile = normalize_profile(&raw, "A11111111");
        assert_eq!(profile.name, "EMPRESA SA");
        assert!(profile.tax_id.is_none());
        assert!(profile.employees.is_none());
        assert!(profile.representatives.is_empty());
    }

    #[test]
    fn test_normalize_falls_back_to_requested_identifier() {
        let profile = normalize_profile(&json!({}), "B12345678");
        assert_eq!(profile.name, "B12345678");
    }

    #[test]
    fn test_representatives_found_at_depth_and_case_insensitively() {
        let raw = json!({
            "report": {
                "legal": {
                    "governance": {
                        "Administradores": [
                            {"nombre": "Jane Roe", "cargo": "Presidente"},
                            "John Doe"
                        ]
                    }
                }
            }
        });
        let reps = extract_representatives(&raw);
        assert_eq!(reps.len(), 2);
        assert_eq!(reps[0].name, "Jane Roe");
        assert_eq!(reps[0].role.as_deref(), Some("Presidente"));
        assert_eq!(reps[1].name, "John Doe");
        assert!(reps[1].role.is_none());
    }

    #[test]
    fn test_representatives_single_object_and_string_forms() {
        let raw = json!({"representante": {"name": "Jane Roe", "role": "CEO"}});
        let reps = extract_representatives(&raw);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].role.as_deref(), Some("CEO"));

        let raw = json!({"administrador": "John Doe"});
        let reps = extract_representatives(&raw);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].name, "John Doe");
    }

    #[test]
    fn test_representatives_dedup_by_name_first_seen_wins() {
        let raw = json!({
            "administradores": [{"nombre": "Jane Roe", "cargo": "Presidente"}],
            "legal": {
                "representantes": [{"name": "JANE ROE", "role": "CEO"}]
            }
        });
        let reps = extract_representatives(&raw);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].role.as_deref(), Some("Presidente"));
    }

    #[test]
    fn test_representatives_depth_bound() {
        // Build a payload nested past the traversal bound
        let mut value = json!({"administradores": ["Jane Roe"]});
        for _ in 0..(MAX_TRAVERSAL_DEPTH + 2) {
            value = json!({ "wrapper": value });
        }
        assert!(extract_representatives(&value).is_empty());
    }

    #[test]
    fn test_upgrade_cached_profile_backfills_from_raw() {
        let raw = json!({
            "company": {
                "nombre": "ACME SL",
                "formaJuridica": "Sociedad Limitada",
                "situacion": "Activa",
                "administradores": ["Jane Roe"]
            }
        });
        // A cached row from before the legal-form/status/representative
        // extraction rules existed
        let cached = normalize_profile(&json!({"company": {"nombre": "ACME SL"}}), "B12345678");
        assert!(cached.legal_form.is_none());

        let upgraded = upgrade_cached_profile(cached, &raw);
        assert_eq!(upgraded.legal_form.as_deref(), Some("Sociedad Limitada"));
        assert_eq!(upgraded.status.as_deref(), Some("Activa"));
        assert_eq!(upgraded.representatives.len(), 1);
    }

    #[test]
    fn test_upgrade_leaves_populated_fields_alone() {
        let raw = json!({"company": {"formaJuridica": "Sociedad Anonima"}});
        let mut cached = normalize_profile(&json!({"company": {"nombre": "X SA"}}), "A1");
        cached.legal_form = Some("Sociedad Limitada".to_string());

        let upgraded = upgrade_cached_profile(cached, &raw);
        assert_eq!(upgraded.legal_form.as_deref(), Some("Sociedad Limitada"));
    }
}
