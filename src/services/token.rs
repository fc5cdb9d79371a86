// SPDX-License-Identifier: MIT

//! OAuth2 client-credentials token acquisition for the registry.
//!
//! Providers disagree on whether the grant wants a `scope`, an `audience`,
//! both, or neither, so the manager tries an ordered list of request-body
//! candidates and caches the first accepted token.

use crate::config::RegistrySettings;
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Margin before token expiry when a cached token stops being trusted.
/// Covers clock skew and requests already in flight.
const TOKEN_EXPIRY_MARGIN_MS: i64 = 30_000;

/// Lifetime assumed when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3_600;

/// Minimal scope requested when nothing is configured.
const DEFAULT_SCOPE: &str = "companies.read";

/// Cached access token with expiry information.
#[derive(Debug, Clone)]
pub struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::milliseconds(TOKEN_EXPIRY_MARGIN_MS)
    }
}

/// One request-body variant to try against the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCandidate {
    pub scope: Option<String>,
    pub audience: Option<String>,
}

impl TokenCandidate {
    fn scope(value: &str) -> Self {
        Self {
            scope: Some(value.to_string()),
            audience: None,
        }
    }

    fn audience(value: &str) -> Self {
        Self {
            scope: None,
            audience: Some(value.to_string()),
        }
    }

    fn bare() -> Self {
        Self {
            scope: None,
            audience: None,
        }
    }
}

/// Build the ordered list of negotiation candidates.
///
/// 1. An explicitly configured scope/audience combination is used as-is.
/// 2. A legacy combined value is mapped by shape: URL-looking values are
///    tried as audience first, everything else as scope first, then the
///    opposite mapping.
/// 3. With nothing configured, a minimal default scope.
/// 4. Always ends with the bare grant; some providers reject any explicit
///    scope and only answer with their default.
pub fn build_token_candidates(settings: &RegistrySettings) -> Vec<TokenCandidate> {
    let mut candidates = Vec::new();

    if settings.scope.is_some() || settings.audience.is_some() {
        candidates.push(TokenCandidate {
            scope: settings.scope.clone(),
            audience: settings.audience.clone(),
        });
    } else if let Some(combined) = &settings.scope_or_audience {
        if looks_like_audience(combined) {
            candidates.push(TokenCandidate::audience(combined));
            candidates.push(TokenCandidate::scope(combined));
        } else {
            candidates.push(TokenCandidate::scope(combined));
            candidates.push(TokenCandidate::audience(combined));
        }
    } else {
        candidates.push(TokenCandidate::scope(DEFAULT_SCOPE));
    }

    candidates.push(TokenCandidate::bare());
    candidates
}

/// Shape heuristic for the legacy combined value: URL-looking strings are
/// audiences. Best-effort guess, kept as observed in production.
fn looks_like_audience(value: &str) -> bool {
    value.contains("://") || value.contains('/')
}

/// Whether a rejection is the "invalid grant" class that justifies trying
/// the next candidate. Provider-specific: exactly status 400 with an
/// `invalid_grant` marker in the body. Anything else aborts the loop so
/// real credential/config errors are not masked by weaker candidates.
pub fn is_invalid_grant_rejection(status: u16, body: &str) -> bool {
    status == 400 && body.contains("invalid_grant")
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Acquires and caches the registry access token.
///
/// One registry account per deployment, so the cache is a single slot
/// shared across clones. Concurrent callers may race to refresh an expired
/// token; the grant is idempotent, so a few redundant token requests are
/// cheaper than serializing every call behind a lock.
#[derive(Clone)]
pub struct TokenManager {
    http: reqwest::Client,
    settings: RegistrySettings,
    cached: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, settings: RegistrySettings) -> Self {
        Self {
            http,
            settings,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a valid access token, refreshing if the cached one is expired
    /// or inside the expiry margin.
    pub async fn get_access_token(&self) -> Result<String, AppError> {
        let now = Utc::now();

        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_valid(now) {
                    return Ok(token.value.clone());
                }
            }
        }

        // The lock is not held across the refresh on purpose; see the
        // struct docs.
        let token = self.request_token().await?;
        let value = token.value.clone();
        *self.cached.write().await = Some(token);
        Ok(value)
    }

    /// Negotiate a fresh token, trying candidates strictly in order.
    async fn request_token(&self) -> Result<CachedToken, AppError> {
        let token_url = self
            .settings
            .token_url
            .as_deref()
            .ok_or(AppError::Configuration("REGISTRY_TOKEN_URL"))?;
        let client_id = self
            .settings
            .client_id
            .as_deref()
            .ok_or(AppError::Configuration("REGISTRY_CLIENT_ID"))?;
        let client_secret = self
            .settings
            .client_secret
            .as_deref()
            .ok_or(AppError::Configuration("REGISTRY_CLIENT_SECRET"))?;

        let candidates = build_token_candidates(&self.settings);
        let total = candidates.len();
        let mut last_error = String::new();

        for (index, candidate) in candidates.iter().enumerate() {
            tracing::debug!(
                candidate = index + 1,
                total,
                scope = ?candidate.scope,
                audience = ?candidate.audience,
                "Requesting registry access token"
            );

            let mut form: Vec<(&str, &str)> = vec![
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ];
            if let Some(scope) = candidate.scope.as_deref() {
                form.push(("scope", scope));
            }
            if let Some(audience) = candidate.audience.as_deref() {
                form.push(("audience", audience));
            }

            let send = self.http.post(token_url).form(&form).send();
            let response = tokio::time::timeout(self.settings.timeout, send)
                .await
                .map_err(|_| AppError::Timeout(token_url.to_string()))?
                .map_err(|e| AppError::UpstreamAuth(format!("token request failed: {}", e)))?;

            let status = response.status();
            if status.is_success() {
                let body: TokenResponse = response.json().await.map_err(|e| {
                    AppError::UpstreamAuth(format!("malformed token response: {}", e))
                })?;
                let lifetime = body.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
                tracing::info!(
                    candidate = index + 1,
                    expires_in = lifetime,
                    "Registry access token acquired"
                );
                return Ok(CachedToken {
                    value: body.access_token,
                    expires_at: Utc::now() + Duration::seconds(lifetime),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_invalid_grant_rejection(status.as_u16(), &body) {
                tracing::warn!(
                    candidate = index + 1,
                    total,
                    "Token candidate rejected as invalid_grant, trying next"
                );
                last_error = format!("HTTP {}: {}", status, body);
                continue;
            }

            return Err(AppError::UpstreamAuth(format!("HTTP {}: {}", status, body)));
        }

        Err(AppError::UpstreamAuth(format!(
            "all token candidates rejected; last error: {}",
            last_error
        )))
    }
}
