// SPDX-License-Identifier: MIT

//! Authenticated HTTP gateway to the registry API.
//!
//! Handles:
//! - Base-path-safe joining of relative endpoint paths
//! - Bearer auth via the token manager
//! - Per-call timeout enforcement
//! - Structured errors carrying status, resolved URL, and body text

use crate::config::RegistrySettings;
use crate::error::AppError;
use crate::services::TokenManager;
use reqwest::header;
use serde::de::DeserializeOwned;

/// Low-level registry API client.
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    settings: RegistrySettings,
    tokens: TokenManager,
}

impl RegistryClient {
    /// Create a new registry client. The token manager shares the same
    /// settings and HTTP connection pool.
    pub fn new(settings: RegistrySettings) -> Self {
        let http = reqwest::Client::new();
        Self {
            tokens: TokenManager::new(http.clone(), settings.clone()),
            http,
            settings,
        }
    }

    /// GET a registry endpoint and parse the JSON response.
    ///
    /// `path` is always treated as relative to the configured base URL so
    /// an existing base path segment (e.g. `/api/v1`) is preserved.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let base = self
            .settings
            .base_url
            .as_deref()
            .ok_or(AppError::Configuration("REGISTRY_API_BASE_URL"))?;
        let url = join_relative(base, path)?;
        let token = self.tokens.get_access_token().await?;

        let mut request = self
            .http
            .get(url.clone())
            .bearer_auth(&token)
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            // reqwest runs these through its form encoder; no manual escaping
            request = request.query(query);
        }

        let response = tokio::time::timeout(self.settings.timeout, request.send())
            .await
            .map_err(|_| AppError::Timeout(url.to_string()))?
            .map_err(|e| AppError::UpstreamHttp {
                // status 0 marks a transport failure before any response
                status: 0,
                url: url.to_string(),
                body: format!("transport error: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            // Body text is best-effort; a failed read must not hide the status
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamHttp {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        response.json().await.map_err(|e| AppError::UpstreamHttp {
            status: status.as_u16(),
            url: url.to_string(),
            body: format!("JSON parse error: {}", e),
        })
    }
}

/// Join an endpoint path onto the base URL, preserving any base path.
///
/// Leading slashes on `path` are stripped before joining; otherwise URL
/// resolution would treat the path as absolute and drop a base segment
/// like `/api/v1`.
pub fn join_relative(base: &str, path: &str) -> Result<reqwest::Url, AppError> {
    let mut base = base.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let relative = path.trim_start_matches('/');

    let base_url = reqwest::Url::parse(&base)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid registry base URL: {}", e)))?;
    base_url
        .join(relative)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid registry path {}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_preserves_base_path_segment() {
        let url = join_relative("https://registry.example.com/api/v1", "/companies/search")
            .expect("join");
        assert_eq!(
            url.as_str(),
            "https://registry.example.com/api/v1/companies/search"
        );
    }

    #[test]
    fn test_join_with_trailing_slash_base() {
        let url = join_relative("https://registry.example.com/api/v1/", "companies/search")
            .expect("join");
        assert_eq!(
            url.as_str(),
            "https://registry.example.com/api/v1/companies/search"
        );
    }

    #[test]
    fn test_join_without_base_path() {
        let url = join_relative("https://registry.example.com", "companies/B12345678/report")
            .expect("join");
        assert_eq!(
            url.as_str(),
            "https://registry.example.com/companies/B12345678/report"
        );
    }
}
