// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Registry credentials are optional at startup so the service can boot
//! without enrichment configured; they are validated when the registry
//! client is actually used.

use std::env;
use std::time::Duration;

/// Default bound for every registry network call (token, search, report).
pub const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 8_000;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for tenant session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Business-registry connection settings
    pub registry: RegistrySettings,
}

/// Connection settings for the external business registry.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// OAuth2 token endpoint (client-credentials grant)
    pub token_url: Option<String>,
    /// OAuth2 client id
    pub client_id: Option<String>,
    /// OAuth2 client secret
    pub client_secret: Option<String>,
    /// Registry API base URL; may carry a base path segment (e.g. `/api/v1`)
    pub base_url: Option<String>,
    /// Explicit OAuth2 scope, if the provider wants one
    pub scope: Option<String>,
    /// Explicit OAuth2 audience, if the provider wants one
    pub audience: Option<String>,
    /// Legacy combined scope-or-audience value (older deployments set a
    /// single variable and let the client guess which one it is)
    pub scope_or_audience: Option<String>,
    /// Bound for each registry network call
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            registry: RegistrySettings::from_env()?,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            registry: RegistrySettings::test_default(),
        }
    }
}

impl RegistrySettings {
    /// Read registry settings from the environment.
    ///
    /// `REGISTRY_API_BASE_URL` is the current name for the base URL;
    /// `REGISTRY_BASE_URL` is still accepted for older deployments.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_ms = match opt_env("REGISTRY_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("REGISTRY_TIMEOUT_MS"))?,
            None => DEFAULT_REGISTRY_TIMEOUT_MS,
        };

        Ok(Self {
            token_url: opt_env("REGISTRY_TOKEN_URL"),
            client_id: opt_env("REGISTRY_CLIENT_ID"),
            client_secret: opt_env("REGISTRY_CLIENT_SECRET"),
            base_url: opt_env("REGISTRY_API_BASE_URL").or_else(|| opt_env("REGISTRY_BASE_URL")),
            scope: opt_env("REGISTRY_SCOPE"),
            audience: opt_env("REGISTRY_AUDIENCE"),
            scope_or_audience: opt_env("REGISTRY_SCOPE_OR_AUDIENCE"),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Settings for tests: fully configured, pointing at localhost.
    pub fn test_default() -> Self {
        Self {
            token_url: Some("http://localhost:9090/oauth/token".to_string()),
            client_id: Some("test_client_id".to_string()),
            client_secret: Some("test_client_secret".to_string()),
            base_url: Some("http://localhost:9090/api/v1".to_string()),
            scope: None,
            audience: None,
            scope_or_audience: None,
            timeout: Duration::from_millis(DEFAULT_REGISTRY_TIMEOUT_MS),
        }
    }
}

/// Read an env var, treating unset and blank values the same.
fn opt_env(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) => {
            let v = v.trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        }
        Err(_) => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
