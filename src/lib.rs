// SPDX-License-Identifier: MIT

//! Registry-Enrich: business-registry enrichment for the invoicing product
//!
//! This crate provides the backend API that looks up a company's
//! legal/fiscal profile from the external business registry, normalizes
//! the response into a stable schema, and caches results per tenant.

pub mod config;
pub mod db;
pub mod error;
pub mod json_path;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod sanitize;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{ProfileService, SearchService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub search: SearchService,
    pub profiles: ProfileService,
}
