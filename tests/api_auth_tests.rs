// SPDX-License-Identifier: MIT

//! API authentication tests.
//!
//! These tests verify that:
//! 1. The health endpoint is public
//! 2. Enrichment routes reject requests without valid tenant tokens
//! 3. Enrichment routes accept valid tokens (and then fail on the offline
//!    database rather than on auth)

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use registry_enrich::middleware::auth::create_jwt;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_without_token_is_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::get("/api/companies/search?q=acme")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_with_garbage_token_is_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::get("/api/companies/B12345678/profile")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_wrong_key_is_rejected() {
    let (app, _) = common::create_test_app();

    let token = create_jwt("tenant-1", b"some_other_signing_key_entirely").unwrap();
    let response = app
        .oneshot(
            Request::get("/api/companies/search?q=acme")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_passes_auth() {
    let (app, state) = common::create_test_app();

    let token = create_jwt("tenant-1", &state.config.jwt_signing_key).unwrap();
    let response = app
        .oneshot(
            Request::get("/api/companies/B12345678/profile")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Auth passed; the offline mock database is the failure, not a 401
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_valid_token_via_cookie_passes_auth() {
    let (app, state) = common::create_test_app();

    let token = create_jwt("tenant-1", &state.config.jwt_signing_key).unwrap();
    let response = app
        .oneshot(
            Request::get("/api/companies/search?q=acme")
                .header(header::COOKIE, format!("enrich_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
