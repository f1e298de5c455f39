//! Route protection tests.
//!
//! These drive the full application router without a live database: every
//! request is either served from static state (health, OpenAPI spec) or
//! rejected by the auth middleware before any query runs.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt;
use uuid::Uuid;

use learntrack_backend::models::user::{User, UserRole};
use learntrack_backend::services::auth_service::AuthService;

use common::{bearer, lazy_pool, test_app, test_config};

// ===========================================================================
// Public surface
// ===========================================================================

#[tokio::test]
async fn test_liveness_endpoint_is_public() {
    let app = test_app(lazy_pool(&test_config().database_url));

    let req = Request::builder()
        .uri("/livez")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_spec_is_served() {
    let app = test_app(lazy_pool(&test_config().database_url));

    let req = Request::builder()
        .uri("/api/openapi.json")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let spec: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(spec["info"]["title"], "LearnTrack API");
    assert!(spec["paths"].as_object().is_some_and(|p| !p.is_empty()));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app(lazy_pool(&test_config().database_url));

    let req = Request::builder()
        .uri("/api/NoSuchThing")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ===========================================================================
// Missing and malformed credentials
// ===========================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = test_app(lazy_pool(&test_config().database_url));

    for (method, uri) in [
        ("GET", "/api/Users"),
        ("GET", "/api/Results"),
        ("GET", "/api/Enrollments"),
        ("GET", "/api/Assessments"),
        ("POST", "/api/Courses"),
        ("GET", "/api/Files/test"),
        ("POST", "/api/Files/upload"),
    ] {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();

        assert_eq!(
            resp.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should require a token"
        );
        let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8_lossy(&body),
            "Missing authorization header"
        );
    }
}

#[tokio::test]
async fn test_garbage_bearer_token_is_rejected() {
    let app = test_app(lazy_pool(&test_config().database_url));

    let req = Request::builder()
        .uri("/api/Results")
        .header(header::AUTHORIZATION, bearer("not-a-jwt"))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&body), "Invalid or expired token");
}

#[tokio::test]
async fn test_basic_auth_scheme_is_rejected() {
    let app = test_app(lazy_pool(&test_config().database_url));

    let req = Request::builder()
        .uri("/api/Enrollments")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8_lossy(&body),
        "Invalid authorization header format"
    );
}

#[tokio::test]
async fn test_token_signed_with_wrong_secret_is_rejected() {
    let config = test_config();
    let app = test_app(lazy_pool(&config.database_url));

    // Issue a structurally valid token with a different signing secret
    let mut rogue_config = test_config();
    rogue_config.jwt_secret = "a-completely-different-secret-key".into();
    let rogue_service = AuthService::new(
        lazy_pool(&rogue_config.database_url),
        Arc::new(rogue_config),
    );
    let user = User {
        id: Uuid::new_v4(),
        name: "Mallory".to_string(),
        email: "mallory@test.local".to_string(),
        role: UserRole::Admin,
        password_hash: String::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let token = rogue_service.issue_token(&user).unwrap();

    let req = Request::builder()
        .uri("/api/Users")
        .header(header::AUTHORIZATION, bearer(&token))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&body), "Invalid or expired token");
}
