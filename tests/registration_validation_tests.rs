//! Registration validation tests.
//!
//! Invalid registration payloads are rejected by the handler before any
//! database work, so these run through the full router against a lazy
//! pool that never connects.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{lazy_pool, test_app, test_config};

async fn register(payload: Value) -> (StatusCode, Value) {
    let app = test_app(lazy_pool(&test_config().database_url));

    let req = Request::builder()
        .method("POST")
        .uri("/api/Auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn valid_payload() -> Value {
    json!({
        "name": "Pat Learner",
        "email": "pat@example.com",
        "password": "secret123",
        "confirmPassword": "secret123",
        "role": "Student",
    })
}

#[tokio::test]
async fn test_missing_name_is_rejected() {
    let mut payload = valid_payload();
    payload["name"] = json!("   ");
    let (status, body) = register(payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Name is required");
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let mut payload = valid_payload();
    payload["email"] = json!("not-an-email");
    let (status, body) = register(payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Email is not a valid email address");
}

#[tokio::test]
async fn test_short_password_is_rejected() {
    let mut payload = valid_payload();
    payload["password"] = json!("abc");
    payload["confirmPassword"] = json!("abc");
    let (status, body) = register(payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Password must be at least 6 characters long");
}

#[tokio::test]
async fn test_password_mismatch_is_rejected() {
    let mut payload = valid_payload();
    payload["confirmPassword"] = json!("different123");
    let (status, body) = register(payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Passwords do not match");
}

#[tokio::test]
async fn test_admin_role_cannot_self_register() {
    let mut payload = valid_payload();
    payload["role"] = json!("Admin");
    let (status, body) = register(payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Role must be either Student or Instructor");
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let mut payload = valid_payload();
    payload["role"] = json!("Wizard");
    let (status, body) = register(payload).await;

    // Role arrives as a free-form string; unknown names fall out in
    // validation, not deserialization
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Role must be either Student or Instructor");
}
