//! Authentication handlers.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::user::UserRole;
use crate::services::auth_service::AuthService;

/// Create public auth routes (no auth required)
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub token: String,
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub redirect_to: String,
}

/// Minimal email shape check: exactly one `@`, not at either end.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let at_count = email.chars().filter(|&c| c == '@').count();
    at_count == 1 && !email.starts_with('@') && !email.ends_with('@')
}

/// Validate a registration payload and resolve the requested role.
///
/// All checks run before any database access, in a fixed order so error
/// messages are predictable for the frontend.
pub(crate) fn validate_registration(payload: &RegisterRequest) -> Result<UserRole> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    if !is_valid_email(&payload.email) {
        return Err(AppError::Validation(
            "Email is not a valid email address".to_string(),
        ));
    }
    if payload.password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters long".to_string(),
        ));
    }
    if payload.password != payload.confirm_password {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    match payload.role.parse::<UserRole>() {
        Ok(role @ (UserRole::Student | UserRole::Instructor)) => Ok(role),
        _ => Err(AppError::Validation(
            "Role must be either Student or Instructor".to_string(),
        )),
    }
}

/// Dashboard the frontend should land on after registration.
pub(crate) fn dashboard_path(role: UserRole) -> &'static str {
    match role {
        UserRole::Student => "/student-dashboard",
        UserRole::Instructor => "/instructor-dashboard",
        UserRole::Admin => "/admin-dashboard",
    }
}

/// Login with credentials
#[utoipa::path(
    post,
    path = "/login",
    context_path = "/api/Auth",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth_service = AuthService::new(state.db.clone(), Arc::new(state.config.clone()));

    let (user, token) = auth_service
        .authenticate(&payload.email, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        name: user.name,
        role: user.role,
    }))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    context_path = "/api/Auth",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error"),
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let role = validate_registration(&payload)?;

    let auth_service = AuthService::new(state.db.clone(), Arc::new(state.config.clone()));
    let (user, token) = auth_service
        .register(payload.name.trim(), payload.email.trim(), &payload.password, role)
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "New account registered");

    Ok(Json(RegisterResponse {
        token,
        user_id: user.id,
        name: user.name,
        role: user.role,
        redirect_to: dashboard_path(role).to_string(),
    }))
}

#[derive(OpenApi)]
#[openapi(
    paths(login, register),
    components(schemas(LoginRequest, LoginResponse, RegisterRequest, RegisterResponse))
)]
pub struct AuthApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_registration() -> RegisterRequest {
        RegisterRequest {
            name: "Quinn Learner".to_string(),
            email: "quinn@example.com".to_string(),
            password: "secret123".to_string(),
            confirm_password: "secret123".to_string(),
            role: "Student".to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // is_valid_email
    // -----------------------------------------------------------------------

    #[test]
    fn test_email_accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a@b"));
    }

    #[test]
    fn test_email_rejects_missing_or_misplaced_at() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("a@b@c"));
    }

    // -----------------------------------------------------------------------
    // validate_registration
    // -----------------------------------------------------------------------

    #[test]
    fn test_valid_registration_resolves_role() {
        assert_eq!(
            validate_registration(&valid_registration()).unwrap(),
            UserRole::Student
        );

        let mut req = valid_registration();
        req.role = "Instructor".to_string();
        assert_eq!(validate_registration(&req).unwrap(), UserRole::Instructor);
    }

    #[test]
    fn test_registration_rejects_blank_name() {
        let mut req = valid_registration();
        req.name = "   ".to_string();
        let err = validate_registration(&req).unwrap_err();
        assert!(err.to_string().contains("Name is required"));
    }

    #[test]
    fn test_registration_rejects_short_password() {
        let mut req = valid_registration();
        req.password = "12345".to_string();
        req.confirm_password = "12345".to_string();
        let err = validate_registration(&req).unwrap_err();
        assert!(err
            .to_string()
            .contains("Password must be at least 6 characters long"));
    }

    #[test]
    fn test_registration_rejects_mismatched_confirmation() {
        let mut req = valid_registration();
        req.confirm_password = "different".to_string();
        let err = validate_registration(&req).unwrap_err();
        assert!(err.to_string().contains("Passwords do not match"));
    }

    #[test]
    fn test_registration_rejects_admin_role() {
        let mut req = valid_registration();
        req.role = "Admin".to_string();
        let err = validate_registration(&req).unwrap_err();
        assert!(err
            .to_string()
            .contains("Role must be either Student or Instructor"));
    }

    #[test]
    fn test_registration_checks_password_before_confirmation() {
        // Both checks would fail; the length error must win
        let mut req = valid_registration();
        req.password = "123".to_string();
        req.confirm_password = "456".to_string();
        let err = validate_registration(&req).unwrap_err();
        assert!(err.to_string().contains("at least 6 characters"));
    }

    // -----------------------------------------------------------------------
    // dashboard_path
    // -----------------------------------------------------------------------

    #[test]
    fn test_dashboard_path_by_role() {
        assert_eq!(dashboard_path(UserRole::Student), "/student-dashboard");
        assert_eq!(dashboard_path(UserRole::Instructor), "/instructor-dashboard");
    }

    // -----------------------------------------------------------------------
    // wire format
    // -----------------------------------------------------------------------

    #[test]
    fn test_register_request_uses_camel_case() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "Quinn",
            "email": "quinn@example.com",
            "password": "secret123",
            "confirmPassword": "secret123",
            "role": "Student"
        }))
        .unwrap();
        assert_eq!(req.confirm_password, "secret123");
    }

    #[test]
    fn test_register_response_uses_camel_case() {
        let resp = RegisterResponse {
            token: "jwt".to_string(),
            user_id: Uuid::new_v4(),
            name: "Quinn".to_string(),
            role: UserRole::Student,
            redirect_to: "/student-dashboard".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("redirectTo").is_some());
        assert_eq!(json["role"], "Student");
    }
}
