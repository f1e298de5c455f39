//! Authentication middleware.
//!
//! Extracts and validates bearer JWTs from the Authorization header and
//! exposes the caller to handlers via an `AuthExtension` request extension.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::models::user::UserRole;
use crate::services::auth_service::{AuthService, Claims};

/// Extension that holds authenticated user information
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub user_id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl AuthExtension {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_instructor(&self) -> bool {
        self.role == UserRole::Instructor
    }
}

impl From<Claims> for AuthExtension {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            role: claims.role,
        }
    }
}

/// Token extraction result
#[derive(Debug)]
enum ExtractedToken<'a> {
    /// JWT from Bearer scheme
    Bearer(&'a str),
    /// No token found
    None,
    /// Invalid header format
    Invalid,
}

/// Extract token from an Authorization header value
fn extract_token_from_auth_header(auth_header: &str) -> ExtractedToken<'_> {
    if let Some(token) = auth_header.strip_prefix("Bearer ") {
        ExtractedToken::Bearer(token)
    } else {
        ExtractedToken::Invalid
    }
}

/// Extract token from request headers
fn extract_token(request: &Request) -> ExtractedToken<'_> {
    match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(auth_header) => extract_token_from_auth_header(auth_header),
        None => ExtractedToken::None,
    }
}

/// Authentication middleware function - requires a valid bearer JWT
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match extract_token(&request) {
        ExtractedToken::Bearer(token) => match auth_service.validate_token(token) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthExtension::from(claims));
                next.run(request).await
            }
            Err(_) => (StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response(),
        },
        ExtractedToken::None => {
            (StatusCode::UNAUTHORIZED, "Missing authorization header").into_response()
        }
        ExtractedToken::Invalid => {
            (StatusCode::UNAUTHORIZED, "Invalid authorization header format").into_response()
        }
    }
}

/// Optional authentication middleware - allows unauthenticated requests
///
/// Always inserts an `Option<AuthExtension>`; handlers on public routes
/// extract `Extension<Option<AuthExtension>>` to see who, if anyone, is
/// calling.
pub async fn optional_auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_ext = match extract_token(&request) {
        ExtractedToken::Bearer(token) => auth_service
            .validate_token(token)
            .ok()
            .map(AuthExtension::from),
        ExtractedToken::None | ExtractedToken::Invalid => None,
    };

    request.extensions_mut().insert(auth_ext);
    next.run(request).await
}
