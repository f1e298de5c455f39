//! User management handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::handlers::auth::is_valid_email;
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::user::{User, UserRole};
use crate::services::auth_service::AuthService;

/// Create user routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

pub(crate) fn user_to_response(user: User) -> UserResponse {
    UserResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    }
}

/// List users
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/Users",
    tag = "users",
    responses(
        (status = 200, description = "List of users", body = [UserResponse]),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(State(state): State<SharedState>) -> Result<Json<Vec<UserResponse>>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, password_hash, created_at, updated_at
         FROM users ORDER BY name",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(users.into_iter().map(user_to_response).collect()))
}

/// Get user details
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/Users",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>> {
    let user = fetch_user(&state, id).await?;
    Ok(Json(user_to_response(user)))
}

/// Create user (admin only)
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/Users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "Email already exists"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if !auth.is_admin() {
        return Err(AppError::Authorization(
            "Only admins can create users".to_string(),
        ));
    }

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
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

    let password_hash = AuthService::hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, role, password_hash)
         VALUES ($1, $2, $3, $4)
         RETURNING id, name, email, role, password_hash, created_at, updated_at",
    )
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(payload.role)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if e.to_string().contains("duplicate key") {
            AppError::Conflict("Email already exists".to_string())
        } else {
            AppError::Database(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(user_to_response(user))))
}

/// Update user (self or admin)
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/Users",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Not allowed to update this user"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already exists"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    if auth.user_id != id && !auth.is_admin() {
        return Err(AppError::Authorization(
            "You can only update your own account".to_string(),
        ));
    }
    if payload.role.is_some() && !auth.is_admin() {
        return Err(AppError::Authorization(
            "Only admins can change user roles".to_string(),
        ));
    }
    if let Some(email) = &payload.email {
        if !is_valid_email(email) {
            return Err(AppError::Validation(
                "Email is not a valid email address".to_string(),
            ));
        }
    }

    let password_hash = match &payload.password {
        Some(password) if password.len() < 6 => {
            return Err(AppError::Validation(
                "Password must be at least 6 characters long".to_string(),
            ));
        }
        Some(password) => Some(AuthService::hash_password(password)?),
        None => None,
    };

    let user = sqlx::query_as::<_, User>(
        "UPDATE users
         SET name = COALESCE($2, name),
             email = COALESCE($3, email),
             role = COALESCE($4, role),
             password_hash = COALESCE($5, password_hash),
             updated_at = NOW()
         WHERE id = $1
         RETURNING id, name, email, role, password_hash, created_at, updated_at",
    )
    .bind(id)
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.email.as_deref().map(str::trim))
    .bind(payload.role)
    .bind(password_hash)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| {
        if e.to_string().contains("duplicate key") {
            AppError::Conflict("Email already exists".to_string())
        } else {
            AppError::Database(e.to_string())
        }
    })?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user_to_response(user)))
}

/// Delete user (admin only)
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/Users",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID"),
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still owns courses"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !auth.is_admin() {
        return Err(AppError::Authorization(
            "Only admins can delete users".to_string(),
        ));
    }
    if auth.user_id == id {
        return Err(AppError::Validation("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            // courses.instructor_id is ON DELETE RESTRICT
            if e.to_string().contains("foreign key") {
                AppError::Conflict(
                    "Cannot delete a user who still owns courses".to_string(),
                )
            } else {
                AppError::Database(e.to_string())
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_user(state: &SharedState, id: Uuid) -> Result<User> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, password_hash, created_at, updated_at
         FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_users, get_user, create_user, update_user, delete_user),
    components(schemas(CreateUserRequest, UpdateUserRequest, UserResponse))
)]
pub struct UsersApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_test_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role: UserRole::Student,
            password_hash: "$2b$12$hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    // -----------------------------------------------------------------------
    // user_to_response
    // -----------------------------------------------------------------------

    #[test]
    fn test_user_to_response_basic_fields() {
        let user = make_test_user();
        let uid = user.id;
        let resp = user_to_response(user);
        assert_eq!(resp.user_id, uid);
        assert_eq!(resp.name, "Test User");
        assert_eq!(resp.email, "test@example.com");
        assert_eq!(resp.role, UserRole::Student);
    }

    #[test]
    fn test_user_response_never_exposes_password_hash() {
        let json = serde_json::to_value(user_to_response(make_test_user())).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("userId").is_some());
    }

    // -----------------------------------------------------------------------
    // wire format
    // -----------------------------------------------------------------------

    #[test]
    fn test_create_request_parses_role_names() {
        let req: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "name": "New Admin",
            "email": "admin@example.com",
            "password": "secret123",
            "role": "Admin"
        }))
        .unwrap();
        assert_eq!(req.role, UserRole::Admin);
    }

    #[test]
    fn test_create_request_rejects_unknown_role() {
        let result = serde_json::from_value::<CreateUserRequest>(serde_json::json!({
            "name": "X",
            "email": "x@example.com",
            "password": "secret123",
            "role": "Wizard"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_request_fields_are_optional() {
        let req: UpdateUserRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.name.is_none());
        assert!(req.email.is_none());
        assert!(req.password.is_none());
        assert!(req.role.is_none());
    }
}
