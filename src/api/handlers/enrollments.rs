//! Enrollment handlers.
//!
//! An enrollment ties a student to a course, at most once per pair. Students
//! manage their own enrollments; instructors can read the roster for courses
//! they teach.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::handlers::courses::fetch_course;
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::enrollment::{Enrollment, EnrollmentWithCourse, EnrollmentWithStudent};

/// Create enrollment routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_enrollments).post(create_enrollment))
        .route("/student", get(student_enrollments))
        .route("/check/:course_id", get(check_enrollment))
        .route("/course/:course_id/students", get(course_roster))
        .route("/:id", get(get_enrollment).delete(delete_enrollment))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnrollmentRequest {
    pub user_id: Uuid,
    pub course_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub enrollment_id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
    pub completed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentEnrollmentResponse {
    pub enrollment_id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
    pub completed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledStudentResponse {
    pub enrollment_id: Uuid,
    pub user_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
    pub completed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentCheckResponse {
    pub is_enrolled: bool,
}

fn enrollment_to_response(row: Enrollment) -> EnrollmentResponse {
    EnrollmentResponse {
        enrollment_id: row.id,
        user_id: row.user_id,
        course_id: row.course_id,
        enrolled_at: row.enrolled_at,
        completed: row.completed,
    }
}

/// List all enrollments
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/Enrollments",
    tag = "enrollments",
    responses(
        (status = 200, description = "List of enrollments", body = [EnrollmentResponse]),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_enrollments(
    State(state): State<SharedState>,
) -> Result<Json<Vec<EnrollmentResponse>>> {
    let rows = sqlx::query_as::<_, Enrollment>(
        "SELECT id, user_id, course_id, enrolled_at, completed
         FROM enrollments ORDER BY enrolled_at DESC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(rows.into_iter().map(enrollment_to_response).collect()))
}

/// Get enrollment details
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/Enrollments",
    tag = "enrollments",
    params(
        ("id" = Uuid, Path, description = "Enrollment ID"),
    ),
    responses(
        (status = 200, description = "Enrollment details", body = EnrollmentResponse),
        (status = 404, description = "Enrollment not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_enrollment(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EnrollmentResponse>> {
    let row = fetch_enrollment(&state, id).await?;
    Ok(Json(enrollment_to_response(row)))
}

/// Enroll a student in a course
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/Enrollments",
    tag = "enrollments",
    request_body = CreateEnrollmentRequest,
    responses(
        (status = 201, description = "Enrollment created", body = EnrollmentResponse),
        (status = 404, description = "User or course not found"),
        (status = 409, description = "Already enrolled"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_enrollment(
    State(state): State<SharedState>,
    Json(payload): Json<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>)> {
    let user_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)",
    )
    .bind(payload.user_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;
    if !user_exists {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    fetch_course(&state, payload.course_id).await?;

    let already_enrolled = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
    )
    .bind(payload.user_id)
    .bind(payload.course_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;
    if already_enrolled {
        return Err(AppError::Conflict(
            "User is already enrolled in this course".to_string(),
        ));
    }

    let enrollment = sqlx::query_as::<_, Enrollment>(
        "INSERT INTO enrollments (user_id, course_id)
         VALUES ($1, $2)
         RETURNING id, user_id, course_id, enrolled_at, completed",
    )
    .bind(payload.user_id)
    .bind(payload.course_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        // A concurrent enrollment can still trip the unique constraint.
        if e.to_string().contains("duplicate key") {
            AppError::Conflict("User is already enrolled in this course".to_string())
        } else {
            AppError::Database(e.to_string())
        }
    })?;

    tracing::info!(
        enrollment_id = %enrollment.id,
        user_id = %enrollment.user_id,
        course_id = %enrollment.course_id,
        "Enrollment created"
    );

    Ok((StatusCode::CREATED, Json(enrollment_to_response(enrollment))))
}

/// Drop an enrollment (owning student only)
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/Enrollments",
    tag = "enrollments",
    params(
        ("id" = Uuid, Path, description = "Enrollment ID"),
    ),
    responses(
        (status = 204, description = "Enrollment removed"),
        (status = 403, description = "Not the enrolled student"),
        (status = 404, description = "Enrollment not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_enrollment(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let enrollment = fetch_enrollment(&state, id).await?;
    if enrollment.user_id != auth.user_id {
        return Err(AppError::Authorization(
            "You can only remove your own enrollments".to_string(),
        ));
    }

    sqlx::query("DELETE FROM enrollments WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(enrollment_id = %id, "Enrollment removed");
    Ok(StatusCode::NO_CONTENT)
}

/// List the calling student's enrollments
#[utoipa::path(
    get,
    path = "/student",
    context_path = "/api/Enrollments",
    tag = "enrollments",
    responses(
        (status = 200, description = "Enrollments of the caller", body = [StudentEnrollmentResponse]),
    ),
    security(("bearer_auth" = []))
)]
pub async fn student_enrollments(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<Vec<StudentEnrollmentResponse>>> {
    let rows = sqlx::query_as::<_, EnrollmentWithCourse>(
        "SELECT e.id, e.user_id, e.course_id, c.title AS course_title,
                e.enrolled_at, e.completed
         FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         WHERE e.user_id = $1
         ORDER BY e.enrolled_at DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(
        rows.into_iter()
            .map(|row| StudentEnrollmentResponse {
                enrollment_id: row.id,
                course_id: row.course_id,
                course_title: row.course_title,
                enrolled_at: row.enrolled_at,
                completed: row.completed,
            })
            .collect(),
    ))
}

/// Check whether the caller is enrolled in a course
#[utoipa::path(
    get,
    path = "/check/{course_id}",
    context_path = "/api/Enrollments",
    tag = "enrollments",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Enrollment status", body = EnrollmentCheckResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_enrollment(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<EnrollmentCheckResponse>> {
    let is_enrolled = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
    )
    .bind(auth.user_id)
    .bind(course_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(EnrollmentCheckResponse { is_enrolled }))
}

/// List students enrolled in a course (course instructor only)
#[utoipa::path(
    get,
    path = "/course/{course_id}/students",
    context_path = "/api/Enrollments",
    tag = "enrollments",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Enrolled students", body = [EnrolledStudentResponse]),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn course_roster(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<EnrolledStudentResponse>>> {
    let course = fetch_course(&state, course_id).await?;
    if course.instructor_id != auth.user_id {
        return Err(AppError::Authorization(
            "Only the course instructor can view enrolled students".to_string(),
        ));
    }

    let rows = sqlx::query_as::<_, EnrollmentWithStudent>(
        "SELECT e.id, e.user_id, u.name AS student_name, u.email AS student_email,
                e.enrolled_at, e.completed
         FROM enrollments e
         JOIN users u ON u.id = e.user_id
         WHERE e.course_id = $1
         ORDER BY u.name",
    )
    .bind(course_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(
        rows.into_iter()
            .map(|row| EnrolledStudentResponse {
                enrollment_id: row.id,
                user_id: row.user_id,
                student_name: row.student_name,
                student_email: row.student_email,
                enrolled_at: row.enrolled_at,
                completed: row.completed,
            })
            .collect(),
    ))
}

async fn fetch_enrollment(state: &SharedState, id: Uuid) -> Result<Enrollment> {
    sqlx::query_as::<_, Enrollment>(
        "SELECT id, user_id, course_id, enrolled_at, completed
         FROM enrollments WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?
    .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_enrollments,
        get_enrollment,
        create_enrollment,
        delete_enrollment,
        student_enrollments,
        check_enrollment,
        course_roster
    ),
    components(schemas(
        CreateEnrollmentRequest,
        EnrollmentResponse,
        StudentEnrollmentResponse,
        EnrolledStudentResponse,
        EnrollmentCheckResponse
    ))
)]
pub struct EnrollmentsApiDoc;
