//! Course handlers.
//!
//! Listing and detail views are public with optional authentication; the
//! viewer, when present, only influences the `isEnrolled` flag. Mutations
//! require the instructor role and write the external URLs both to the
//! course row and to the blob store inside one transaction, so a storage
//! failure rolls the row back.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::course::{Course, CourseWithStats};
use crate::models::user::UserRole;
use crate::services::course_files_service::CourseUrls;

const COURSE_SELECT: &str = "SELECT c.id, c.title, c.description, c.instructor_id,
            u.name AS instructor_name, c.media_url, c.course_content,
            (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) AS enrollment_count,
            (SELECT COUNT(*) FROM assessments a WHERE a.course_id = c.id) AS assessment_count,
            c.created_at, c.updated_at
     FROM courses c
     JOIN users u ON u.id = c.instructor_id";

/// Routes that are readable without a token
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_courses))
        .route("/:id", get(get_course))
}

/// Routes that require authentication
pub fn protected_router() -> Router<SharedState> {
    Router::new()
        .route("/", axum::routing::post(create_course))
        .route(
            "/:id",
            axum::routing::put(update_course).delete(delete_course),
        )
        .route("/available", get(available_courses))
        .route("/my", get(my_courses))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub media_url: Option<String>,
    pub course_content: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub media_url: Option<String>,
    pub course_content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor_id: Uuid,
    pub instructor_name: String,
    pub media_url: Option<String>,
    pub course_content: Option<String>,
    pub enrollment_count: i64,
    pub assessment_count: i64,
    pub is_enrolled: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

/// Blob-stored URLs take precedence over the database columns.
pub(crate) fn course_to_response(
    row: CourseWithStats,
    urls: CourseUrls,
    is_enrolled: bool,
) -> CourseResponse {
    CourseResponse {
        course_id: row.id,
        title: row.title,
        description: row.description,
        instructor_id: row.instructor_id,
        instructor_name: row.instructor_name,
        media_url: urls.media_url.or(row.media_url),
        course_content: urls.content_url.or(row.course_content),
        enrollment_count: row.enrollment_count,
        assessment_count: row.assessment_count,
        is_enrolled,
        created_at: row.created_at,
        last_updated: row.updated_at,
    }
}

/// List all courses
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/Courses",
    tag = "courses",
    responses(
        (status = 200, description = "List of courses", body = [CourseResponse]),
    )
)]
pub async fn list_courses(
    State(state): State<SharedState>,
    Extension(viewer): Extension<Option<AuthExtension>>,
) -> Result<Json<Vec<CourseResponse>>> {
    let rows = sqlx::query_as::<_, CourseWithStats>(&format!(
        "{} ORDER BY c.created_at DESC",
        COURSE_SELECT
    ))
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let enrolled = enrolled_course_ids(&state, viewer.as_ref()).await?;

    let mut responses = Vec::with_capacity(rows.len());
    for row in rows {
        let urls = state.files.fetch_urls(row.id).await?;
        let is_enrolled = enrolled.contains(&row.id);
        responses.push(course_to_response(row, urls, is_enrolled));
    }
    Ok(Json(responses))
}

/// Get course details
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/Courses",
    tag = "courses",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Course details", body = CourseResponse),
        (status = 404, description = "Course not found"),
    )
)]
pub async fn get_course(
    State(state): State<SharedState>,
    Extension(viewer): Extension<Option<AuthExtension>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseResponse>> {
    load_course_response(&state, id, viewer.as_ref()).await.map(Json)
}

/// Create course (instructors only)
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/Courses",
    tag = "courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 403, description = "Instructor role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_course(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>)> {
    if auth.role != UserRole::Instructor {
        return Err(AppError::Authorization(
            "Only instructors can create courses".to_string(),
        ));
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let course = sqlx::query_as::<_, Course>(
        "INSERT INTO courses (title, description, instructor_id, media_url, course_content)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, title, description, instructor_id, media_url, course_content,
                   created_at, updated_at",
    )
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(auth.user_id)
    .bind(&payload.media_url)
    .bind(&payload.course_content)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    // Dropping the open transaction on a storage error rolls the row back.
    state
        .files
        .store_urls(
            course.id,
            payload.course_content.as_deref(),
            payload.media_url.as_deref(),
        )
        .await?;

    tx.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(course_id = %course.id, instructor_id = %auth.user_id, "Course created");

    let response = load_course_response(&state, course.id, Some(&auth)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Update course (owning instructor only)
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/Courses",
    tag = "courses",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
    ),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_course(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>> {
    let course = fetch_course(&state, id).await?;
    if course.instructor_id != auth.user_id {
        return Err(AppError::Authorization(
            "Only the course instructor can modify this course".to_string(),
        ));
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    sqlx::query(
        "UPDATE courses
         SET title = $2,
             description = $3,
             media_url = COALESCE($4, media_url),
             course_content = COALESCE($5, course_content),
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(&payload.media_url)
    .bind(&payload.course_content)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    state
        .files
        .store_urls(
            id,
            payload.course_content.as_deref(),
            payload.media_url.as_deref(),
        )
        .await?;

    tx.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let response = load_course_response(&state, id, Some(&auth)).await?;
    Ok(Json(response))
}

/// Delete course (owning instructor only)
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/Courses",
    tag = "courses",
    params(
        ("id" = Uuid, Path, description = "Course ID"),
    ),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_course(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let course = fetch_course(&state, id).await?;
    if course.instructor_id != auth.user_id {
        return Err(AppError::Authorization(
            "Only the course instructor can delete this course".to_string(),
        ));
    }

    sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    // The row is gone either way; orphaned blobs only waste space.
    if let Err(e) = state.files.delete_urls(id).await {
        tracing::warn!(course_id = %id, error = %e, "Failed to delete course blobs");
    }

    tracing::info!(course_id = %id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List courses the student has not enrolled in yet
#[utoipa::path(
    get,
    path = "/available",
    context_path = "/api/Courses",
    tag = "courses",
    responses(
        (status = 200, description = "Courses open for enrollment", body = [CourseResponse]),
        (status = 403, description = "Student role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn available_courses(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<Vec<CourseResponse>>> {
    if auth.role != UserRole::Student {
        return Err(AppError::Authorization(
            "Only students can view available courses".to_string(),
        ));
    }

    let rows = sqlx::query_as::<_, CourseWithStats>(&format!(
        "{} WHERE c.id NOT IN (SELECT course_id FROM enrollments WHERE user_id = $1)
         ORDER BY c.created_at DESC",
        COURSE_SELECT
    ))
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let mut responses = Vec::with_capacity(rows.len());
    for row in rows {
        let urls = state.files.fetch_urls(row.id).await?;
        responses.push(course_to_response(row, urls, false));
    }
    Ok(Json(responses))
}

/// List courses taught by the calling instructor
#[utoipa::path(
    get,
    path = "/my",
    context_path = "/api/Courses",
    tag = "courses",
    responses(
        (status = 200, description = "Courses taught by the caller", body = [CourseResponse]),
        (status = 403, description = "Instructor role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_courses(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<Vec<CourseResponse>>> {
    if auth.role != UserRole::Instructor {
        return Err(AppError::Authorization(
            "Only instructors can view their courses".to_string(),
        ));
    }

    let rows = sqlx::query_as::<_, CourseWithStats>(&format!(
        "{} WHERE c.instructor_id = $1 ORDER BY c.created_at DESC",
        COURSE_SELECT
    ))
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let mut responses = Vec::with_capacity(rows.len());
    for row in rows {
        let urls = state.files.fetch_urls(row.id).await?;
        responses.push(course_to_response(row, urls, false));
    }
    Ok(Json(responses))
}

pub(crate) async fn fetch_course(state: &SharedState, id: Uuid) -> Result<Course> {
    sqlx::query_as::<_, Course>(
        "SELECT id, title, description, instructor_id, media_url, course_content,
                created_at, updated_at
         FROM courses WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?
    .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
}

async fn load_course_response(
    state: &SharedState,
    id: Uuid,
    viewer: Option<&AuthExtension>,
) -> Result<CourseResponse> {
    let row = sqlx::query_as::<_, CourseWithStats>(&format!("{} WHERE c.id = $1", COURSE_SELECT))
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    let urls = state.files.fetch_urls(id).await?;
    let is_enrolled = match viewer {
        Some(viewer) => sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(viewer.user_id)
        .bind(id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?,
        None => false,
    };

    Ok(course_to_response(row, urls, is_enrolled))
}

async fn enrolled_course_ids(
    state: &SharedState,
    viewer: Option<&AuthExtension>,
) -> Result<HashSet<Uuid>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT course_id FROM enrollments WHERE user_id = $1",
    )
    .bind(viewer.user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(ids.into_iter().collect())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_courses,
        get_course,
        create_course,
        update_course,
        delete_course,
        available_courses,
        my_courses
    ),
    components(schemas(CreateCourseRequest, UpdateCourseRequest, CourseResponse))
)]
pub struct CoursesApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_row() -> CourseWithStats {
        let now = Utc::now();
        CourseWithStats {
            id: Uuid::new_v4(),
            title: "Intro to Databases".to_string(),
            description: "Relational fundamentals".to_string(),
            instructor_id: Uuid::new_v4(),
            instructor_name: "Dr. Codd".to_string(),
            media_url: Some("https://db.example.com/row-media.mp4".to_string()),
            course_content: Some("https://db.example.com/row-content.pdf".to_string()),
            enrollment_count: 3,
            assessment_count: 2,
            created_at: now,
            updated_at: now,
        }
    }

    // -----------------------------------------------------------------------
    // course_to_response
    // -----------------------------------------------------------------------

    #[test]
    fn test_blob_urls_win_over_row_columns() {
        let urls = CourseUrls {
            content_url: Some("https://store.example.com/content.pdf".to_string()),
            media_url: Some("https://store.example.com/media.mp4".to_string()),
        };
        let resp = course_to_response(make_row(), urls, false);
        assert_eq!(
            resp.course_content.as_deref(),
            Some("https://store.example.com/content.pdf")
        );
        assert_eq!(
            resp.media_url.as_deref(),
            Some("https://store.example.com/media.mp4")
        );
    }

    #[test]
    fn test_row_columns_fill_in_when_blobs_absent() {
        let resp = course_to_response(make_row(), CourseUrls::default(), false);
        assert_eq!(
            resp.course_content.as_deref(),
            Some("https://db.example.com/row-content.pdf")
        );
        assert_eq!(
            resp.media_url.as_deref(),
            Some("https://db.example.com/row-media.mp4")
        );
    }

    #[test]
    fn test_counts_and_enrollment_flag_carry_through() {
        let resp = course_to_response(make_row(), CourseUrls::default(), true);
        assert_eq!(resp.enrollment_count, 3);
        assert_eq!(resp.assessment_count, 2);
        assert!(resp.is_enrolled);
    }

    // -----------------------------------------------------------------------
    // wire format
    // -----------------------------------------------------------------------

    #[test]
    fn test_response_uses_camel_case_keys() {
        let resp = course_to_response(make_row(), CourseUrls::default(), false);
        let json = serde_json::to_value(resp).unwrap();
        assert!(json.get("courseId").is_some());
        assert!(json.get("instructorName").is_some());
        assert!(json.get("enrollmentCount").is_some());
        assert!(json.get("isEnrolled").is_some());
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("course_id").is_none());
    }

    #[test]
    fn test_create_request_description_defaults_to_empty() {
        let req: CreateCourseRequest = serde_json::from_value(serde_json::json!({
            "title": "Networking 101"
        }))
        .unwrap();
        assert_eq!(req.description, "");
        assert!(req.media_url.is_none());
        assert!(req.course_content.is_none());
    }
}
