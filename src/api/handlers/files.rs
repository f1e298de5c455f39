//! Course file handlers.
//!
//! Thin HTTP surface over the blob store holding per-course URL files.
//! Upload and delete are restricted to the owning instructor; reads only
//! require a valid token.

use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::handlers::courses::fetch_course;
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};

/// Create file routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/upload", post(upload_urls))
        .route("/test", get(storage_test))
        .route("/:course_id", get(get_urls).delete(delete_urls))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadCourseUrlsRequest {
    pub course_id: Uuid,
    pub content_url: Option<String>,
    pub media_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseUrlsResponse {
    pub course_id: Uuid,
    pub content_url: Option<String>,
    pub media_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUrlsResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageTestResponse {
    pub status: String,
    pub backend: String,
}

/// Store URL files for a course (course instructor only)
#[utoipa::path(
    post,
    path = "/upload",
    context_path = "/api/Files",
    tag = "files",
    request_body = UploadCourseUrlsRequest,
    responses(
        (status = 200, description = "URLs stored", body = CourseUrlsResponse),
        (status = 400, description = "No URL provided"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_urls(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<UploadCourseUrlsRequest>,
) -> Result<Json<CourseUrlsResponse>> {
    if payload.content_url.is_none() && payload.media_url.is_none() {
        return Err(AppError::Validation(
            "At least one URL must be provided".to_string(),
        ));
    }

    let course = fetch_course(&state, payload.course_id).await?;
    if course.instructor_id != auth.user_id {
        return Err(AppError::Authorization(
            "Only the course instructor can upload course files".to_string(),
        ));
    }

    state
        .files
        .store_urls(
            payload.course_id,
            payload.content_url.as_deref(),
            payload.media_url.as_deref(),
        )
        .await?;

    tracing::info!(course_id = %payload.course_id, "Course URL files stored");

    let urls = state.files.fetch_urls(payload.course_id).await?;
    Ok(Json(CourseUrlsResponse {
        course_id: payload.course_id,
        content_url: urls.content_url,
        media_url: urls.media_url,
    }))
}

/// Fetch the stored URL files for a course
#[utoipa::path(
    get,
    path = "/{course_id}",
    context_path = "/api/Files",
    tag = "files",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Stored URLs", body = CourseUrlsResponse),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_urls(
    State(state): State<SharedState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseUrlsResponse>> {
    fetch_course(&state, course_id).await?;

    let urls = state.files.fetch_urls(course_id).await?;
    Ok(Json(CourseUrlsResponse {
        course_id,
        content_url: urls.content_url,
        media_url: urls.media_url,
    }))
}

/// Delete the stored URL files for a course (course instructor only)
#[utoipa::path(
    delete,
    path = "/{course_id}",
    context_path = "/api/Files",
    tag = "files",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Deletion outcome", body = DeleteUrlsResponse),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_urls(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<DeleteUrlsResponse>> {
    let course = fetch_course(&state, course_id).await?;
    if course.instructor_id != auth.user_id {
        return Err(AppError::Authorization(
            "Only the course instructor can delete course files".to_string(),
        ));
    }

    let deleted = state.files.delete_urls(course_id).await?;
    tracing::info!(course_id = %course_id, deleted, "Course URL files deleted");
    Ok(Json(DeleteUrlsResponse { deleted }))
}

/// Round-trip a probe blob through the storage backend
#[utoipa::path(
    get,
    path = "/test",
    context_path = "/api/Files",
    tag = "files",
    responses(
        (status = 200, description = "Storage backend is reachable", body = StorageTestResponse),
        (status = 500, description = "Storage backend failed the probe"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn storage_test(State(state): State<SharedState>) -> Result<Json<StorageTestResponse>> {
    state.files.probe().await?;
    Ok(Json(StorageTestResponse {
        status: "ok".to_string(),
        backend: state.config.storage_backend.clone(),
    }))
}

#[derive(OpenApi)]
#[openapi(
    paths(upload_urls, get_urls, delete_urls, storage_test),
    components(schemas(
        UploadCourseUrlsRequest,
        CourseUrlsResponse,
        DeleteUrlsResponse,
        StorageTestResponse
    ))
)]
pub struct FilesApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_request_parses_camel_case() {
        let course_id = Uuid::new_v4();
        let req: UploadCourseUrlsRequest = serde_json::from_value(serde_json::json!({
            "courseId": course_id,
            "contentUrl": "https://cdn.example.com/syllabus.pdf"
        }))
        .unwrap();
        assert_eq!(req.course_id, course_id);
        assert!(req.content_url.is_some());
        assert!(req.media_url.is_none());
    }

    #[test]
    fn test_urls_response_wire_keys() {
        let json = serde_json::to_value(CourseUrlsResponse {
            course_id: Uuid::new_v4(),
            content_url: None,
            media_url: Some("https://cdn.example.com/intro.mp4".to_string()),
        })
        .unwrap();
        assert!(json.get("courseId").is_some());
        assert!(json.get("contentUrl").is_some());
        assert!(json.get("mediaUrl").is_some());
    }
}
