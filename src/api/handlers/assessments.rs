//! Assessment handlers.
//!
//! Assessments belong to a course; only the course instructor may create,
//! modify, or delete them. Reads are open to any authenticated user so
//! students can take what their instructors publish.

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
use crate::models::assessment::{Assessment, AssessmentWithCourse};
use crate::models::user::UserRole;

const ASSESSMENT_SELECT: &str = "SELECT a.id, a.course_id, c.title AS course_title,
            a.title, a.questions, a.max_score, a.created_at, a.updated_at
     FROM assessments a
     JOIN courses c ON c.id = a.course_id";

/// Create assessment routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_assessments).post(create_assessment))
        .route(
            "/:id",
            get(get_assessment)
                .put(update_assessment)
                .delete(delete_assessment),
        )
        .route("/byCourse/:course_id", get(assessments_by_course))
        .route("/my", get(my_assessments))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentRequest {
    pub course_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub questions: String,
    #[serde(default)]
    pub max_score: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssessmentRequest {
    pub title: String,
    #[serde(default)]
    pub questions: String,
    #[serde(default)]
    pub max_score: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub assessment_id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub title: String,
    pub questions: String,
    pub max_score: i32,
}

pub(crate) fn assessment_to_response(row: AssessmentWithCourse) -> AssessmentResponse {
    AssessmentResponse {
        assessment_id: row.id,
        course_id: row.course_id,
        course_title: row.course_title,
        title: row.title,
        questions: row.questions,
        max_score: row.max_score,
    }
}

/// List all assessments
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/Assessments",
    tag = "assessments",
    responses(
        (status = 200, description = "List of assessments", body = [AssessmentResponse]),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_assessments(
    State(state): State<SharedState>,
) -> Result<Json<Vec<AssessmentResponse>>> {
    let rows = sqlx::query_as::<_, AssessmentWithCourse>(&format!(
        "{} ORDER BY a.created_at DESC",
        ASSESSMENT_SELECT
    ))
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(rows.into_iter().map(assessment_to_response).collect()))
}

/// Get assessment details
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/Assessments",
    tag = "assessments",
    params(
        ("id" = Uuid, Path, description = "Assessment ID"),
    ),
    responses(
        (status = 200, description = "Assessment details", body = AssessmentResponse),
        (status = 404, description = "Assessment not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_assessment(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssessmentResponse>> {
    let row = fetch_assessment_with_course(&state, id).await?;
    Ok(Json(assessment_to_response(row)))
}

/// Create assessment (course instructor only)
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/Assessments",
    tag = "assessments",
    request_body = CreateAssessmentRequest,
    responses(
        (status = 201, description = "Assessment created", body = AssessmentResponse),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_assessment(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<(StatusCode, Json<AssessmentResponse>)> {
    if auth.role != UserRole::Instructor {
        return Err(AppError::Authorization(
            "Only instructors can create assessments".to_string(),
        ));
    }

    let course = fetch_course(&state, payload.course_id).await?;
    if course.instructor_id != auth.user_id {
        return Err(AppError::Authorization(
            "Only the course instructor can create assessments for this course".to_string(),
        ));
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let assessment = sqlx::query_as::<_, Assessment>(
        "INSERT INTO assessments (course_id, title, questions, max_score)
         VALUES ($1, $2, $3, $4)
         RETURNING id, course_id, title, questions, max_score, created_at, updated_at",
    )
    .bind(payload.course_id)
    .bind(payload.title.trim())
    .bind(&payload.questions)
    .bind(payload.max_score)
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(assessment_id = %assessment.id, course_id = %course.id, "Assessment created");

    let row = fetch_assessment_with_course(&state, assessment.id).await?;
    Ok((StatusCode::CREATED, Json(assessment_to_response(row))))
}

/// Update assessment (course instructor only)
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/Assessments",
    tag = "assessments",
    params(
        ("id" = Uuid, Path, description = "Assessment ID"),
    ),
    request_body = UpdateAssessmentRequest,
    responses(
        (status = 200, description = "Assessment updated", body = AssessmentResponse),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Assessment not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_assessment(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssessmentRequest>,
) -> Result<Json<AssessmentResponse>> {
    let row = fetch_assessment_with_course(&state, id).await?;
    let course = fetch_course(&state, row.course_id).await?;
    if course.instructor_id != auth.user_id {
        return Err(AppError::Authorization(
            "Only the course instructor can modify this assessment".to_string(),
        ));
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    sqlx::query(
        "UPDATE assessments
         SET title = $2, questions = $3, max_score = $4, updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .bind(payload.title.trim())
    .bind(&payload.questions)
    .bind(payload.max_score)
    .execute(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let row = fetch_assessment_with_course(&state, id).await?;
    Ok(Json(assessment_to_response(row)))
}

/// Delete assessment (course instructor only)
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/Assessments",
    tag = "assessments",
    params(
        ("id" = Uuid, Path, description = "Assessment ID"),
    ),
    responses(
        (status = 204, description = "Assessment deleted"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Assessment not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_assessment(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let row = fetch_assessment_with_course(&state, id).await?;
    let course = fetch_course(&state, row.course_id).await?;
    if course.instructor_id != auth.user_id {
        return Err(AppError::Authorization(
            "Only the course instructor can delete this assessment".to_string(),
        ));
    }

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    sqlx::query("DELETE FROM results WHERE assessment_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    sqlx::query("DELETE FROM assessments WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(assessment_id = %id, "Assessment deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List assessments for one course
#[utoipa::path(
    get,
    path = "/byCourse/{course_id}",
    context_path = "/api/Assessments",
    tag = "assessments",
    params(
        ("course_id" = Uuid, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Assessments for the course", body = [AssessmentResponse]),
        (status = 404, description = "Course not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn assessments_by_course(
    State(state): State<SharedState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<AssessmentResponse>>> {
    fetch_course(&state, course_id).await?;

    let rows = sqlx::query_as::<_, AssessmentWithCourse>(&format!(
        "{} WHERE a.course_id = $1 ORDER BY a.created_at DESC",
        ASSESSMENT_SELECT
    ))
    .bind(course_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(rows.into_iter().map(assessment_to_response).collect()))
}

/// List assessments across the calling instructor's courses
#[utoipa::path(
    get,
    path = "/my",
    context_path = "/api/Assessments",
    tag = "assessments",
    responses(
        (status = 200, description = "Assessments owned by the caller", body = [AssessmentResponse]),
        (status = 403, description = "Instructor role required"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_assessments(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<Vec<AssessmentResponse>>> {
    if auth.role != UserRole::Instructor {
        return Err(AppError::Authorization(
            "Only instructors can view their assessments".to_string(),
        ));
    }

    let rows = sqlx::query_as::<_, AssessmentWithCourse>(&format!(
        "{} WHERE c.instructor_id = $1 ORDER BY a.created_at DESC",
        ASSESSMENT_SELECT
    ))
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(rows.into_iter().map(assessment_to_response).collect()))
}

pub(crate) async fn fetch_assessment_with_course(
    state: &SharedState,
    id: Uuid,
) -> Result<AssessmentWithCourse> {
    sqlx::query_as::<_, AssessmentWithCourse>(&format!("{} WHERE a.id = $1", ASSESSMENT_SELECT))
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_assessments,
        get_assessment,
        create_assessment,
        update_assessment,
        delete_assessment,
        assessments_by_course,
        my_assessments
    ),
    components(schemas(
        CreateAssessmentRequest,
        UpdateAssessmentRequest,
        AssessmentResponse
    ))
)]
pub struct AssessmentsApiDoc;
