//! Quiz result handlers.
//!
//! A result records one submission of an assessment. Students own their
//! submissions and are the only ones who may change or delete them; the
//! per-assessment listing additionally lets the course instructor and
//! admins see everyone's scores.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::handlers::assessments::fetch_assessment_with_course;
use crate::api::handlers::courses::fetch_course;
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::quiz_result::{QuizResult, QuizResultWithContext};
use crate::models::user::UserRole;

const RESULT_SELECT: &str = "SELECT r.id, r.assessment_id, a.title AS assessment_title,
            a.max_score, r.user_id, u.name AS user_name, r.answers, r.score,
            r.attempt_date, r.submitted_at
     FROM results r
     JOIN assessments a ON a.id = r.assessment_id
     JOIN users u ON u.id = r.user_id";

/// Create result routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_results).post(create_result))
        .route("/my", get(my_results))
        .route("/byAssessment/:assessment_id", get(results_by_assessment))
        .route(
            "/:id",
            get(get_result).put(update_result).delete(delete_result),
        )
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateResultRequest {
    pub assessment_id: Uuid,
    #[serde(default)]
    pub answers: String,
    pub score: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResultRequest {
    pub result_id: Uuid,
    #[serde(default)]
    pub answers: String,
    pub score: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub result_id: Uuid,
    pub assessment_id: Uuid,
    pub assessment_title: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub answers: String,
    pub score: i32,
    pub max_score: i32,
    pub attempt_date: chrono::DateTime<chrono::Utc>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) fn result_to_response(row: QuizResultWithContext) -> ResultResponse {
    ResultResponse {
        result_id: row.id,
        assessment_id: row.assessment_id,
        assessment_title: row.assessment_title,
        user_id: row.user_id,
        user_name: row.user_name,
        answers: row.answers,
        score: row.score,
        max_score: row.max_score,
        attempt_date: row.attempt_date,
        submitted_at: row.submitted_at,
    }
}

/// List all results
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/Results",
    tag = "results",
    responses(
        (status = 200, description = "List of results", body = [ResultResponse]),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_results(State(state): State<SharedState>) -> Result<Json<Vec<ResultResponse>>> {
    let rows = sqlx::query_as::<_, QuizResultWithContext>(&format!(
        "{} ORDER BY r.submitted_at DESC",
        RESULT_SELECT
    ))
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(rows.into_iter().map(result_to_response).collect()))
}

/// Get result details
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/Results",
    tag = "results",
    params(
        ("id" = Uuid, Path, description = "Result ID"),
    ),
    responses(
        (status = 200, description = "Result details", body = ResultResponse),
        (status = 404, description = "Result not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_result(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultResponse>> {
    let row = fetch_result_with_context(&state, id).await?;
    Ok(Json(result_to_response(row)))
}

/// Submit a result for an assessment
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/Results",
    tag = "results",
    request_body = CreateResultRequest,
    responses(
        (status = 201, description = "Result recorded", body = ResultResponse),
        (status = 404, description = "Assessment not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_result(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<CreateResultRequest>,
) -> Result<(StatusCode, Json<ResultResponse>)> {
    fetch_assessment_with_course(&state, payload.assessment_id).await?;

    // The submitter is always the caller, whatever the payload says.
    let result = sqlx::query_as::<_, QuizResult>(
        "INSERT INTO results (assessment_id, user_id, answers, score)
         VALUES ($1, $2, $3, $4)
         RETURNING id, assessment_id, user_id, answers, score, attempt_date, submitted_at",
    )
    .bind(payload.assessment_id)
    .bind(auth.user_id)
    .bind(&payload.answers)
    .bind(payload.score)
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(
        result_id = %result.id,
        assessment_id = %result.assessment_id,
        user_id = %result.user_id,
        "Result recorded"
    );

    let row = fetch_result_with_context(&state, result.id).await?;
    Ok((StatusCode::CREATED, Json(result_to_response(row))))
}

/// Update a result (owning student only)
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/Results",
    tag = "results",
    params(
        ("id" = Uuid, Path, description = "Result ID"),
    ),
    request_body = UpdateResultRequest,
    responses(
        (status = 200, description = "Result updated", body = ResultResponse),
        (status = 400, description = "Result ID mismatch"),
        (status = 403, description = "Not the submitting student"),
        (status = 404, description = "Result not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_result(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResultRequest>,
) -> Result<Json<ResultResponse>> {
    if payload.result_id != id {
        return Err(AppError::Validation("Result ID mismatch".to_string()));
    }

    let existing = fetch_result_with_context(&state, id).await?;
    if existing.user_id != auth.user_id {
        return Err(AppError::Authorization(
            "You can only modify your own results".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE results SET answers = $2, score = $3, submitted_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(&payload.answers)
    .bind(payload.score)
    .execute(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let row = fetch_result_with_context(&state, id).await?;
    Ok(Json(result_to_response(row)))
}

/// Delete a result (owning student only)
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/Results",
    tag = "results",
    params(
        ("id" = Uuid, Path, description = "Result ID"),
    ),
    responses(
        (status = 204, description = "Result deleted"),
        (status = 403, description = "Not the submitting student"),
        (status = 404, description = "Result not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_result(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let existing = fetch_result_with_context(&state, id).await?;
    if existing.user_id != auth.user_id {
        return Err(AppError::Authorization(
            "You can only delete your own results".to_string(),
        ));
    }

    sqlx::query("DELETE FROM results WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    tracing::info!(result_id = %id, "Result deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// List the calling user's results
#[utoipa::path(
    get,
    path = "/my",
    context_path = "/api/Results",
    tag = "results",
    responses(
        (status = 200, description = "Results of the caller", body = [ResultResponse]),
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_results(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<Vec<ResultResponse>>> {
    let rows = sqlx::query_as::<_, QuizResultWithContext>(&format!(
        "{} WHERE r.user_id = $1 ORDER BY r.submitted_at DESC",
        RESULT_SELECT
    ))
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(rows.into_iter().map(result_to_response).collect()))
}

/// List results for one assessment
///
/// Admins and the course instructor see every submission; students see
/// only their own. Instructors of other courses are turned away.
#[utoipa::path(
    get,
    path = "/byAssessment/{assessment_id}",
    context_path = "/api/Results",
    tag = "results",
    params(
        ("assessment_id" = Uuid, Path, description = "Assessment ID"),
    ),
    responses(
        (status = 200, description = "Results for the assessment", body = [ResultResponse]),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Assessment not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn results_by_assessment(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(assessment_id): Path<Uuid>,
) -> Result<Json<Vec<ResultResponse>>> {
    let assessment = fetch_assessment_with_course(&state, assessment_id).await?;
    let course = fetch_course(&state, assessment.course_id).await?;

    let sees_all = match auth.role {
        UserRole::Admin => true,
        UserRole::Instructor => {
            if course.instructor_id != auth.user_id {
                return Err(AppError::Authorization(
                    "Only the course instructor can view these results".to_string(),
                ));
            }
            true
        }
        UserRole::Student => false,
    };

    let query = if sees_all {
        format!(
            "{} WHERE r.assessment_id = $1 ORDER BY r.submitted_at DESC",
            RESULT_SELECT
        )
    } else {
        format!(
            "{} WHERE r.assessment_id = $1 AND r.user_id = $2 ORDER BY r.submitted_at DESC",
            RESULT_SELECT
        )
    };

    let mut q = sqlx::query_as::<_, QuizResultWithContext>(&query).bind(assessment_id);
    if !sees_all {
        q = q.bind(auth.user_id);
    }
    let rows = q
        .fetch_all(&state.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(rows.into_iter().map(result_to_response).collect()))
}

async fn fetch_result_with_context(
    state: &SharedState,
    id: Uuid,
) -> Result<QuizResultWithContext> {
    sqlx::query_as::<_, QuizResultWithContext>(&format!("{} WHERE r.id = $1", RESULT_SELECT))
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Result not found".to_string()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_results,
        get_result,
        create_result,
        update_result,
        delete_result,
        my_results,
        results_by_assessment
    ),
    components(schemas(CreateResultRequest, UpdateResultRequest, ResultResponse))
)]
pub struct ResultsApiDoc;
