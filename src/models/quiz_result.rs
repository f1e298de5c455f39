//! Quiz result model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Quiz result entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizResult {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub user_id: Uuid,
    pub answers: String,
    pub score: i32,
    pub attempt_date: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

/// Result row joined with assessment and submitter context
#[derive(Debug, Clone, FromRow)]
pub struct QuizResultWithContext {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub assessment_title: String,
    pub max_score: i32,
    pub user_id: Uuid,
    pub user_name: String,
    pub answers: String,
    pub score: i32,
    pub attempt_date: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}
