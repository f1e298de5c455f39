//! Enrollment model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Enrollment entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    pub completed: bool,
}

/// Enrollment row joined with its course title, for student-facing listings
#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentWithCourse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed: bool,
}

/// Enrollment row joined with the enrolled student, for course rosters
#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentWithStudent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed: bool,
}
