//! Test fixtures and data factories for backend tests
//!
//! Provides reusable test data for users, courses, assessments and
//! registration payloads.

#![allow(dead_code)]

use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

/// Test user credentials
pub struct TestUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl TestUser {
    pub fn student() -> Self {
        Self {
            name: "Test Student".to_string(),
            email: format!("student-{}@test.local", Uuid::new_v4()),
            password: "password123".to_string(),
            role: "Student".to_string(),
        }
    }

    pub fn instructor() -> Self {
        Self {
            name: "Test Instructor".to_string(),
            email: format!("instructor-{}@test.local", Uuid::new_v4()),
            password: "password123".to_string(),
            role: "Instructor".to_string(),
        }
    }

    pub fn admin() -> Self {
        Self {
            name: "Test Admin".to_string(),
            email: format!("admin-{}@test.local", Uuid::new_v4()),
            password: "password123".to_string(),
            role: "Admin".to_string(),
        }
    }

    /// JSON body for POST /api/Auth/register
    pub fn register_payload(&self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "password": self.password,
            "confirmPassword": self.password,
            "role": self.role,
        })
    }

    /// JSON body for POST /api/Auth/login
    pub fn login_payload(&self) -> Value {
        json!({
            "email": self.email,
            "password": self.password,
        })
    }
}

/// Insert a user row directly, bypassing the registration endpoint.
/// Uses bcrypt cost 4 to keep the test run fast.
pub async fn create_user(pool: &PgPool, user: &TestUser) -> Uuid {
    let hash = bcrypt::hash(&user.password, 4).expect("bcrypt hash failed");
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (name, email, role, password_hash)
         VALUES ($1, $2, $3::user_role, $4)
         RETURNING id",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role.to_lowercase())
    .bind(&hash)
    .fetch_one(pool)
    .await
    .expect("failed to create test user")
}

/// Insert a course owned by the given instructor.
pub async fn create_course(pool: &PgPool, instructor_id: Uuid, title: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO courses (title, description, instructor_id)
         VALUES ($1, 'fixture course', $2)
         RETURNING id",
    )
    .bind(title)
    .bind(instructor_id)
    .fetch_one(pool)
    .await
    .expect("failed to create test course")
}

/// Insert an enrollment row directly.
pub async fn create_enrollment(pool: &PgPool, user_id: Uuid, course_id: Uuid) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO enrollments (user_id, course_id)
         VALUES ($1, $2)
         RETURNING id",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
    .expect("failed to create test enrollment")
}

/// Insert an assessment attached to the given course.
pub async fn create_assessment(pool: &PgPool, course_id: Uuid, title: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO assessments (course_id, title, questions, max_score)
         VALUES ($1, $2, '[]', 100)
         RETURNING id",
    )
    .bind(course_id)
    .bind(title)
    .fetch_one(pool)
    .await
    .expect("failed to create test assessment")
}

/// Remove a user and everything hanging off it. Courses cascade to
/// assessments, enrollments and results.
pub async fn cleanup_user(pool: &PgPool, user_id: Uuid) {
    sqlx::query("DELETE FROM courses WHERE instructor_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .ok();
}
