//! HTTP request handlers.

pub mod assessments;
pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod files;
pub mod health;
pub mod results;
pub mod users;
