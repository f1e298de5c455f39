//! Business logic services.

pub mod auth_service;
pub mod course_files_service;
