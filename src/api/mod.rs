//! API module - HTTP handlers and middleware.

pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use crate::config::Config;
use crate::services::course_files_service::CourseFilesService;
use sqlx::PgPool;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
    pub files: Arc<CourseFilesService>,
}

impl AppState {
    pub fn new(config: Config, db: PgPool, files: Arc<CourseFilesService>) -> Self {
        Self { config, db, files }
    }
}

pub type SharedState = Arc<AppState>;
