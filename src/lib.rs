//! LearnTrack - Backend Library
//!
//! Learning management backend: courses, assessments, enrollments and
//! quiz results behind a JWT-authenticated REST API.

#[macro_use]
mod macros;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
