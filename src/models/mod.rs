//! Database models (SQLx).

pub mod assessment;
pub mod course;
pub mod enrollment;
pub mod quiz_result;
pub mod user;
