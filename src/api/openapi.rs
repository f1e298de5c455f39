//! OpenAPI specification generated from handler annotations via utoipa.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Top-level OpenAPI document for the LearnTrack API.
///
/// Each handler module contributes its own paths and schemas via per-module
/// `#[derive(OpenApi)]` structs that are merged into this root document at
/// startup.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LearnTrack API",
        description = "Learning management backend: courses, assessments, enrollments and quiz results.",
        version = "0.9.0",
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "User management"),
        (name = "courses", description = "Course catalog and instructor course management"),
        (name = "assessments", description = "Assessments attached to courses"),
        (name = "enrollments", description = "Student enrollment in courses"),
        (name = "results", description = "Quiz result submission and review"),
        (name = "files", description = "Per-course URL file storage"),
        (name = "health", description = "Health and readiness checks"),
    ),
    components(schemas(ErrorResponse))
)]
pub struct ApiDoc;

/// Standard error response body returned by all endpoints on failure.
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "NOT_FOUND", "VALIDATION_ERROR")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Adds Bearer JWT security scheme to the OpenAPI spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the merged OpenAPI document from all handler modules.
pub fn build_openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    doc.merge(super::handlers::auth::AuthApiDoc::openapi());
    doc.merge(super::handlers::users::UsersApiDoc::openapi());
    doc.merge(super::handlers::courses::CoursesApiDoc::openapi());
    doc.merge(super::handlers::assessments::AssessmentsApiDoc::openapi());
    doc.merge(super::handlers::enrollments::EnrollmentsApiDoc::openapi());
    doc.merge(super::handlers::results::ResultsApiDoc::openapi());
    doc.merge(super::handlers::files::FilesApiDoc::openapi());
    doc.merge(super::handlers::health::HealthApiDoc::openapi());

    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_is_valid() {
        let spec = build_openapi();

        assert_eq!(spec.info.title, "LearnTrack API");

        // Catches missing module merges
        let path_count = spec.paths.paths.len();
        assert!(
            path_count >= 20,
            "Expected at least 20 paths, got {path_count}. A module merge may be missing."
        );

        let schema_count = spec.components.as_ref().map_or(0, |c| c.schemas.len());
        assert!(
            schema_count >= 20,
            "Expected at least 20 schemas, got {schema_count}."
        );

        let has_bearer = spec
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"));
        assert!(has_bearer, "Bearer auth security scheme is missing.");

        let tags: Vec<&str> = spec
            .tags
            .as_ref()
            .map_or(vec![], |t| t.iter().map(|tag| tag.name.as_str()).collect());
        for expected_tag in [
            "auth",
            "users",
            "courses",
            "assessments",
            "enrollments",
            "results",
            "files",
            "health",
        ] {
            assert!(
                tags.contains(&expected_tag),
                "Missing expected tag: {expected_tag}"
            );
        }

        let json = serde_json::to_string(&spec).expect("Spec should serialize to JSON");
        assert!(
            json.len() > 10_000,
            "Spec JSON seems too small: {} bytes",
            json.len()
        );
    }

    #[test]
    fn test_openapi_spec_operation_count() {
        let spec = build_openapi();
        let mut op_count = 0;

        for item in spec.paths.paths.values() {
            if item.get.is_some() {
                op_count += 1;
            }
            if item.put.is_some() {
                op_count += 1;
            }
            if item.post.is_some() {
                op_count += 1;
            }
            if item.delete.is_some() {
                op_count += 1;
            }
        }

        assert!(
            op_count >= 35,
            "Expected at least 35 operations, got {op_count}. Handler annotations may be missing."
        );
    }

    /// Verify every path documented in the OpenAPI spec has a corresponding
    /// route registered in the handler routers. This catches the class of bug
    /// where a handler is annotated with `#[utoipa::path(...)]` and listed in
    /// the module's `ApiDoc` struct but never `.route()`-ed in the router.
    #[test]
    fn test_all_openapi_paths_have_handlers() {
        let spec = build_openapi();

        let mut documented: Vec<(String, String)> = Vec::new();
        for (path, item) in &spec.paths.paths {
            if item.get.is_some() {
                documented.push(("GET".to_string(), path.clone()));
            }
            if item.post.is_some() {
                documented.push(("POST".to_string(), path.clone()));
            }
            if item.put.is_some() {
                documented.push(("PUT".to_string(), path.clone()));
            }
            if item.delete.is_some() {
                documented.push(("DELETE".to_string(), path.clone()));
            }
        }

        // Health endpoints use context_path="" and are registered directly
        // in create_router() in routes.rs.
        let top_level_prefixes = ["/health", "/ready", "/livez"];

        // Map from OpenAPI context_path prefix to the handler source file
        // that registers routes under that prefix.
        let handler_sources: Vec<(&str, &str)> = vec![
            ("/api/Auth/", include_str!("handlers/auth.rs")),
            ("/api/Users/", include_str!("handlers/users.rs")),
            ("/api/Courses/", include_str!("handlers/courses.rs")),
            ("/api/Assessments/", include_str!("handlers/assessments.rs")),
            ("/api/Enrollments/", include_str!("handlers/enrollments.rs")),
            ("/api/Results/", include_str!("handlers/results.rs")),
            ("/api/Files/", include_str!("handlers/files.rs")),
        ];

        let mut missing = Vec::new();

        for (method, path) in &documented {
            if top_level_prefixes.iter().any(|p| path.starts_with(p)) {
                continue;
            }

            let source = handler_sources
                .iter()
                .find(|(prefix, _)| path.starts_with(prefix));

            if let Some((prefix, source_file)) = source {
                // e.g. path="/api/Results/byAssessment/{assessment_id}",
                // prefix="/api/Results/" → first_segment="byAssessment"
                let route_suffix = &path[prefix.len() - 1..];
                let first_segment = route_suffix.split('/').nth(1).unwrap_or("");

                // Path parameters (e.g. {id}) bind to ":" routes; skip them.
                if first_segment.is_empty() || first_segment.starts_with('{') {
                    continue;
                }

                let route_pattern = format!("\"/{first_segment}");
                if !source_file.contains(&route_pattern) {
                    missing.push(format!(
                        "{method} {path}: route segment '/{first_segment}' not found in handler source"
                    ));
                }
            }
        }

        assert!(
            missing.is_empty(),
            "The following OpenAPI-documented endpoints appear to be missing route registrations:\n{}",
            missing.join("\n")
        );
    }
}
