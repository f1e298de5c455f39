//! LearnTrack - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rand::Rng;

use learntrack_backend::{
    api,
    config::Config,
    db,
    error::Result,
    models::user::UserRole,
    services::{auth_service::AuthService, course_files_service::CourseFilesService},
    storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learntrack_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Starting LearnTrack");

    // Connect to database
    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations complete");

    // Provision admin user on first boot
    provision_admin_user(&db_pool).await?;

    // Initialize storage backend for course URL files
    let backend = storage::create_backend(&config).await?;
    let files = Arc::new(CourseFilesService::new(backend));
    tracing::info!(backend = %config.storage_backend, "Storage backend initialized");

    // Create application state
    let state = Arc::new(api::AppState::new(config.clone(), db_pool, files));

    // The frontend runs on its own origin and sends the bearer token with
    // every request, so that one origin must be whitelisted explicitly.
    let cors_origin: HeaderValue = config.cors_origin.parse().expect("invalid CORS origin");

    // Build router
    let app = Router::new()
        .merge(api::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::exact(cors_origin))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
                .allow_credentials(true),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Provision the initial admin user on first boot.
///
/// Controlled by the `ADMIN_EMAIL` and `ADMIN_PASSWORD` env vars; without
/// an explicit password a random one is generated and logged once.
async fn provision_admin_user(db: &sqlx::PgPool) -> Result<()> {
    let admin_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
            .fetch_one(db)
            .await
            .map_err(|e| learntrack_backend::error::AppError::Database(e.to_string()))?;

    if admin_exists {
        return Ok(());
    }

    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@localhost".to_string());
    let (password, generated) = match std::env::var("ADMIN_PASSWORD") {
        Ok(p) if !p.is_empty() => (p, false),
        _ => {
            const CHARSET: &[u8] =
                b"abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789!@#$%&*";
            let mut rng = rand::rng();
            let p: String = (0..20)
                .map(|_| {
                    let idx = rng.random_range(0..CHARSET.len());
                    CHARSET[idx] as char
                })
                .collect();
            (p, true)
        }
    };

    let password_hash = AuthService::hash_password(&password)?;

    sqlx::query(
        "INSERT INTO users (name, email, role, password_hash)
         VALUES ('Administrator', $1, $2, $3)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(&email)
    .bind(UserRole::Admin)
    .bind(&password_hash)
    .execute(db)
    .await
    .map_err(|e| learntrack_backend::error::AppError::Database(e.to_string()))?;

    if generated {
        tracing::info!(
            "Initial admin user created: {} / {} (change this password after first login)",
            email,
            password
        );
    } else {
        tracing::info!("Initial admin user created with password from ADMIN_PASSWORD env var");
    }

    Ok(())
}
