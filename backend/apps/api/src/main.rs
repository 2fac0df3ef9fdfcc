//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::domain::repository::UserRepository;
use auth::{AuthConfig, PgAuthRepository, PgRateLimitStore, security_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use platform::cookie::SameSite;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let auth_config = build_auth_config()?;

    spawn_maintenance(pool.clone(), &auth_config);

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-xsrf-token"),
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .merge(security_router(pool.clone(), auth_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(31113);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Spawn the periodic store maintenance task
///
/// Runs immediately and then hourly: drops rate limit counters from
/// closed windows (they accumulate one row per client and window
/// otherwise) and purges users inactive past `INACTIVE_USER_TTL_HOURS`
/// (default 24), whose verification tokens cascade away with them.
/// Failures are logged and retried on the next tick; they never affect
/// request handling.
fn spawn_maintenance(pool: sqlx::PgPool, config: &AuthConfig) {
    let rate_limit = config.rate_limit;
    let inactive_ttl_hours: i64 = env::var("INACTIVE_USER_TTL_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(24);

    tokio::spawn(async move {
        let limiter = PgRateLimitStore::new(pool.clone());
        let users = PgAuthRepository::new(pool);
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));

        loop {
            interval.tick().await;

            if let Err(e) = limiter.cleanup_expired(&rate_limit).await {
                tracing::warn!(error = %e, "Rate limit cleanup failed");
            }

            let cutoff = chrono::Utc::now() - chrono::Duration::hours(inactive_ttl_hours);
            match users.delete_inactive_before(cutoff).await {
                Ok(deleted) if deleted > 0 => {
                    tracing::info!(users_deleted = deleted, "Purged inactive users");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Inactive user purge failed");
                }
            }
        }
    });
}

/// Assemble the auth configuration from the environment
///
/// `SECRET_KEY` is required in every environment; the process refuses
/// to start without it rather than falling back to a weak default.
fn build_auth_config() -> anyhow::Result<AuthConfig> {
    let secret_b64 = env::var("SECRET_KEY")
        .map_err(|_| anyhow::anyhow!("SECRET_KEY must be set in environment"))?;
    let secret_key = Engine::decode(&general_purpose::STANDARD, &secret_b64)
        .map_err(|e| anyhow::anyhow!("SECRET_KEY is not valid base64: {e}"))?;

    let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    let is_production = environment == "production";
    let is_test = environment == "test";

    let password_pepper = match env::var("PASSWORD_PEPPER") {
        Ok(b64) => Some(
            Engine::decode(&general_purpose::STANDARD, &b64)
                .map_err(|e| anyhow::anyhow!("PASSWORD_PEPPER is not valid base64: {e}"))?,
        ),
        Err(_) => None,
    };

    Ok(AuthConfig {
        secret_key,
        cookie_secure: is_production,
        cookie_same_site: SameSite::Strict,
        cookie_domain: env::var("APP_DOMAIN").ok(),
        app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        password_pepper,
        rate_limit_enabled: !is_test,
        ..AuthConfig::default()
    })
}
