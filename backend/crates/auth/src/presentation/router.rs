//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use sqlx::PgPool;
use std::sync::Arc;

use platform::rate_limit::RateLimitStore;

use crate::application::config::AuthConfig;
use crate::domain::repository::{Mailer, UserRepository, VerificationTokenRepository};
use crate::infra::mailer::LogMailer;
use crate::infra::postgres::{PgAuthRepository, PgRateLimitStore};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{
    AuthMiddlewareState, RateLimitState, csrf_guard, rate_limit, require_session,
};

/// Create the security router backed by PostgreSQL and log-only mail
pub fn security_router(pool: PgPool, config: AuthConfig) -> Router {
    security_router_generic(
        PgAuthRepository::new(pool.clone()),
        LogMailer,
        PgRateLimitStore::new(pool),
        config,
    )
}

/// Create the security router for any implementation of the ports
///
/// Layering, outermost first: CSRF guard over every route, throttling on
/// the credential-accepting routes, session requirement on the routes
/// that name "the current user".
pub fn security_router_generic<R, M, S>(
    repo: R,
    mailer: M,
    rate_store: S,
    config: AuthConfig,
) -> Router
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
    S: RateLimitStore + Clone + Send + Sync + 'static,
{
    let repo = Arc::new(repo);
    let config = Arc::new(config);

    let state = AuthAppState {
        repo: repo.clone(),
        mailer: Arc::new(mailer),
        config: config.clone(),
    };
    let session_state = AuthMiddlewareState {
        repo,
        config: config.clone(),
    };
    let limit_state = RateLimitState {
        store: Arc::new(rate_store),
        config: config.clone(),
    };

    let open = Router::new()
        .route("/csrf-token", get(handlers::csrf_token::<R, M>))
        .route("/user", get(handlers::current_user::<R, M>));

    let throttled = Router::new()
        .route("/auth/login", post(handlers::login::<R, M>))
        .route("/user", post(handlers::register::<R, M>))
        .route_layer(middleware::from_fn_with_state(
            limit_state,
            rate_limit::<S>,
        ));

    let protected = Router::new()
        .route("/auth/logout", get(handlers::logout::<R, M>))
        .route("/user/verify/resend", post(handlers::verify_resend::<R, M>))
        .route("/user/verify/{token}", get(handlers::verify_consume::<R, M>))
        .route_layer(middleware::from_fn_with_state(
            session_state,
            require_session::<R>,
        ));

    open.merge(throttled)
        .merge(protected)
        .with_state(state)
        .layer(middleware::from_fn_with_state(config, csrf_guard))
}
