//! HTTP Middleware
//!
//! Request guards: CSRF double-submit, session requirement, and
//! login-endpoint throttling.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use platform::client::{extract_client_ip, throttle_key};
use platform::cookie::extract_cookie;
use platform::rate_limit::{RateLimitDecision, RateLimitStore};

use crate::application::config::AuthConfig;
use crate::application::csrf::validate_double_submit;
use crate::application::session::SessionManager;
use crate::domain::repository::UserRepository;
use crate::error::AuthError;
use kernel::id::UserId;

/// Authenticated user, inserted into request extensions by
/// [`require_session`]
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: UserId,
}

/// State for the session middleware
#[derive(Clone)]
pub struct AuthMiddlewareState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

/// Middleware that requires a valid session cookie
///
/// Any defect in the cookie yields 401 and explicitly clears it, so a
/// client holding a poisoned cookie does not keep re-sending it.
/// Successful validation records the user's activity in the background;
/// the response never waits on that write.
pub async fn require_session<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let sessions = SessionManager::new(&state.config);

    let user_id = extract_cookie(req.headers(), &state.config.session_cookie_name)
        .and_then(|token| sessions.validate(&token));

    let Some(user_id) = user_id else {
        let mut response = AuthError::Unauthorized.into_response();
        if let Ok(cookie) = axum::http::HeaderValue::from_str(
            &state.config.session_cookie().build_delete_cookie(),
        ) {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        return response;
    };

    // Fire-and-forget; a failed write must not fail the request
    let repo = state.repo.clone();
    tokio::spawn(async move {
        if let Err(e) = repo.touch_last_activity(&user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to record user activity");
        }
    });

    req.extensions_mut().insert(CurrentUser { user_id });

    next.run(req).await
}

/// Middleware enforcing the CSRF double-submit check
///
/// Read-only methods pass untouched; mutating methods must present
/// matching signed tokens in header and cookie.
pub async fn csrf_guard(
    State(config): State<Arc<AuthConfig>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let guarded = matches!(
        *req.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    );

    if !guarded {
        return next.run(req).await;
    }

    let header_token = req
        .headers()
        .get(&config.csrf_header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let cookie_token = extract_cookie(req.headers(), &config.csrf_cookie_name);

    if let Err(rejection) = validate_double_submit(
        &config.signer(),
        header_token.as_deref(),
        cookie_token.as_deref(),
    ) {
        return AuthError::Csrf(rejection).into_response();
    }

    next.run(req).await
}

/// State for the rate limit middleware
#[derive(Clone)]
pub struct RateLimitState<S>
where
    S: RateLimitStore + Clone + Send + Sync + 'static,
{
    pub store: Arc<S>,
    pub config: Arc<AuthConfig>,
}

/// Middleware throttling login-class endpoints
///
/// Keyed by client IP and request path. A store failure counts as
/// limited: an attacker must not gain unthrottled attempts by taking
/// the counter store down.
pub async fn rate_limit<S>(
    State(state): State<RateLimitState<S>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    S: RateLimitStore + Clone + Send + Sync + 'static,
{
    if !state.config.rate_limit_enabled {
        return next.run(req).await;
    }

    let direct_ip = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip());
    let client_ip = extract_client_ip(req.headers(), direct_ip);
    let key = throttle_key(client_ip, req.uri().path());

    match state.store.consume(&key, &state.config.rate_limit).await {
        Ok(RateLimitDecision::Allowed { .. }) => next.run(req).await,
        Ok(RateLimitDecision::Limited) => {
            tracing::warn!(key = %key, "Rate limit exceeded");
            AuthError::RateLimited.into_response()
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Rate limit store unavailable, failing closed");
            AuthError::RateLimited.into_response()
        }
    }
}
