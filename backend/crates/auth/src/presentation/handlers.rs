//! HTTP Handlers

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::csrf::issue_csrf_token;
use crate::application::session::SessionManager;
use crate::application::{
    AccountVerificationFlow, LoginInput, LoginUseCase, RegisterInput, RegisterUseCase,
};
use crate::domain::repository::{Mailer, UserRepository, VerificationTokenRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{LoginRequest, RegisterRequest, UserResponse};
use crate::presentation::middleware::CurrentUser;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, M>
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
}

impl<R, M> AuthAppState<R, M>
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    fn verification_flow(&self) -> AccountVerificationFlow<R, R, M> {
        AccountVerificationFlow::new(
            self.repo.clone(),
            self.repo.clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }
}

// ============================================================================
// CSRF Token
// ============================================================================

/// GET /csrf-token
///
/// Rotates the CSRF cookie. 204: the token travels only in the cookie,
/// never in a body.
pub async fn csrf_token<R, M>(State(state): State<AuthAppState<R, M>>) -> impl IntoResponse
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let token = issue_csrf_token(&state.config.signer());
    let cookie = state.config.csrf_cookie().build_set_cookie(&token);

    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

// ============================================================================
// Login / Logout
// ============================================================================

/// POST /auth/login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    let cookie = state
        .config
        .session_cookie()
        .build_set_cookie(&output.session_token);

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(true)))
}

/// GET /auth/logout
///
/// Session required. Clearing the cookie is all there is to do: with no
/// server-side session row, the cleared cookie is the logout.
pub async fn logout<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(_user): Extension<CurrentUser>,
) -> impl IntoResponse
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let cookie = state.config.session_cookie().build_delete_cookie();

    (StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(true))
}

// ============================================================================
// Registration
// ============================================================================

/// POST /user
pub async fn register<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        Arc::new(state.verification_flow()),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            email: req.email,
            password: req.password,
            password_confirmation: req.password_confirmation,
        })
        .await?;

    let cookie = state
        .config
        .session_cookie()
        .build_set_cookie(&output.session_token);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(UserResponse::from(&output.user)),
    ))
}

// ============================================================================
// Current User
// ============================================================================

/// GET /user
///
/// Anonymous-friendly: an invalid or missing session yields `null`, not
/// 401, so the frontend can probe sign-in state without error handling.
pub async fn current_user<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: axum::http::HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let sessions = SessionManager::new(&state.config);

    let user_id = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name)
        .and_then(|token| sessions.validate(&token));

    let user = match user_id {
        Some(user_id) => state.repo.find_by_id(&user_id).await?,
        None => None,
    };

    Ok((
        [(header::CACHE_CONTROL, "max-age=0")],
        Json(user.as_ref().map(UserResponse::from)),
    ))
}

// ============================================================================
// Account Verification
// ============================================================================

/// POST /user/verify/resend
///
/// Session required. Re-issues the token (invalidating the previously
/// mailed link) and re-sends the mail.
pub async fn verify_resend<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentUser>,
) -> AuthResult<Json<bool>>
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let user = state
        .repo
        .find_by_id(&current.user_id)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    state
        .verification_flow()
        .request(&user.user_id, &user.email)
        .await?;

    Ok(Json(true))
}

/// GET /user/verify/{token}
///
/// Session required; the token must belong to the session's user.
pub async fn verify_consume<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(current): Extension<CurrentUser>,
    Path(token): Path<String>,
) -> AuthResult<Json<bool>>
where
    R: UserRepository + VerificationTokenRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    state
        .verification_flow()
        .consume(&current.user_id, &token)
        .await?;

    Ok(Json(true))
}
