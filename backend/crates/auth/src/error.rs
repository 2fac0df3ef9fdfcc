//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Cryptographic and comparison failures never surface here — they
//! resolve to booleans inside the guards. What reaches this type is the
//! guard's judgement, already collapsed: a failed login never says
//! whether the email or the password was wrong.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

use crate::application::csrf::CsrfRejection;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or invalid credentials/session. One variant for every
    /// cause; the distinction lives only in server-side logs.
    #[error("Unauthorized")]
    Unauthorized,

    /// Double-submit CSRF check failed
    #[error("CSRF validation failed: {0}")]
    Csrf(#[from] CsrfRejection),

    /// Malformed or invalid account verification token
    #[error("Verification token is invalid")]
    InvalidVerificationToken,

    /// Rate limit budget exceeded (or the counter store is down:
    /// fail closed)
    #[error("Too many requests")]
    RateLimited,

    /// Domain-valid-but-rejected request input
    #[error("{reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// Out-of-band delivery failed after successful validation
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Csrf(_) | AuthError::InvalidVerificationToken => StatusCode::BAD_REQUEST,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::Delivery(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Unauthorized => ErrorKind::Unauthorized,
            AuthError::Csrf(_) | AuthError::InvalidVerificationToken => ErrorKind::BadRequest,
            AuthError::RateLimited => ErrorKind::TooManyRequests,
            AuthError::Validation { .. } => ErrorKind::UnprocessableEntity,
            AuthError::Delivery(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        match self {
            // Never leak which part of the credentials was wrong
            AuthError::Unauthorized => AppError::unauthorized("Unauthorized"),
            // CSRF rejections share one external face
            AuthError::Csrf(_) => AppError::bad_request("Bad Request"),
            AuthError::Validation { field, reason } => {
                AppError::unprocessable(reason.clone()).with_field(*field)
            }
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal Server Error")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Delivery(msg) => {
                tracing::error!(message = %msg, "Delivery failure");
            }
            AuthError::Unauthorized => {
                tracing::warn!("Unauthorized request");
            }
            AuthError::Csrf(rejection) => {
                tracing::warn!(rejection = %rejection, "CSRF validation failed");
            }
            AuthError::RateLimited => {
                tracing::warn!("Request rate limited");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Csrf(CsrfRejection::MissingToken).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidVerificationToken.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::validation("email", "A valid email address is required.").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AuthError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_never_leaks_cause() {
        let err = AuthError::Unauthorized.to_app_error();
        assert_eq!(err.message(), "Unauthorized");
    }

    #[test]
    fn test_csrf_rejections_share_external_face() {
        for rejection in [
            CsrfRejection::MissingToken,
            CsrfRejection::Malformed,
            CsrfRejection::InvalidSignature,
            CsrfRejection::ValueMismatch,
        ] {
            let err = AuthError::Csrf(rejection).to_app_error();
            assert_eq!(err.message(), "Bad Request");
            assert_eq!(err.status_code(), 400);
        }
    }

    #[test]
    fn test_validation_carries_field() {
        let err = AuthError::validation("passwordConfirmation", "Passwords must match.");
        let app = err.to_app_error();
        assert_eq!(app.field(), Some("passwordConfirmation"));
        assert_eq!(app.message(), "Passwords must match.");
    }
}
