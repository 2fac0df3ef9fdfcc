//! Login Use Case
//!
//! Authenticates a user by email and password and issues a session
//! token. Every failure mode collapses to [`AuthError::Unauthorized`]:
//! the response never reveals whether the email exists, the password
//! was wrong, or the input was malformed.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::session::SessionManager;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Login output
#[derive(Debug)]
pub struct LoginOutput {
    /// Session token for cookie
    pub session_token: String,
}

/// Login use case
pub struct LoginUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
    sessions: SessionManager,
}

impl<U> LoginUseCase<U>
where
    U: UserRepository + 'static,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        let sessions = SessionManager::new(&config);
        Self {
            user_repo,
            config,
            sessions,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let email = Email::new(&input.email).map_err(|_| AuthError::Unauthorized)?;
        let password =
            ClearTextPassword::new(input.password).map_err(|_| AuthError::Unauthorized)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        // Argon2 verification is CPU-bound; keep it off the async runtime
        let hash = user.password_hash.clone();
        let pepper = self.config.password_pepper.clone();
        let password_valid = tokio::task::spawn_blocking(move || {
            hash.verify(&password, pepper.as_deref())
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Password verification task failed: {e}")))?;

        if !password_valid {
            return Err(AuthError::Unauthorized);
        }

        let session_token = self.sessions.issue(&user.user_id);

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(LoginOutput { session_token })
    }
}
