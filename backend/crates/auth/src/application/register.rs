//! Registration Use Case
//!
//! Creates an account, kicks off email verification, and signs the new
//! user in. Validation failures return 422 with a field name so the
//! frontend can highlight the offending input; checks run in a fixed
//! order and the first failure wins.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::session::SessionManager;
use crate::application::verify_account::AccountVerificationFlow;
use crate::domain::entity::user::User;
use crate::domain::repository::{Mailer, UserRepository, VerificationTokenRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Registration input
pub struct RegisterInput {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation (must match exactly)
    pub password_confirmation: String,
}

/// Registration output
#[derive(Debug)]
pub struct RegisterOutput {
    /// The created user
    pub user: User,
    /// Session token for cookie (registration signs the user in)
    pub session_token: String,
}

/// Registration use case
pub struct RegisterUseCase<U, T, M>
where
    U: UserRepository,
    T: VerificationTokenRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    verification: Arc<AccountVerificationFlow<U, T, M>>,
    config: Arc<AuthConfig>,
    sessions: SessionManager,
}

impl<U, T, M> RegisterUseCase<U, T, M>
where
    U: UserRepository + 'static,
    T: VerificationTokenRepository,
    M: Mailer,
{
    pub fn new(
        user_repo: Arc<U>,
        verification: Arc<AccountVerificationFlow<U, T, M>>,
        config: Arc<AuthConfig>,
    ) -> Self {
        let sessions = SessionManager::new(&config);
        Self {
            user_repo,
            verification,
            config,
            sessions,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let email = Email::new(&input.email)
            .map_err(|_| AuthError::validation("email", "A valid email address is required."))?;

        let password = ClearTextPassword::new(input.password.clone()).map_err(|_| {
            AuthError::validation("password", "A password of 8 or more characters is required.")
        })?;

        if input.password != input.password_confirmation {
            return Err(AuthError::validation(
                "passwordConfirmation",
                "Passwords must match.",
            ));
        }

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::validation(
                "email",
                format!("{email} is unavailable."),
            ));
        }

        // Argon2 hashing is CPU-bound; keep it off the async runtime
        let pepper = self.config.password_pepper.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || password.hash(pepper.as_deref()))
                .await
                .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {e}")))?
                .map_err(|e| AuthError::Internal(format!("Password hashing failed: {e}")))?;

        let user = User::new(email.clone(), password_hash);
        self.user_repo.create(&user).await?;

        // Delivery failure surfaces as 500, but the account already
        // exists; the user can request a resend after logging in
        self.verification.request(&user.user_id, &email).await?;

        let session_token = self.sessions.issue(&user.user_id);

        tracing::info!(user_id = %user.user_id, "User registered");

        Ok(RegisterOutput {
            user,
            session_token,
        })
    }
}
