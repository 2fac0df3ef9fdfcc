//! Account Verification Flow
//!
//! Proves ownership of an email address. A random token is stored
//! against the user (one live token per user, re-issue overwrites) and
//! mailed out with its HMAC signature appended. Consuming a link
//! requires both a valid signature and a matching live row, so a link
//! stops working the moment it is consumed or superseded.

use std::sync::Arc;

use platform::crypto::{self, Encoding};

use crate::application::config::AuthConfig;
use crate::domain::entity::verification_token::AccountVerificationToken;
use crate::domain::repository::{Mailer, UserRepository, VerificationTokenRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use kernel::id::UserId;

/// Account verification flow
pub struct AccountVerificationFlow<U, T, M>
where
    U: UserRepository,
    T: VerificationTokenRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, T, M> AccountVerificationFlow<U, T, M>
where
    U: UserRepository,
    T: VerificationTokenRepository,
    M: Mailer,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        mailer: Arc<M>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            mailer,
            config,
        }
    }

    /// Issue (or re-issue) a verification token, returning it signed
    ///
    /// Overwrites any previous token for the user, which invalidates the
    /// previously mailed link. The unique row per user is the only
    /// serialization point; concurrent re-issues race and the last
    /// writer wins.
    pub async fn issue_or_replace(&self, user_id: &UserId) -> AuthResult<String> {
        let token = AccountVerificationToken::issue(*user_id);
        self.token_repo.upsert(&token).await?;

        let signature = self.config.signer().sign(&token.token, Encoding::Base64Url);

        Ok(format!("{}.{}", token.token, signature))
    }

    /// Issue (or re-issue) a token and mail out the verification link
    pub async fn request(&self, user_id: &UserId, email: &Email) -> AuthResult<()> {
        let signed_token = self.issue_or_replace(user_id).await?;
        let link = self.config.verification_link(&signed_token);

        self.mailer
            .send_account_verification(email, &link)
            .await
            .map_err(|e| AuthError::Delivery(e.to_string()))?;

        tracing::info!(user_id = %user_id, "Verification email sent");

        Ok(())
    }

    /// Consume a signed token and mark the user verified
    ///
    /// The caller is the authenticated user the session resolved to; the
    /// token must match that user's live row. Signature verification
    /// happens before any storage lookup, and the stored value is
    /// compared in constant time. A consumed or superseded token has no
    /// live row and is rejected, so links are single-use.
    pub async fn consume(&self, user_id: &UserId, signed_token: &str) -> AuthResult<()> {
        let (value, signature) = signed_token
            .rsplit_once('.')
            .ok_or(AuthError::InvalidVerificationToken)?;

        if !self
            .config
            .signer()
            .verify(value, signature, Encoding::Base64Url)
        {
            return Err(AuthError::InvalidVerificationToken);
        }

        let stored = self
            .token_repo
            .find_by_user_id(user_id)
            .await?
            .ok_or(AuthError::InvalidVerificationToken)?;

        if !crypto::constant_time_eq(stored.token.as_bytes(), value.as_bytes()) {
            return Err(AuthError::InvalidVerificationToken);
        }

        self.user_repo
            .set_verified_at(user_id, chrono::Utc::now())
            .await?;
        self.token_repo.delete_by_user_id(user_id).await?;

        tracing::info!(user_id = %user_id, "Account verified");

        Ok(())
    }
}
