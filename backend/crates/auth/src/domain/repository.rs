//! Repository and Delivery Traits
//!
//! Interfaces for data persistence and outbound mail. Implementations
//! live in the infrastructure layer.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entity::{user::User, verification_token::AccountVerificationToken};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Check if email is already registered
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Mark the user's email as verified
    async fn set_verified_at(&self, user_id: &UserId, verified_at: DateTime<Utc>)
    -> AuthResult<()>;

    /// Record authenticated activity (best-effort background update)
    async fn touch_last_activity(&self, user_id: &UserId) -> AuthResult<()>;

    /// Delete users whose last activity predates `cutoff`
    ///
    /// Their verification tokens go with them. Returns the number of
    /// users removed.
    async fn delete_inactive_before(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}

/// Account verification token repository trait
#[trait_variant::make(VerificationTokenRepository: Send)]
pub trait LocalVerificationTokenRepository {
    /// Insert a token, replacing any existing one for the same user
    async fn upsert(&self, token: &AccountVerificationToken) -> AuthResult<()>;

    /// Find the live token for a user
    async fn find_by_user_id(&self, user_id: &UserId)
    -> AuthResult<Option<AccountVerificationToken>>;

    /// Delete the user's token (consumes it)
    async fn delete_by_user_id(&self, user_id: &UserId) -> AuthResult<()>;
}

/// Outbound mail delivery trait
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    /// Send the account verification link to the given address
    async fn send_account_verification(&self, email: &Email, link: &str) -> AuthResult<()>;
}
