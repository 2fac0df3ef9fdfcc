//! User Entity
//!
//! The account row: identity, credential hash, and verification state.
//! The password hash is never serialized into API responses; handlers
//! go through [`crate::presentation::dto::UserResponse`].

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::value_object::email::Email;

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Email address (unique, used for login)
    pub email: Email,
    /// Adaptive salted password hash (PHC string)
    pub password_hash: HashedPassword,
    /// Set once the account verification token has been consumed
    pub verified_at: Option<DateTime<Utc>>,
    /// Last authenticated activity (best-effort, updated in background)
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user
    pub fn new(email: Email, password_hash: HashedPassword) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            password_hash,
            verified_at: None,
            last_activity_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the account's email has been verified
    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::ClearTextPassword;

    #[test]
    fn test_new_user_is_unverified() {
        let email = Email::new("alice@example.com").unwrap();
        let hash = ClearTextPassword::new("Secret123!".to_string())
            .unwrap()
            .hash(None)
            .unwrap();

        let user = User::new(email, hash);
        assert!(!user.is_verified());
        assert!(user.last_activity_at.is_some());
    }
}
