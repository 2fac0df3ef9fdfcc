//! Account Verification Token Entity
//!
//! At most one live token exists per user: the row is keyed uniquely on
//! `user_id` and re-issuing overwrites in place, implicitly invalidating
//! the previous value. The row is deleted on successful verification,
//! so its presence is the proof of pending status.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::crypto::{self, Encoding};

/// Random bytes in a fresh token value
const TOKEN_BYTE_LENGTH: usize = 16;

/// Account verification token
#[derive(Debug, Clone)]
pub struct AccountVerificationToken {
    /// Owning user (unique key; FK-cascaded on user deletion)
    pub user_id: UserId,
    /// Raw token value, URL-safe base64 so it survives a URL path segment
    pub token: String,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp (bumped on overwrite)
    pub updated_at: DateTime<Utc>,
}

impl AccountVerificationToken {
    /// Issue a fresh token for a user
    pub fn issue(user_id: UserId) -> Self {
        let now = Utc::now();

        Self {
            user_id,
            token: crypto::random_token(TOKEN_BYTE_LENGTH, Encoding::Base64Url),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_generates_url_safe_token() {
        let token = AccountVerificationToken::issue(UserId::new());
        assert_eq!(token.token.len(), 22); // 16 bytes, unpadded base64
        assert!(
            token
                .token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_issue_generates_distinct_values() {
        let user_id = UserId::new();
        let a = AccountVerificationToken::issue(user_id);
        let b = AccountVerificationToken::issue(user_id);
        assert_ne!(a.token, b.token);
    }
}
