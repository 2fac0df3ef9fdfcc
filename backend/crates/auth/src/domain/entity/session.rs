//! Session Entity
//!
//! The ephemeral, client-held session state. There is no server-side
//! session row: the whole session is this payload, carried inside a
//! tamper-evident cookie. Its lifetime is exactly the fixed TTL from
//! issuance, or until the cookie is cleared. The flip side is that a
//! session cannot be revoked remotely before it expires — an inherent
//! property of the stateless design.

use chrono::{Duration, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};

/// Client-held session payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Owning user, as a UUID string
    pub user_id: String,
    /// Absolute expiry (Unix timestamp ms); fixed at issuance, not sliding
    pub expires_at_ms: i64,
}

impl Session {
    /// Create a session expiring `ttl` from now
    pub fn new(user_id: &UserId, ttl: Duration) -> Self {
        Self {
            user_id: user_id.to_string(),
            expires_at_ms: (Utc::now() + ttl).timestamp_millis(),
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    /// Parse the owning user's ID
    ///
    /// An empty or malformed `user_id` makes the session invalid even
    /// when its signature verifies.
    pub fn owner(&self) -> Option<UserId> {
        if self.user_id.is_empty() {
            return None;
        }
        UserId::parse(&self.user_id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_not_expired() {
        let session = Session::new(&UserId::new(), Duration::hours(24));
        assert!(!session.is_expired());
        assert!(session.owner().is_some());
    }

    #[test]
    fn test_expired_session() {
        let session = Session {
            user_id: UserId::new().to_string(),
            expires_at_ms: Utc::now().timestamp_millis() - 1,
        };
        assert!(session.is_expired());
    }

    #[test]
    fn test_empty_user_id_has_no_owner() {
        let session = Session {
            user_id: String::new(),
            expires_at_ms: Utc::now().timestamp_millis() + 1000,
        };
        assert!(session.owner().is_none());
    }
}
