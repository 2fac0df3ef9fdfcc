//! Session Manager
//!
//! Issues and validates stateless session tokens. A token is the
//! base64url-encoded JSON session payload followed by a hex HMAC
//! signature, joined with a dot. Validation recomputes the signature
//! before ever decoding the payload, so unauthenticated input is never
//! parsed.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use kernel::id::UserId;
use platform::crypto::{Encoding, Signer};

use crate::application::config::AuthConfig;
use crate::domain::entity::session::Session;

/// Stateless session token issuer/validator
#[derive(Debug, Clone)]
pub struct SessionManager {
    signer: Signer,
    ttl: chrono::Duration,
}

impl SessionManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            signer: config.signer(),
            ttl: config.session_ttl_chrono(),
        }
    }

    /// Issue a token for a user
    ///
    /// Serialization of the in-memory payload cannot fail, so issuance
    /// is infallible.
    pub fn issue(&self, user_id: &UserId) -> String {
        let session = Session::new(user_id, self.ttl);
        // Session has no map keys or non-string fields that can fail
        let json = serde_json::to_string(&session).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json.as_bytes());
        let signature = self.signer.sign(&payload, Encoding::Hex);

        format!("{payload}.{signature}")
    }

    /// Validate a token and return its owner
    ///
    /// Returns `None` for any defect: bad shape, bad signature, bad
    /// payload, expired, or unparseable owner. Callers treat all of
    /// these identically as "not signed in".
    pub fn validate(&self, token: &str) -> Option<UserId> {
        let (payload, signature) = token.rsplit_once('.')?;

        if !self.signer.verify(payload, signature, Encoding::Hex) {
            return None;
        }

        let json = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
        let session: Session = serde_json::from_slice(&json).ok()?;

        if session.is_expired() {
            return None;
        }

        session.owner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn manager() -> SessionManager {
        SessionManager::new(&AuthConfig::test())
    }

    #[test]
    fn test_issue_validate_roundtrip() {
        let m = manager();
        let user_id = UserId::new();
        let token = m.issue(&user_id);
        assert_eq!(m.validate(&token), Some(user_id));
    }

    #[test]
    fn test_validate_rejects_tampered_payload() {
        let m = manager();
        let token = m.issue(&UserId::new());
        let (_, signature) = token.rsplit_once('.').unwrap();

        let forged = Session {
            user_id: UserId::new().to_string(),
            expires_at_ms: Utc::now().timestamp_millis() + 60_000,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_string(&forged).unwrap());

        assert!(m.validate(&format!("{payload}.{signature}")).is_none());
    }

    #[test]
    fn test_validate_rejects_other_key() {
        let token = manager().issue(&UserId::new());
        let other = SessionManager::new(&AuthConfig {
            secret_key: b"another-secret".to_vec(),
            ..AuthConfig::test()
        });
        assert!(other.validate(&token).is_none());
    }

    #[test]
    fn test_validate_rejects_expired() {
        let m = manager();
        let session = Session {
            user_id: UserId::new().to_string(),
            expires_at_ms: Utc::now().timestamp_millis() - 1,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_string(&session).unwrap());
        let signature = AuthConfig::test().signer().sign(&payload, Encoding::Hex);

        assert!(m.validate(&format!("{payload}.{signature}")).is_none());
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let m = manager();
        assert!(m.validate("").is_none());
        assert!(m.validate("no-dot-here").is_none());
        assert!(m.validate("payload.").is_none());
        assert!(m.validate(".signature").is_none());
        assert!(m.validate("a.b.c").is_none());
    }
}
