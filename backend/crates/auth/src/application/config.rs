//! Application Configuration
//!
//! Configuration for the Auth application layer. Everything that signs
//! or verifies derives from the single `secret_key`; rotating it
//! invalidates all outstanding sessions, CSRF tokens, and verification
//! links at once.

use std::time::Duration;

use platform::crypto::Signer;
use platform::rate_limit::RateLimitPolicy;

/// Re-export cookie types from platform
pub use platform::cookie::{CookieConfig, SameSite};

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// CSRF cookie name (readable by frontend JavaScript)
    pub csrf_cookie_name: String,
    /// Request header the frontend echoes the CSRF token back in
    pub csrf_header_name: String,
    /// Process-wide HMAC signing secret
    pub secret_key: Vec<u8>,
    /// Session TTL (24 hours); fixed at issuance, not sliding
    pub session_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Cookie Domain attribute; omitted when `None`
    pub cookie_domain: Option<String>,
    /// Public base URL, used to build verification links
    pub app_url: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Throttle policy for login-class endpoints
    pub rate_limit: RateLimitPolicy,
    /// Disabled in test environments
    pub rate_limit_enabled: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "stride-session".to_string(),
            csrf_cookie_name: "XSRF-TOKEN".to_string(),
            csrf_header_name: "x-xsrf-token".to_string(),
            secret_key: Vec::new(),
            session_ttl: Duration::from_secs(24 * 3600), // 24 hours
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
            cookie_domain: None,
            app_url: "http://localhost:3000".to_string(),
            password_pepper: None,
            rate_limit: RateLimitPolicy::default(),
            rate_limit_enabled: true,
        }
    }
}

impl AuthConfig {
    /// Create config for tests (fixed secret, no throttling)
    pub fn test() -> Self {
        Self {
            secret_key: b"test-secret-key-for-auth".to_vec(),
            cookie_secure: false,
            rate_limit_enabled: false,
            ..Default::default()
        }
    }

    /// Signer over the shared secret
    pub fn signer(&self) -> Signer {
        Signer::new(self.secret_key.clone())
    }

    /// Session TTL as a chrono duration
    pub fn session_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.session_ttl.as_millis() as i64)
    }

    /// Cookie settings for the session cookie (HttpOnly)
    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            domain: self.cookie_domain.clone(),
            max_age_secs: Some(self.session_ttl.as_secs() as i64),
        }
    }

    /// Cookie settings for the CSRF cookie
    ///
    /// Deliberately not HttpOnly: the double-submit pattern requires the
    /// frontend to read this value and echo it in a request header.
    pub fn csrf_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.csrf_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: false,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            domain: self.cookie_domain.clone(),
            max_age_secs: None,
        }
    }

    /// Build the account verification link for a signed token
    pub fn verification_link(&self, signed_token: &str) -> String {
        format!(
            "{}/verify-account/{}",
            self.app_url.trim_end_matches('/'),
            signed_token
        )
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_is_http_only() {
        let config = AuthConfig::test();
        assert!(config.session_cookie().http_only);
        assert!(!config.csrf_cookie().http_only);
    }

    #[test]
    fn test_verification_link_strips_trailing_slash() {
        let config = AuthConfig {
            app_url: "https://app.example.com/".to_string(),
            ..AuthConfig::test()
        };
        assert_eq!(
            config.verification_link("abc.def"),
            "https://app.example.com/verify-account/abc.def"
        );
    }
}
