//! Cryptographic Utilities
//!
//! Keyed signing, random token generation, and constant-time comparison.
//! Verification never errors: malformed input is simply not a valid
//! signature.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Output encoding for tokens and signatures
///
/// Hex for values that live in cookies and headers; URL-safe base64
/// (unpadded) for values that must survive inside a URL path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Hex,
    Base64Url,
}

impl Encoding {
    fn encode(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::Hex => hex::encode(bytes),
            Encoding::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
        }
    }
}

/// Keyed HMAC-SHA256 signer
///
/// Holds the process-wide signing secret, loaded once at startup and
/// injected into every component that signs or verifies.
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign the UTF-8 bytes of `value`
    pub fn sign(&self, value: &str, encoding: Encoding) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(value.as_bytes());
        encoding.encode(&mac.finalize().into_bytes())
    }

    /// Verify a signature produced by [`Signer::sign`]
    ///
    /// Recomputes the signature and compares the encoded forms in
    /// constant time. Empty or malformed signatures return `false`.
    pub fn verify(&self, value: &str, signature: &str, encoding: Encoding) -> bool {
        if signature.is_empty() {
            return false;
        }
        let expected = self.sign(value, encoding);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("secret", &"[SECRET]").finish()
    }
}

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate an encoded random token
///
/// 16 bytes is the conventional length; collisions are not a practical
/// concern at that size, so no uniqueness is enforced here. Callers that
/// need at-most-one semantics get them from a storage constraint.
pub fn random_token(byte_len: usize, encoding: Encoding) -> String {
    encoding.encode(&random_bytes(byte_len))
}

/// Constant-time comparison to prevent timing attacks
///
/// A length mismatch returns `false` without error. Equal-length inputs
/// are compared without short-circuiting.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> Signer {
        Signer::new(b"test-secret-key".to_vec())
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let s = signer();
        for encoding in [Encoding::Hex, Encoding::Base64Url] {
            let sig = s.sign("some value", encoding);
            assert!(s.verify("some value", &sig, encoding));
        }
    }

    #[test]
    fn test_verify_rejects_other_value() {
        let s = signer();
        let sig = s.sign("value-a", Encoding::Hex);
        assert!(!s.verify("value-b", &sig, Encoding::Hex));
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let sig = signer().sign("value", Encoding::Hex);
        let other = Signer::new(b"another-secret".to_vec());
        assert!(!other.verify("value", &sig, Encoding::Hex));
    }

    #[test]
    fn test_verify_malformed_signature() {
        let s = signer();
        assert!(!s.verify("value", "", Encoding::Hex));
        assert!(!s.verify("value", "not hex at all", Encoding::Hex));
        assert!(!s.verify("value", "deadbeef", Encoding::Hex));
    }

    #[test]
    fn test_encodings_differ() {
        let s = signer();
        let hex = s.sign("value", Encoding::Hex);
        let b64 = s.sign("value", Encoding::Base64Url);
        assert_ne!(hex, b64);
        // A signature is only valid under the encoding it was issued in
        assert!(!s.verify("value", &b64, Encoding::Hex));
    }

    #[test]
    fn test_sign_is_deterministic() {
        let s = signer();
        assert_eq!(
            s.sign("value", Encoding::Hex),
            s.sign("value", Encoding::Hex)
        );
    }

    #[test]
    fn test_random_token_lengths() {
        // hex doubles, base64url rounds up to 4/3
        assert_eq!(random_token(16, Encoding::Hex).len(), 32);
        assert_eq!(random_token(16, Encoding::Base64Url).len(), 22);
    }

    #[test]
    fn test_random_bytes_not_all_zeros() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
        // length mismatch must return false, not panic
        assert!(!constant_time_eq(b"abcd", b"abc"));
        assert!(!constant_time_eq(b"", b"a"));
        assert!(constant_time_eq(b"", b""));
    }
}
