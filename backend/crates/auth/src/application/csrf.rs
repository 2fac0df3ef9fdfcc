//! CSRF Double-Submit Tokens
//!
//! A token is a random value with its own HMAC signature appended
//! (`value.signature`). The frontend receives it in a JS-readable
//! cookie and must echo it back in a request header on every mutating
//! request; the guard verifies each copy's signature and requires the
//! two values to match. Signing the value means a token cannot be
//! minted by anything that does not hold the server secret, so an
//! attacker who can set cookies (e.g. from a sibling subdomain) still
//! cannot forge a passing pair.

use platform::crypto::{self, Encoding, Signer};

/// Random bytes in a fresh CSRF value
const CSRF_VALUE_BYTE_LENGTH: usize = 16;

/// Why a request failed the CSRF check
///
/// The distinctions exist for logging only; clients always see the same
/// generic 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CsrfRejection {
    #[error("missing CSRF token")]
    MissingToken,
    #[error("malformed CSRF token")]
    Malformed,
    #[error("invalid CSRF token signature")]
    InvalidSignature,
    #[error("CSRF header and cookie do not match")]
    ValueMismatch,
}

/// Issue a fresh signed CSRF token
pub fn issue_csrf_token(signer: &Signer) -> String {
    let value = crypto::random_token(CSRF_VALUE_BYTE_LENGTH, Encoding::Hex);
    let signature = signer.sign(&value, Encoding::Hex);

    format!("{value}.{signature}")
}

/// Validate the double-submit pair for a mutating request
///
/// Both copies must be present and well-formed, each copy's signature
/// must verify against its own value, and the two values must match.
/// Pure over its inputs; the middleware feeds it the header and cookie.
pub fn validate_double_submit(
    signer: &Signer,
    header_token: Option<&str>,
    cookie_token: Option<&str>,
) -> Result<(), CsrfRejection> {
    let header_token = header_token.ok_or(CsrfRejection::MissingToken)?;
    let cookie_token = cookie_token.ok_or(CsrfRejection::MissingToken)?;

    let (header_value, header_signature) = split_token(header_token)?;
    let (cookie_value, cookie_signature) = split_token(cookie_token)?;

    if !signer.verify(header_value, header_signature, Encoding::Hex)
        || !signer.verify(cookie_value, cookie_signature, Encoding::Hex)
    {
        return Err(CsrfRejection::InvalidSignature);
    }

    if !crypto::constant_time_eq(header_value.as_bytes(), cookie_value.as_bytes()) {
        return Err(CsrfRejection::ValueMismatch);
    }

    Ok(())
}

fn split_token(token: &str) -> Result<(&str, &str), CsrfRejection> {
    let (value, signature) = token.rsplit_once('.').ok_or(CsrfRejection::Malformed)?;

    if value.is_empty() || signature.is_empty() {
        return Err(CsrfRejection::Malformed);
    }

    Ok((value, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> Signer {
        Signer::new(b"test-secret-key".to_vec())
    }

    #[test]
    fn test_issued_token_validates() {
        let s = signer();
        let token = issue_csrf_token(&s);
        assert!(validate_double_submit(&s, Some(&token), Some(&token)).is_ok());
    }

    #[test]
    fn test_tokens_are_unique() {
        let s = signer();
        assert_ne!(issue_csrf_token(&s), issue_csrf_token(&s));
    }

    #[test]
    fn test_missing_either_copy() {
        let s = signer();
        let token = issue_csrf_token(&s);
        assert_eq!(
            validate_double_submit(&s, None, Some(&token)),
            Err(CsrfRejection::MissingToken)
        );
        assert_eq!(
            validate_double_submit(&s, Some(&token), None),
            Err(CsrfRejection::MissingToken)
        );
    }

    #[test]
    fn test_mismatched_values_with_valid_signatures() {
        let s = signer();
        let a = issue_csrf_token(&s);
        let b = issue_csrf_token(&s);
        assert_eq!(
            validate_double_submit(&s, Some(&a), Some(&b)),
            Err(CsrfRejection::ValueMismatch)
        );
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let s = signer();
        let valid = issue_csrf_token(&s);
        for malformed in ["justavalue", "value.", ".signature"] {
            assert_eq!(
                validate_double_submit(&s, Some(malformed), Some(&valid)),
                Err(CsrfRejection::Malformed)
            );
            assert_eq!(
                validate_double_submit(&s, Some(&valid), Some(malformed)),
                Err(CsrfRejection::Malformed)
            );
        }
    }

    #[test]
    fn test_forged_signature_rejected_on_either_side() {
        let s = signer();
        let valid = issue_csrf_token(&s);
        let forged = format!("deadbeef.{}", s.sign("otherthing", Encoding::Hex));
        assert_eq!(
            validate_double_submit(&s, Some(&forged), Some(&valid)),
            Err(CsrfRejection::InvalidSignature)
        );
        assert_eq!(
            validate_double_submit(&s, Some(&valid), Some(&forged)),
            Err(CsrfRejection::InvalidSignature)
        );
    }

    #[test]
    fn test_token_signed_by_other_key_rejected() {
        let s = signer();
        let other = Signer::new(b"another-secret".to_vec());
        let token = issue_csrf_token(&other);
        assert_eq!(
            validate_double_submit(&s, Some(&token), Some(&token)),
            Err(CsrfRejection::InvalidSignature)
        );
    }
}
