//! Access token inspection.
//!
//! Reads the `exp` claim from a JWT-shaped access token without verifying
//! its signature. The result is advisory only: it lets the client skip a
//! request that is bound to fail, while the server stays the authority on
//! every call.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;

use crate::error::SessionError;

fn decode_error(message: impl Into<String>) -> SessionError {
    SessionError::Decode {
        message: message.into(),
    }
}

/// Decode the expiry (`exp`, unix seconds) of an access token.
///
/// # Errors
///
/// Returns [`SessionError::Decode`] if the token does not have three
/// segments, the payload is not base64url JSON, or `exp` is missing or not
/// a number.
pub fn decode_expiry(access_token: &str) -> Result<i64, SessionError> {
    let parts: Vec<&str> = access_token.split('.').collect();
    if parts.len() != 3 {
        return Err(decode_error(format!(
            "expected 3 segments, got {}",
            parts.len()
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| decode_error(format!("payload is not base64url: {e}")))?;
    let claims: serde_json::Value = serde_json::from_slice(&payload)
        .map_err(|e| decode_error(format!("payload is not JSON: {e}")))?;

    let exp = claims
        .get("exp")
        .ok_or_else(|| decode_error("missing claim: exp"))?;
    exp.as_i64()
        .or_else(|| exp.as_f64().map(|secs| secs as i64))
        .ok_or_else(|| decode_error("claim exp is not a number"))
}

/// Whether the token is expired at `now` (unix seconds).
///
/// An undecodable token counts as expired.
pub fn is_expired_at(access_token: &str, now: i64) -> bool {
    match decode_expiry(access_token) {
        Ok(exp) => now >= exp,
        Err(_) => true,
    }
}

/// Whether the token is expired now.
pub fn is_expired(access_token: &str) -> bool {
    is_expired_at(access_token, chrono::Utc::now().timestamp())
}

/// Whether the token expires within `window` from now (or already has).
pub fn expires_within(access_token: &str, window: Duration) -> bool {
    let window = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
    let horizon = chrono::Utc::now().timestamp().saturating_add(window);
    is_expired_at(access_token, horizon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode("sig");
        format!("{header}.{payload}.{signature}")
    }

    #[test]
    fn test_decode_expiry() {
        let token = token_with_payload(r#"{"sub":"u1","exp":1700000000}"#);
        assert_eq!(decode_expiry(&token).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_decode_expiry_float_claim() {
        let token = token_with_payload(r#"{"exp":1700000000.75}"#);
        assert_eq!(decode_expiry(&token).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_decode_expiry_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":42}"#);
        let token = format!("{header}.{payload}.sig");
        assert_eq!(decode_expiry(&token).unwrap(), 42);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode_expiry("opaque-token"),
            Err(SessionError::Decode { .. })
        ));
        assert!(decode_expiry("a.b").is_err());
        assert!(decode_expiry("h.!!!not-base64!!!.s").is_err());
        assert!(decode_expiry(&token_with_payload("not json")).is_err());
        assert!(decode_expiry(&token_with_payload(r#"{"sub":"u1"}"#)).is_err());
        assert!(decode_expiry(&token_with_payload(r#"{"exp":"soon"}"#)).is_err());
    }

    #[test]
    fn test_is_expired_at() {
        let token = token_with_payload(r#"{"exp":1000}"#);
        assert!(!is_expired_at(&token, 999));
        assert!(is_expired_at(&token, 1000));
        assert!(is_expired_at(&token, 1001));
    }

    #[test]
    fn test_malformed_token_is_expired() {
        assert!(is_expired("garbage"));
        assert!(expires_within("garbage", Duration::from_secs(0)));
    }

    #[test]
    fn test_expires_within() {
        let exp = chrono::Utc::now().timestamp() + 120;
        let token = token_with_payload(&format!(r#"{{"exp":{exp}}}"#));
        assert!(!is_expired(&token));
        assert!(!expires_within(&token, Duration::from_secs(30)));
        assert!(expires_within(&token, Duration::from_secs(300)));
    }

    #[test]
    fn test_expires_within_huge_window_saturates() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let token = token_with_payload(&format!(r#"{{"exp":{exp}}}"#));
        assert!(expires_within(&token, Duration::from_secs(u64::MAX)));
        assert!(expires_within(&token, Duration::from_secs(i64::MAX as u64)));
    }
}
