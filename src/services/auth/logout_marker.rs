//! Unverified inspection of a bearer token for the `logout` marker claim.
//!
//! The signature is NOT checked here; that is the access middleware's job. This
//! only decodes the compact JWS payload far enough to see whether the token was
//! handed out by `/auth/logout`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};
use thiserror::Error;

const LOGOUT_CLAIM: &str = "logout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStatus {
    /// No logout marker present.
    Clear,
    /// `logout` claim is `"true"` (or boolean `true`).
    LoggedOut,
}

#[derive(Debug, Error)]
pub enum PeekError {
    #[error("token is not a three-part compact JWS")]
    Malformed,
    #[error("segment is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("segment is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

fn decode_segment(segment: &str) -> Result<Map<String, Value>, PeekError> {
    // Some issuers keep the '=' padding.
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn inspect(token: &str) -> Result<MarkerStatus, PeekError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(PeekError::Malformed);
    };

    decode_segment(header)?;
    let claims = decode_segment(payload)?;

    let status = match claims.get(LOGOUT_CLAIM) {
        Some(Value::String(value)) if value == "true" => MarkerStatus::LoggedOut,
        Some(Value::Bool(true)) => MarkerStatus::LoggedOut,
        _ => MarkerStatus::Clear,
    };
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload);
        format!("{header}.{payload}.not-a-real-signature")
    }

    #[test]
    fn string_marker_is_detected() {
        let status = inspect(&token(r#"{"logout":"true","exp":1}"#)).unwrap();
        assert_eq!(status, MarkerStatus::LoggedOut);
    }

    #[test]
    fn boolean_marker_is_detected() {
        let status = inspect(&token(r#"{"logout":true}"#)).unwrap();
        assert_eq!(status, MarkerStatus::LoggedOut);
    }

    #[test]
    fn other_values_are_not_a_marker() {
        for payload in [
            r#"{"logout":"false"}"#,
            r#"{"logout":"TRUE"}"#,
            r#"{"logout":1}"#,
            r#"{"nameid":"1","role":"Administrador"}"#,
        ] {
            assert_eq!(inspect(&token(payload)).unwrap(), MarkerStatus::Clear);
        }
    }

    #[test]
    fn signature_is_not_checked() {
        let forged = token(r#"{"logout":"true"}"#);
        assert_eq!(inspect(&forged).unwrap(), MarkerStatus::LoggedOut);
    }

    #[test]
    fn malformed_tokens_are_errors() {
        assert!(matches!(inspect("abc"), Err(PeekError::Malformed)));
        assert!(matches!(inspect("a.b.c.d"), Err(PeekError::Malformed)));
        assert!(matches!(inspect("a.%%%.c"), Err(PeekError::Encoding(_))));

        let not_json = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode("not json")
        );
        assert!(matches!(inspect(&not_json), Err(PeekError::Json(_))));
    }
}
