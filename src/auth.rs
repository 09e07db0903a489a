//! Bearer-token validation for the record store session.
//!
//! The token is a three-part JWT whose signature is never verified locally;
//! the store validates it on every request. Only the payload segment is
//! decoded, into a typed structure, to extract the owning user id and the
//! expiry. An expired or subject-less token is fatal to the run, since no
//! local refresh capability exists.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Errors from token validation and pasted-auth parsing. All fatal.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token is not a three-part JWT")]
    Malformed,

    #[error("failed to decode token payload: {0}")]
    Decode(String),

    #[error("token payload has no user id")]
    MissingSubject,

    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("invalid auth data: {0}")]
    InvalidAuthData(String),
}

/// Claims decoded from the token payload.
#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    /// Subject / owning user id.
    pub id: Option<String>,
    /// Expiry, seconds since epoch.
    pub exp: Option<i64>,
}

/// Validated session identity, read-only for the remainder of the run.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub bearer_token: String,
    pub owner_user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Decode the payload segment of a JWT without verifying the signature.
pub fn decode_payload(raw_token: &str) -> Result<TokenPayload, AuthError> {
    let mut segments = raw_token.split('.');
    let payload_b64 = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AuthError::Malformed),
    };

    // JWT segments drop base64 padding; restore it before decoding.
    let mut padded = payload_b64.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    let bytes = URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| AuthError::Decode(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::Decode(e.to_string()))
}

impl AuthContext {
    /// Validate a raw token against the current time.
    pub fn validate(raw_token: &str) -> Result<Self, AuthError> {
        Self::validate_at(raw_token, Utc::now())
    }

    /// Validate with an explicit clock.
    pub fn validate_at(raw_token: &str, now: DateTime<Utc>) -> Result<Self, AuthError> {
        let payload = decode_payload(raw_token)?;

        let owner_user_id = payload
            .id
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingSubject)?;

        // A missing exp claim reads as epoch and therefore as expired.
        let expires_at = Utc
            .timestamp_opt(payload.exp.unwrap_or(0), 0)
            .single()
            .ok_or_else(|| AuthError::Decode("exp claim out of range".to_string()))?;
        if expires_at <= now {
            return Err(AuthError::Expired(expires_at));
        }

        Ok(Self {
            bearer_token: raw_token.to_string(),
            owner_user_id,
            expires_at,
        })
    }
}

/// Parse pasted auth data from the browser: either the full JSON blob the
/// web app stores under `pocketbase_auth_v2` (`{"token": ..., "model":
/// {"id": ...}}`) or a bare JWT.
///
/// Returns the `(bearer_token, owner_user_id)` pair the pipeline consumes.
pub fn parse_pasted_auth(input: &str) -> Result<(String, String), AuthError> {
    let input = input.trim();

    if input.starts_with('{') {
        let value: serde_json::Value =
            serde_json::from_str(input).map_err(|e| AuthError::InvalidAuthData(e.to_string()))?;
        let token = value
            .get("token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| AuthError::InvalidAuthData("missing token field".to_string()))?;
        // Newer app versions store the user under "record" instead of "model".
        let model = value
            .get("model")
            .or_else(|| value.get("record"))
            .ok_or_else(|| AuthError::InvalidAuthData("missing model/record field".to_string()))?;
        let user_id = model
            .get("id")
            .and_then(|id| id.as_str())
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingSubject)?;
        Ok((token.to_string(), user_id.to_string()))
    } else {
        let payload = decode_payload(input)?;
        let user_id = payload
            .id
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingSubject)?;
        Ok((input.to_string(), user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::Duration;

    /// Build an unsigned token with the given claims. Encoded without
    /// padding, like real JWTs, to exercise the re-padding path.
    fn make_token(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.sig")
    }

    fn future_exp() -> i64 {
        (Utc::now() + Duration::hours(2)).timestamp()
    }

    #[test]
    fn test_validate_extracts_subject_and_expiry() {
        let exp = future_exp();
        let token = make_token(serde_json::json!({"id": "usr_abc", "exp": exp}));
        let ctx = AuthContext::validate(&token).unwrap();
        assert_eq!(ctx.owner_user_id, "usr_abc");
        assert_eq!(ctx.expires_at.timestamp(), exp);
        assert_eq!(ctx.bearer_token, token);
    }

    #[test]
    fn test_validate_rejects_expired_token() {
        let exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = make_token(serde_json::json!({"id": "usr_abc", "exp": exp}));
        assert!(matches!(
            AuthContext::validate(&token),
            Err(AuthError::Expired(_))
        ));
    }

    #[test]
    fn test_validate_rejects_missing_subject() {
        let token = make_token(serde_json::json!({"exp": future_exp()}));
        assert!(matches!(
            AuthContext::validate(&token),
            Err(AuthError::MissingSubject)
        ));
    }

    #[test]
    fn test_validate_rejects_missing_exp_as_expired() {
        let token = make_token(serde_json::json!({"id": "usr_abc"}));
        assert!(matches!(
            AuthContext::validate(&token),
            Err(AuthError::Expired(_))
        ));
    }

    #[test]
    fn test_validate_rejects_two_part_token() {
        assert!(matches!(
            AuthContext::validate("header.payload"),
            Err(AuthError::Malformed)
        ));
    }

    #[test]
    fn test_decode_tolerates_missing_padding() {
        // "{"id":"x"}" encodes to a length that needs two padding bytes.
        let payload = URL_SAFE_NO_PAD.encode(br#"{"id":"x"}"#);
        assert_ne!(payload.len() % 4, 0);
        let token = format!("h.{payload}.s");
        let decoded = decode_payload(&token).unwrap();
        assert_eq!(decoded.id.as_deref(), Some("x"));
    }

    #[test]
    fn test_parse_pasted_json_blob() {
        let token = make_token(serde_json::json!({"id": "usr_abc", "exp": future_exp()}));
        let blob = serde_json::json!({
            "token": token,
            "model": {"id": "usr_abc", "email": "a@example.com"}
        })
        .to_string();
        let (parsed_token, user_id) = parse_pasted_auth(&blob).unwrap();
        assert_eq!(parsed_token, token);
        assert_eq!(user_id, "usr_abc");
    }

    #[test]
    fn test_parse_pasted_blob_with_record_instead_of_model() {
        let blob = serde_json::json!({
            "token": "a.b.c",
            "record": {"id": "usr_rec"}
        })
        .to_string();
        let (_, user_id) = parse_pasted_auth(&blob).unwrap();
        assert_eq!(user_id, "usr_rec");
    }

    #[test]
    fn test_parse_pasted_bare_token() {
        let token = make_token(serde_json::json!({"id": "usr_bare", "exp": future_exp()}));
        let (parsed_token, user_id) = parse_pasted_auth(&format!("  {token}\n")).unwrap();
        assert_eq!(parsed_token, token);
        assert_eq!(user_id, "usr_bare");
    }

    #[test]
    fn test_parse_pasted_blob_without_token_field() {
        let result = parse_pasted_auth(r#"{"model": {"id": "x"}}"#);
        assert!(matches!(result, Err(AuthError::InvalidAuthData(_))));
    }
}
