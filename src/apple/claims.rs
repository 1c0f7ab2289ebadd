// Identity token claim extraction
use crate::models::IdentityClaims;
use crate::utils::crypto::decode_jwt_payload;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("Failed to decode identity token: {0}")]
    Decode(String),

    #[error("Identity token is missing the 'sub' claim")]
    MissingSubject,
}

/// Read `sub` and `email` from an Apple identity token
///
/// The signature is NOT verified. The token comes straight from Apple's token
/// endpoint over TLS in the same request, which is the only trust the relay relies on.
///
/// # Errors
///
/// Returns an error if the token cannot be decoded or carries no usable subject
pub fn decode_identity_claims(id_token: &str) -> Result<IdentityClaims, ClaimsError> {
    let claims = decode_jwt_payload(id_token).map_err(ClaimsError::Decode)?;

    let sub = claims
        .get("sub")
        .and_then(serde_json::Value::as_str)
        .filter(|sub| !sub.is_empty())
        .ok_or(ClaimsError::MissingSubject)?
        .to_string();

    let email = claims
        .get("email")
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string);

    Ok(IdentityClaims { sub, email })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::encode_unsigned_jwt;
    use serde_json::json;

    #[test]
    fn test_decode_subject_and_email() {
        let token = encode_unsigned_jwt(&json!({
            "iss": "https://appleid.apple.com",
            "sub": "001234.abcdef.0987",
            "email": "x7y8@privaterelay.appleid.com",
            "email_verified": "true"
        }));

        let claims = decode_identity_claims(&token).unwrap();
        assert_eq!(claims.sub, "001234.abcdef.0987");
        assert_eq!(claims.email.as_deref(), Some("x7y8@privaterelay.appleid.com"));
    }

    #[test]
    fn test_email_is_optional() {
        let token = encode_unsigned_jwt(&json!({"sub": "u1"}));
        let claims = decode_identity_claims(&token).unwrap();

        assert_eq!(claims.email, None);
    }

    #[test]
    fn test_missing_subject() {
        let token = encode_unsigned_jwt(&json!({"email": "a@b.com"}));
        assert!(matches!(
            decode_identity_claims(&token),
            Err(ClaimsError::MissingSubject)
        ));

        let token = encode_unsigned_jwt(&json!({"sub": 42}));
        assert!(matches!(
            decode_identity_claims(&token),
            Err(ClaimsError::MissingSubject)
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            decode_identity_claims("not-a-jwt"),
            Err(ClaimsError::Decode(_))
        ));
    }
}
