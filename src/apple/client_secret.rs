// Apple client secret generation
use super::{AppleCredentials, APPLE_ISSUER};
use crate::utils::crypto::{create_jwt, create_jwt_header, JwtAlgorithm};
use chrono::{Duration, Utc};

/// Lifetime of a generated client secret; each exchange signs a fresh one
pub const CLIENT_SECRET_TTL_MINUTES: i64 = 5;

/// Generate Apple client secret JWT
///
/// Apple expects an ES256 JWT signed with the team's private key as the
/// `client_secret` of the token request.
///
/// # Errors
///
/// Returns an error if the private key cannot be parsed or signing fails
pub fn generate_client_secret(credentials: &AppleCredentials) -> anyhow::Result<String> {
    let header = create_jwt_header(JwtAlgorithm::ES256, Some(&credentials.key_id));

    let now = Utc::now();
    let exp = now + Duration::minutes(CLIENT_SECRET_TTL_MINUTES);

    let payload = serde_json::json!({
        "iss": credentials.team_id,
        "iat": now.timestamp(),
        "exp": exp.timestamp(),
        "aud": APPLE_ISSUER,
        "sub": credentials.client_id
    });

    let jwt = create_jwt(
        &header,
        &payload,
        JwtAlgorithm::ES256,
        &credentials.private_key_pem,
    )?;

    log::debug!("Generated Apple client secret JWT for {}", credentials.client_id);
    Ok(jwt)
}
