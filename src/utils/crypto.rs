// JWT helpers for the Apple client secret and Firebase custom tokens

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};

/// JWT signing algorithms supported by the generic JWT functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtAlgorithm {
    /// ECDSA with P-256 curve and SHA-256 (Apple client secrets)
    ES256,
    /// RSASSA-PKCS1-v1_5 with SHA-256 (Firebase custom tokens)
    RS256,
}

impl JwtAlgorithm {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JwtAlgorithm::ES256 => "ES256",
            JwtAlgorithm::RS256 => "RS256",
        }
    }
}

/// Decode a JWT payload without verifying its signature
///
/// Apple identity tokens are read this way: the relay trusts the token because it
/// arrived over TLS straight from Apple's token endpoint.
///
/// # Errors
///
/// Returns an error if:
/// - The JWT format is invalid (not 3 parts separated by dots)
/// - Base64 decoding fails
/// - UTF-8 decoding fails
/// - JSON parsing fails
pub fn decode_jwt_payload(token: &str) -> Result<serde_json::Value, String> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid JWT format".to_string());
    }

    let payload_b64 = parts[1];
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| general_purpose::STANDARD.decode(payload_b64))
        .map_err(|_| "Base64 decode failed")?;

    let payload_str = String::from_utf8(payload_bytes).map_err(|_| "UTF-8 decode failed")?;

    serde_json::from_str(&payload_str).map_err(|_| "JSON parse failed".to_string())
}

/// Create a signed JWT from a header and payload
///
/// # Arguments
///
/// * `header` - JWT header as a JSON value
/// * `payload` - JWT payload/claims as a JSON value
/// * `algorithm` - The signing algorithm to use
/// * `private_key_pem` - PEM-encoded PKCS#8 private key matching `algorithm`
///
/// # Errors
///
/// Returns an error if:
/// - JSON serialization fails
/// - Key parsing fails
/// - Signing operation fails
pub fn create_jwt(
    header: &serde_json::Value,
    payload: &serde_json::Value,
    algorithm: JwtAlgorithm,
    private_key_pem: &str,
) -> Result<String> {
    let message = jwt_signing_input(header, payload)?;

    let signature_bytes = match algorithm {
        JwtAlgorithm::ES256 => sign_jwt_es256(message.as_bytes(), private_key_pem)?,
        JwtAlgorithm::RS256 => sign_jwt_rs256(message.as_bytes(), private_key_pem)?,
    };

    Ok(append_jwt_signature(&message, &signature_bytes))
}

/// Base64URL `header.payload`, the bytes a JWT signature covers
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn jwt_signing_input(
    header: &serde_json::Value,
    payload: &serde_json::Value,
) -> Result<String> {
    let header_json = serde_json::to_string(header).context("Failed to serialize JWT header")?;
    let payload_json =
        serde_json::to_string(payload).context("Failed to serialize JWT payload")?;

    let header_b64 = general_purpose::URL_SAFE_NO_PAD.encode(header_json.as_bytes());
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload_json.as_bytes());

    Ok(format!("{header_b64}.{payload_b64}"))
}

/// Complete a JWT from its signing input and raw signature
#[must_use]
pub fn append_jwt_signature(signing_input: &str, signature: &[u8]) -> String {
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);
    format!("{signing_input}.{signature_b64}")
}

/// Sign a message using ECDSA P-256 with SHA-256 (ES256)
///
/// # Errors
///
/// Returns an error if the private key cannot be parsed
fn sign_jwt_es256(message: &[u8], private_key_pem: &str) -> Result<Vec<u8>> {
    use p256::ecdsa::{signature::Signer, Signature, SigningKey};
    use p256::pkcs8::DecodePrivateKey;

    let signing_key = SigningKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| anyhow!("Failed to parse ECDSA private key: {e:?}"))?;

    let signature: Signature = signing_key.sign(message);
    Ok(signature.to_bytes().to_vec())
}

/// Sign a message using RSASSA-PKCS1-v1_5 with SHA-256 (RS256)
///
/// # Errors
///
/// Returns an error if the private key cannot be parsed
fn sign_jwt_rs256(message: &[u8], private_key_pem: &str) -> Result<Vec<u8>> {
    let signing_key = load_rs256_signing_key(private_key_pem)?;
    Ok(sign_with_rs256_key(&signing_key, message))
}

/// Parse a PKCS#8 PEM RSA key into an RS256 signing key
///
/// # Errors
///
/// Returns an error if the PEM is not a valid PKCS#8 RSA private key
pub fn load_rs256_signing_key(
    private_key_pem: &str,
) -> Result<rsa::pkcs1v15::SigningKey<rsa::sha2::Sha256>> {
    use rsa::pkcs8::DecodePrivateKey;

    let private_key = rsa::RsaPrivateKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;

    Ok(rsa::pkcs1v15::SigningKey::<rsa::sha2::Sha256>::new(private_key))
}

/// Sign a message with an already parsed RS256 key
#[must_use]
pub fn sign_with_rs256_key(
    signing_key: &rsa::pkcs1v15::SigningKey<rsa::sha2::Sha256>,
    message: &[u8],
) -> Vec<u8> {
    use rsa::signature::{SignatureEncoding, Signer};

    signing_key.sign(message).to_vec()
}

/// Create a JWT header for the given algorithm
///
/// # Arguments
///
/// * `algorithm` - The JWT algorithm
/// * `key_id` - Optional key ID (`kid`)
#[must_use]
pub fn create_jwt_header(algorithm: JwtAlgorithm, key_id: Option<&str>) -> serde_json::Value {
    let mut header = serde_json::json!({
        "alg": algorithm.as_str(),
        "typ": "JWT"
    });

    if let Some(kid) = key_id {
        header["kid"] = serde_json::Value::String(kid.to_string());
    }

    header
}

/// Encode a JWT whose signature segment is not meaningful
///
/// Used wherever a token only needs to be decoded without verification.
#[must_use]
pub fn encode_unsigned_jwt(payload: &serde_json::Value) -> String {
    let header = create_jwt_header(JwtAlgorithm::RS256, None);
    let header_b64 = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string().as_bytes());
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{header_b64}.{payload_b64}.unsigned")
}
