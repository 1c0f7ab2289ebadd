//! Authorization-code exchange against Apple's token endpoint
//!
//! The exchange sits behind [`CodeExchanger`] so handlers can be exercised
//! without reaching Apple.

use super::{generate_client_secret, AppleCredentials};
use crate::utils::logging::LoggingHelper;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Marker Apple (and RFC 6749) use for expired, invalid or already used codes
pub const INVALID_GRANT: &str = "invalid_grant";

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Failed to sign Apple client secret: {0}")]
    ClientSecret(String),

    #[error("Failed to reach Apple token endpoint: {0}")]
    Transport(String),

    #[error("Apple token endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("Token response did not include an id_token")]
    MissingIdToken,
}

impl ExchangeError {
    /// Whether Apple rejected the code itself (expired, invalid or reused)
    #[must_use]
    pub fn is_invalid_grant(&self) -> bool {
        self.to_string().contains(INVALID_GRANT)
    }
}

/// Successful token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct AppleTokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
}

impl AppleTokenResponse {
    /// The identity token, which the relay cannot work without
    ///
    /// # Errors
    ///
    /// Returns `MissingIdToken` when Apple omitted it
    pub fn id_token(&self) -> Result<&str, ExchangeError> {
        self.id_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(ExchangeError::MissingIdToken)
    }
}

/// Exchanges an authorization code for Apple-issued tokens
#[async_trait]
pub trait CodeExchanger: Send + Sync {
    /// Exchange `code` using the given client credentials
    ///
    /// # Errors
    ///
    /// Returns an error if signing, transport or Apple's validation fails
    async fn exchange_code(
        &self,
        credentials: &AppleCredentials,
        code: &str,
    ) -> Result<AppleTokenResponse, ExchangeError>;
}

/// Production exchanger speaking to Apple over HTTPS
#[derive(Clone)]
pub struct AppleTokenClient {
    http_client: reqwest::Client,
    token_endpoint: String,
}

impl AppleTokenClient {
    #[must_use]
    pub fn new(token_endpoint: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            token_endpoint: token_endpoint.into(),
        }
    }

    /// Form fields of an `authorization_code` grant request
    #[must_use]
    pub fn token_request_params(
        credentials: &AppleCredentials,
        code: &str,
        client_secret: &str,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("client_id", credentials.client_id.clone()),
            ("client_secret", client_secret.to_string()),
        ];
        if let Some(redirect_uri) = &credentials.redirect_uri {
            params.push(("redirect_uri", redirect_uri.clone()));
        }
        params
    }
}

#[async_trait]
impl CodeExchanger for AppleTokenClient {
    async fn exchange_code(
        &self,
        credentials: &AppleCredentials,
        code: &str,
    ) -> Result<AppleTokenResponse, ExchangeError> {
        let client_secret = generate_client_secret(credentials)
            .map_err(|e| ExchangeError::ClientSecret(e.to_string()))?;
        let params = Self::token_request_params(credentials, code, &client_secret);

        LoggingHelper::log_token_exchange_start(&credentials.client_id);
        let response = self
            .http_client
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token_response: AppleTokenResponse = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::InvalidResponse(e.to_string()))?;

        LoggingHelper::log_token_exchange_summary(
            token_response.refresh_token.as_ref(),
            token_response.id_token.as_ref(),
            token_response.token_type.as_deref(),
        );

        Ok(token_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::TestFixtures;

    #[test]
    fn test_invalid_grant_detection() {
        let rejected = ExchangeError::Rejected {
            status: 400,
            body: r#"{"error":"invalid_grant","error_description":"The code has expired or has been revoked."}"#
                .to_string(),
        };
        assert!(rejected.is_invalid_grant());

        let client = ExchangeError::Rejected {
            status: 400,
            body: r#"{"error":"invalid_client"}"#.to_string(),
        };
        assert!(!client.is_invalid_grant());

        assert!(!ExchangeError::Transport("connection refused".to_string()).is_invalid_grant());
        assert!(!ExchangeError::MissingIdToken.is_invalid_grant());
    }

    #[test]
    fn test_token_request_params() {
        let credentials = TestFixtures::apple_credentials("com.example.service");
        let params = AppleTokenClient::token_request_params(&credentials, "abc123", "secret-jwt");

        assert_eq!(
            params,
            vec![
                ("grant_type", "authorization_code".to_string()),
                ("code", "abc123".to_string()),
                ("client_id", "com.example.service".to_string()),
                ("client_secret", "secret-jwt".to_string()),
                ("redirect_uri", "https://relay.example.com/callbacks/sign_in_with_apple".to_string()),
            ]
        );
    }

    #[test]
    fn test_token_request_params_without_redirect_uri() {
        let mut credentials = TestFixtures::apple_credentials("com.example.service");
        credentials.redirect_uri = None;

        let params = AppleTokenClient::token_request_params(&credentials, "abc123", "secret-jwt");
        assert!(params.iter().all(|(name, _)| *name != "redirect_uri"));
    }

    #[test]
    fn test_token_response_requires_id_token() {
        let response: AppleTokenResponse = serde_json::from_str(
            r#"{"access_token":"a","token_type":"Bearer","expires_in":3600,"refresh_token":"r"}"#,
        )
        .unwrap();
        assert!(matches!(response.id_token(), Err(ExchangeError::MissingIdToken)));

        let response: AppleTokenResponse =
            serde_json::from_str(r#"{"id_token":"h.p.s"}"#).unwrap();
        assert_eq!(response.id_token().unwrap(), "h.p.s");
    }

    #[actix_web::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = AppleTokenClient::new("http://127.0.0.1:1/auth/token");
        let credentials = TestFixtures::apple_credentials("com.example.service");

        let err = client.exchange_code(&credentials, "abc123").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Transport(_)));
        assert!(!err.is_invalid_grant());
    }

    #[actix_web::test]
    async fn test_unparseable_key_fails_before_network() {
        let client = AppleTokenClient::new("http://127.0.0.1:1/auth/token");
        let mut credentials = TestFixtures::apple_credentials("com.example.service");
        credentials.private_key_pem = "garbage".to_string();

        let err = client.exchange_code(&credentials, "abc123").await.unwrap_err();
        assert!(matches!(err, ExchangeError::ClientSecret(_)));
    }
}
