//! Firebase custom token issuance
//!
//! A Firebase custom token is an RS256 JWT signed by a service account. The
//! app exchanges it with Firebase Auth (`signInWithCustomToken`) for a regular
//! Firebase session keyed by the Apple subject.

use super::{CredentialIssuer, IssueError, IssuedCredential};
use crate::models::{AuthenticatedUser, FirebaseTokenResponse};
use crate::settings::IssuerKind;
use crate::utils::crypto::{
    append_jwt_signature, create_jwt_header, jwt_signing_input, load_rs256_signing_key,
    sign_with_rs256_key, JwtAlgorithm,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Audience Firebase Auth expects on custom tokens
pub const FIREBASE_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

/// Longest uid Firebase Auth accepts
pub const MAX_UID_LENGTH: usize = 128;

/// Custom tokens may live at most one hour
pub const CUSTOM_TOKEN_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Error)]
pub enum MintError {
    #[error("uid must be a non-empty string with at most {MAX_UID_LENGTH} characters")]
    InvalidUid,

    #[error("Failed to sign custom token: {0}")]
    Signing(String),
}

/// The fields of a Google service-account JSON file the relay needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Read a service-account JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or lacks the required fields
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&content).context("invalid service account JSON")
    }
}

/// Mints custom tokens for a user id
#[async_trait]
pub trait TokenMinter: Send + Sync {
    /// Create a custom token whose `uid` is `uid`
    ///
    /// # Errors
    ///
    /// Returns an error if the uid is invalid or signing fails
    async fn create_custom_token(&self, uid: &str) -> Result<String, MintError>;
}

/// Signs custom tokens locally with the service account's private key
pub struct ServiceAccountTokenMinter {
    client_email: String,
    signing_key: rsa::pkcs1v15::SigningKey<rsa::sha2::Sha256>,
}

impl ServiceAccountTokenMinter {
    /// # Errors
    ///
    /// Returns an error if the service account's private key is not a PKCS#8 RSA key
    pub fn new(key: ServiceAccountKey) -> anyhow::Result<Self> {
        let signing_key = load_rs256_signing_key(&key.private_key)?;
        if let Some(project_id) = &key.project_id {
            log::info!("Firebase custom tokens will be minted for project {project_id}");
        }

        Ok(Self {
            client_email: key.client_email,
            signing_key,
        })
    }

    /// Claims of a custom token issued at `issued_at` (unix seconds)
    #[must_use]
    pub fn custom_token_claims(&self, uid: &str, issued_at: i64) -> serde_json::Value {
        serde_json::json!({
            "iss": self.client_email,
            "sub": self.client_email,
            "aud": FIREBASE_AUDIENCE,
            "iat": issued_at,
            "exp": issued_at + CUSTOM_TOKEN_TTL_SECONDS,
            "uid": uid
        })
    }
}

#[async_trait]
impl TokenMinter for ServiceAccountTokenMinter {
    async fn create_custom_token(&self, uid: &str) -> Result<String, MintError> {
        if uid.is_empty() || uid.chars().count() > MAX_UID_LENGTH {
            return Err(MintError::InvalidUid);
        }

        let header = create_jwt_header(JwtAlgorithm::RS256, None);
        let claims = self.custom_token_claims(uid, Utc::now().timestamp());
        let message = jwt_signing_input(&header, &claims)
            .map_err(|e| MintError::Signing(e.to_string()))?;

        let signature = sign_with_rs256_key(&self.signing_key, message.as_bytes());
        Ok(append_jwt_signature(&message, &signature))
    }
}

/// Issues `{ "firebaseToken": ... }` for the Apple subject
pub struct FirebaseIssuer {
    minter: Arc<dyn TokenMinter>,
}

impl FirebaseIssuer {
    #[must_use]
    pub fn new(minter: Arc<dyn TokenMinter>) -> Self {
        Self { minter }
    }
}

#[async_trait]
impl CredentialIssuer for FirebaseIssuer {
    fn kind(&self) -> IssuerKind {
        IssuerKind::Firebase
    }

    async fn issue(&self, user: &AuthenticatedUser) -> Result<IssuedCredential, IssueError> {
        let firebase_token = self.minter.create_custom_token(&user.id).await?;
        Ok(IssuedCredential::Firebase(FirebaseTokenResponse { firebase_token }))
    }
}
