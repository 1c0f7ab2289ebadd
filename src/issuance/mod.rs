//! Credential issuance
//!
//! After Apple vouches for a user, the relay hands the caller a credential.
//! Which one is a deployment choice: a placeholder session identifier
//! ([`SessionIssuer`]) or a Firebase custom token ([`FirebaseIssuer`]).

pub mod firebase;
pub mod session;

pub use firebase::{
    FirebaseIssuer, MintError, ServiceAccountKey, ServiceAccountTokenMinter, TokenMinter,
};
pub use session::SessionIssuer;

use crate::models::{AuthenticatedUser, FirebaseTokenResponse, SessionResponse};
use crate::settings::{IssuerKind, RelaySettings};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("Custom token minting failed: {0}")]
    Mint(#[from] MintError),

    #[error("Failed to load service account from {path}: {message}")]
    ServiceAccount { path: String, message: String },
}

/// Response body produced by an issuer
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum IssuedCredential {
    Session(SessionResponse),
    Firebase(FirebaseTokenResponse),
}

/// Turns an authenticated Apple user into the credential returned to the caller
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// Short name used in startup logs
    fn kind(&self) -> IssuerKind;

    /// Issue a credential for `user`
    ///
    /// # Errors
    ///
    /// Returns an error if an external mint fails
    async fn issue(&self, user: &AuthenticatedUser) -> Result<IssuedCredential, IssueError>;
}

/// Build the issuer selected by configuration
///
/// The Firebase issuer loads its service account here, so a missing or broken
/// credential file stops startup instead of failing every request.
///
/// # Errors
///
/// Returns an error if the Firebase service account cannot be loaded
pub fn issuer_from_settings(
    settings: &RelaySettings,
) -> Result<Arc<dyn CredentialIssuer>, IssueError> {
    match settings.issuance.kind {
        IssuerKind::Session => Ok(Arc::new(SessionIssuer)),
        IssuerKind::Firebase => {
            let path = Path::new(&settings.issuance.service_account_path);
            let key = ServiceAccountKey::from_file(path).map_err(|e| IssueError::ServiceAccount {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            let minter =
                ServiceAccountTokenMinter::new(key).map_err(|e| IssueError::ServiceAccount {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            Ok(Arc::new(FirebaseIssuer::new(Arc::new(minter))))
        }
    }
}
