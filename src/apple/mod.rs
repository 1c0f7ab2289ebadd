//! Sign in with Apple integration
//!
//! Everything the relay needs from Apple: the signed client secret, the
//! authorization-code exchange and reading the identity token's claims.

pub mod claims;
pub mod client_secret;
pub mod exchange;

pub use claims::{decode_identity_claims, ClaimsError};
pub use client_secret::generate_client_secret;
pub use exchange::{AppleTokenClient, AppleTokenResponse, CodeExchanger, ExchangeError};

use crate::settings::AppleSettings;

/// Audience of every client secret and issuer of every identity token
pub const APPLE_ISSUER: &str = "https://appleid.apple.com";

/// Delimiter operators use in place of newlines when provisioning `KEY_CONTENTS`
pub const KEY_LINE_DELIMITER: char = '|';

/// Everything needed to authenticate one code exchange against Apple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleCredentials {
    pub client_id: String,
    pub team_id: String,
    pub redirect_uri: Option<String>,
    pub key_id: String,
    pub private_key_pem: String,
}

impl AppleCredentials {
    /// Build credentials for the requested client identity
    ///
    /// Returns `None` when the selected identifier (bundle or service id) is not configured.
    #[must_use]
    pub fn from_settings(apple: &AppleSettings, use_bundle_id: bool) -> Option<Self> {
        let client_id = apple.client_id(use_bundle_id)?;

        Some(Self {
            client_id: client_id.to_string(),
            team_id: apple.team_id.clone(),
            redirect_uri: apple.redirect_uri.clone(),
            key_id: apple.key_id.clone(),
            private_key_pem: restore_private_key_pem(&apple.key_contents),
        })
    }
}

/// Turn a single-line `KEY_CONTENTS` value back into a PEM document
#[must_use]
pub fn restore_private_key_pem(key_contents: &str) -> String {
    key_contents.replace(KEY_LINE_DELIMITER, "\n")
}
