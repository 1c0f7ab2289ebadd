//! Mock objects and fake implementations for testing
//!
//! Both mocks record what they were asked so tests can assert on outbound calls
//! without a network.

use crate::apple::{AppleCredentials, AppleTokenResponse, CodeExchanger, ExchangeError};
use crate::issuance::{MintError, TokenMinter};
use async_trait::async_trait;
use std::sync::Mutex;

use super::fixtures::TestFixtures;

/// What a [`MockCodeExchanger`] answers with
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// Success carrying this `id_token`
    IdToken(String),
    /// Success without an `id_token`
    NoIdToken,
    /// Non-2xx from Apple
    Rejected { status: u16, body: String },
    /// Connection-level failure
    Transport(String),
}

/// A recorded `exchange_code` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeCall {
    pub client_id: String,
    pub code: String,
}

/// Stand-in for Apple's token endpoint
pub struct MockCodeExchanger {
    outcome: ExchangeOutcome,
    calls: Mutex<Vec<ExchangeCall>>,
}

impl MockCodeExchanger {
    #[must_use]
    pub fn new(outcome: ExchangeOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds with an identity token for `sub`
    #[must_use]
    pub fn returning_identity(sub: &str, email: Option<&str>) -> Self {
        Self::new(ExchangeOutcome::IdToken(TestFixtures::identity_token(sub, email)))
    }

    /// Fails the way Apple does for an expired or reused code
    #[must_use]
    pub fn invalid_grant() -> Self {
        Self::new(ExchangeOutcome::Rejected {
            status: 400,
            body: r#"{"error":"invalid_grant","error_description":"The code has expired or has been revoked."}"#
                .to_string(),
        })
    }

    /// Every recorded call, oldest first
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<ExchangeCall> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl CodeExchanger for MockCodeExchanger {
    async fn exchange_code(
        &self,
        credentials: &AppleCredentials,
        code: &str,
    ) -> Result<AppleTokenResponse, ExchangeError> {
        self.calls.lock().unwrap().push(ExchangeCall {
            client_id: credentials.client_id.clone(),
            code: code.to_string(),
        });

        let token_response = |id_token: Option<String>| AppleTokenResponse {
            access_token: Some("access-token".to_string()),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3600),
            refresh_token: Some("refresh-token".to_string()),
            id_token,
        };

        match &self.outcome {
            ExchangeOutcome::IdToken(token) => Ok(token_response(Some(token.clone()))),
            ExchangeOutcome::NoIdToken => Ok(token_response(None)),
            ExchangeOutcome::Rejected { status, body } => Err(ExchangeError::Rejected {
                status: *status,
                body: body.clone(),
            }),
            ExchangeOutcome::Transport(message) => Err(ExchangeError::Transport(message.clone())),
        }
    }
}

/// Stand-in for the Firebase custom-token mint
pub struct MockTokenMinter {
    result: Result<String, String>,
    minted: Mutex<Vec<String>>,
}

impl MockTokenMinter {
    #[must_use]
    pub fn succeeding(token: &str) -> Self {
        Self {
            result: Ok(token.to_string()),
            minted: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            minted: Mutex::new(Vec::new()),
        }
    }

    /// Uids passed to `create_custom_token`, oldest first
    ///
    /// # Panics
    ///
    /// Panics if the log mutex is poisoned.
    #[must_use]
    pub fn minted_uids(&self) -> Vec<String> {
        self.minted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenMinter for MockTokenMinter {
    async fn create_custom_token(&self, uid: &str) -> Result<String, MintError> {
        self.minted.lock().unwrap().push(uid.to_string());
        self.result.clone().map_err(MintError::Signing)
    }
}
