// Request and response shapes for the relay's HTTP surface
use serde::{Deserialize, Serialize};

/// Query parameters of `POST /sign_in_with_apple`
///
/// Apple only sends the user's name on the very first authorization, and only to the
/// client, so the app forwards `firstName`/`lastName` itself.
#[derive(Debug, Clone, Default)]
pub struct SignInQuery {
    pub code: Option<String>,
    pub use_bundle_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl SignInQuery {
    /// Build from raw query pairs; the first occurrence of a repeated key wins
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "code" => &mut query.code,
                "useBundleId" => &mut query.use_bundle_id,
                "firstName" => &mut query.first_name,
                "lastName" => &mut query.last_name,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }

    /// The authorization code, treating an empty value as absent
    #[must_use]
    pub fn authorization_code(&self) -> Option<&str> {
        self.code.as_deref().filter(|code| !code.is_empty())
    }

    /// Only the literal string `"true"` selects the bundle identifier
    #[must_use]
    pub fn uses_bundle_id(&self) -> bool {
        self.use_bundle_id.as_deref() == Some("true")
    }

    /// `"<first> <last>"` when both parts are present and non-empty
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                Some(format!("{first} {last}"))
            }
            _ => None,
        }
    }
}

/// Claims read from Apple's identity token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub sub: String,
    pub email: Option<String>,
}

/// Basic profile returned with a fabricated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: Option<String>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn new(claims: IdentityClaims, name: Option<String>) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name,
        }
    }
}

/// Session-style response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub user: AuthenticatedUser,
}

/// Firebase-style response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseTokenResponse {
    #[serde(rename = "firebaseToken")]
    pub firebase_token: String,
}

/// Error body shared by every failing route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
