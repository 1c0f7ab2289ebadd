// Placeholder session issuance
use super::{CredentialIssuer, IssueError, IssuedCredential};
use crate::models::{AuthenticatedUser, SessionResponse};
use crate::settings::IssuerKind;
use async_trait::async_trait;
use chrono::Utc;

/// Number of trailing subject characters carried in a session identifier
pub const SESSION_SUFFIX_CHARS: usize = 8;

/// Hands back a fabricated session identifier and the user's basic profile
///
/// Nothing is stored; this is the place to create a real session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionIssuer;

impl SessionIssuer {
    /// `session_<unix millis>_<last 8 characters of the subject>`
    #[must_use]
    pub fn session_id(timestamp_millis: i64, subject: &str) -> String {
        format!("session_{timestamp_millis}_{}", subject_suffix(subject))
    }
}

/// Last [`SESSION_SUFFIX_CHARS`] characters, or the whole subject when shorter
fn subject_suffix(subject: &str) -> &str {
    let char_count = subject.chars().count();
    if char_count <= SESSION_SUFFIX_CHARS {
        return subject;
    }
    subject
        .char_indices()
        .nth(char_count - SESSION_SUFFIX_CHARS)
        .map_or(subject, |(idx, _)| &subject[idx..])
}

#[async_trait]
impl CredentialIssuer for SessionIssuer {
    fn kind(&self) -> IssuerKind {
        IssuerKind::Session
    }

    async fn issue(&self, user: &AuthenticatedUser) -> Result<IssuedCredential, IssueError> {
        let session_id = Self::session_id(Utc::now().timestamp_millis(), &user.id);

        Ok(IssuedCredential::Session(SessionResponse {
            success: true,
            session_id,
            user: user.clone(),
        }))
    }
}
