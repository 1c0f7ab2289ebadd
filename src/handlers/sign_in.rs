// Authorization code exchange handler
use crate::apple::{decode_identity_claims, AppleCredentials, ClaimsError, CodeExchanger, ExchangeError};
use crate::issuance::{CredentialIssuer, IssueError};
use crate::models::{AuthenticatedUser, SignInQuery};
use crate::settings::RelaySettings;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::{messages, ResponseBuilder};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use thiserror::Error;

/// Everything that can stop a sign-in
///
/// Only the missing code and an expired code are surfaced to the caller; the
/// rest collapse into a generic 500 and are logged here.
#[derive(Debug, Error)]
pub enum SignInError {
    #[error("authorization code missing")]
    MissingCode,

    #[error("no {variable} configured")]
    MissingClientIdentifier { variable: &'static str },

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Claims(#[from] ClaimsError),

    #[error(transparent)]
    Issue(#[from] IssueError),
}

impl SignInError {
    fn is_code_expired(&self) -> bool {
        matches!(self, Self::Exchange(e) if e.is_invalid_grant())
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing code",
            Self::MissingClientIdentifier { .. } => "configuration",
            Self::Exchange(_) => "code exchange",
            Self::Claims(_) => "identity token",
            Self::Issue(_) => "credential issuance",
        }
    }
}

impl ResponseError for SignInError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCode => StatusCode::BAD_REQUEST,
            _ if self.is_code_expired() => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self.status_code() {
            StatusCode::BAD_REQUEST => {
                ResponseBuilder::bad_request(messages::AUTHORIZATION_CODE_REQUIRED)
            }
            StatusCode::UNAUTHORIZED => {
                LoggingHelper::log_sign_in_failure(self.reason(), &self.to_string());
                ResponseBuilder::unauthorized(messages::AUTHORIZATION_CODE_EXPIRED)
            }
            _ => {
                LoggingHelper::log_sign_in_failure(self.reason(), &self.to_string());
                ResponseBuilder::internal_server_error(messages::AUTHENTICATION_FAILED)
            }
        }
    }
}

/// `POST /sign_in_with_apple?code=...&useBundleId=...&firstName=...&lastName=...`
///
/// Exchanges the code with Apple, reads the subject from the identity token and
/// returns whatever credential the configured issuer produces.
///
/// # Errors
///
/// Returns a `SignInError`, rendered as 400, 401 or 500
pub async fn sign_in_with_apple(
    query: web::Query<Vec<(String, String)>>,
    settings: web::Data<RelaySettings>,
    exchanger: web::Data<dyn CodeExchanger>,
    issuer: web::Data<dyn CredentialIssuer>,
) -> Result<HttpResponse, SignInError> {
    let query = SignInQuery::from_pairs(query.into_inner());
    let code = query.authorization_code().ok_or(SignInError::MissingCode)?;

    let use_bundle_id = query.uses_bundle_id();
    LoggingHelper::log_sign_in_started(use_bundle_id);

    let credentials = AppleCredentials::from_settings(&settings.apple, use_bundle_id)
        .ok_or(SignInError::MissingClientIdentifier {
            variable: if use_bundle_id { "BUNDLE_ID" } else { "SERVICE_ID" },
        })?;

    let tokens = exchanger.exchange_code(&credentials, code).await?;
    let claims = decode_identity_claims(tokens.id_token()?)?;
    LoggingHelper::log_user_authenticated(&claims.sub, claims.email.is_some());

    let user = AuthenticatedUser::new(claims, query.display_name());
    let credential = issuer.issue(&user).await?;

    Ok(HttpResponse::Ok().json(credential))
}
