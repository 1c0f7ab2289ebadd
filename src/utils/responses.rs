//! HTTP response helpers
//!
//! Every failing route answers with the same `{"error": "<message>"}` body, and the
//! relay's only redirect is a 307 so the client repeats the request unchanged.

use crate::models::ErrorResponse;
use actix_web::{http::header, http::StatusCode, HttpResponse};

/// Stable messages returned to callers
pub mod messages {
    pub const AUTHORIZATION_CODE_REQUIRED: &str = "Authorization code required";
    pub const AUTHORIZATION_CODE_EXPIRED: &str = "Authorization code expired";
    pub const AUTHENTICATION_FAILED: &str = "Authentication failed";
}

/// Unified response builder for the relay's routes
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// `{"error": message}` with the given status
    #[must_use]
    pub fn error(status: StatusCode, message: &str) -> HttpResponse {
        HttpResponse::build(status).json(ErrorResponse {
            error: message.to_string(),
        })
    }

    /// Create a `BadRequest` (400) error response
    #[must_use]
    pub fn bad_request(message: &str) -> HttpResponse {
        Self::error(StatusCode::BAD_REQUEST, message)
    }

    /// Create an `Unauthorized` (401) error response
    #[must_use]
    pub fn unauthorized(message: &str) -> HttpResponse {
        Self::error(StatusCode::UNAUTHORIZED, message)
    }

    /// Create an `InternalServerError` (500) error response
    #[must_use]
    pub fn internal_server_error(message: &str) -> HttpResponse {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Create a `TemporaryRedirect` (307) response
    #[must_use]
    pub fn temporary_redirect(location: &str) -> HttpResponse {
        HttpResponse::TemporaryRedirect()
            .insert_header((header::LOCATION, location.to_string()))
            .finish()
    }
}
