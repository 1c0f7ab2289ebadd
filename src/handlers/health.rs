use crate::models::HealthResponse;
use actix_web::{HttpResponse, Result};
use chrono::{SecondsFormat, Utc};

/// Health check endpoint
///
/// # Errors
/// Never fails; the signature matches the other handlers
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    Ok(HttpResponse::Ok().json(response))
}
