// HTTP request handlers for the Sign in with Apple relay
pub mod callback;
pub mod health;
pub mod sign_in;

// Re-export the main handler functions
pub use callback::{build_redirect_target, sign_in_with_apple_callback};
pub use health::health;
pub use sign_in::{sign_in_with_apple, SignInError};

use actix_web::web;

/// Register the relay's routes
///
/// Handlers expect `RelaySettings`, `dyn CodeExchanger` and `dyn CredentialIssuer`
/// as app data.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/callbacks/sign_in_with_apple",
        web::post().to(sign_in_with_apple_callback),
    )
    .route("/sign_in_with_apple", web::post().to(sign_in_with_apple))
    .route("/health", web::get().to(health));
}
