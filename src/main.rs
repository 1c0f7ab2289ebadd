#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use siwa_relay::{
    apple::{AppleTokenClient, CodeExchanger},
    configure_services,
    issuance::{issuer_from_settings, CredentialIssuer},
    settings::{RelaySettings, SettingsError},
    utils::logging::LoggingHelper,
    VERSION,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = RelaySettings::load().map_err(|e| {
        report_settings_error(&e);
        std::io::Error::other(format!("Failed to load settings: {e}"))
    })?;

    let issuer = issuer_from_settings(&settings).map_err(|e| {
        eprintln!("❌ {e}");
        std::io::Error::other(format!("Failed to initialize credential issuer: {e}"))
    })?;
    LoggingHelper::log_issuer_configured(issuer.kind());

    let exchanger: Arc<dyn CodeExchanger> =
        Arc::new(AppleTokenClient::new(settings.apple.token_endpoint.clone()));

    start_server(settings, exchanger, issuer).await
}

fn report_settings_error(error: &SettingsError) {
    match error {
        SettingsError::MissingVariables(missing) => {
            eprintln!("❌ Missing required environment variables:");
            for name in missing {
                eprintln!("   - {name}");
            }
        }
        other => eprintln!("❌ {other}"),
    }
}

/// Start the relay
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    settings: RelaySettings,
    exchanger: Arc<dyn CodeExchanger>,
    issuer: Arc<dyn CredentialIssuer>,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let settings = web::Data::new(settings);
    let exchanger = web::Data::from(exchanger);
    let issuer = web::Data::from(issuer);

    HttpServer::new(move || {
        App::new()
            .app_data(settings.clone())
            .app_data(exchanger.clone())
            .app_data(issuer.clone())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &RelaySettings) {
    println!("Starting Sign in with Apple relay v{VERSION} on http://{bind_address}");
    println!("Credential issuer: {}", settings.issuance.kind);
    println!("Apple token endpoint: {}", settings.apple.token_endpoint);
    println!("Log filter: {}", settings.logging.level);
    println!();
    println!("Endpoints:");
    println!("  POST /callbacks/sign_in_with_apple - Relay Apple's form_post to the Android app");
    println!("  POST /sign_in_with_apple           - Exchange an authorization code");
    println!("  GET  /health                       - Health check");
    println!();
    println!("Android package: {}", settings.android.package_identifier);
    match settings.apple.redirect_uri.as_deref() {
        Some(uri) => println!("Redirect URI sent to Apple: {uri}"),
        None => println!("Redirect URI sent to Apple: (none)"),
    }
    if settings.application.log_redirect_targets {
        println!("⚠️  LOG_REDIRECT_TARGETS is on: redirect targets (including tokens) are logged");
    }
}
