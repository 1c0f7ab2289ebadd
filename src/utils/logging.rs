// Centralized logging helpers for the relay's request paths
use crate::settings::IssuerKind;
use log::{debug, error, info};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log a relayed callback; the target can carry Apple's identity token
    pub fn log_redirect_relayed(package: &str, param_count: usize, target: &str, log_target: bool) {
        if log_target {
            info!("↪️  Relaying Apple callback to {target}");
        } else {
            debug!("↪️  Relaying Apple callback to {package} with {param_count} parameters");
        }
    }

    /// Log sign-in start
    pub fn log_sign_in_started(use_bundle_id: bool) {
        let client = if use_bundle_id { "bundle id" } else { "service id" };
        info!("🍎 Sign in with Apple requested (client: {client})");
    }

    /// Log token exchange start
    pub fn log_token_exchange_start(client_id: &str) {
        info!("🔄 Exchanging authorization code for tokens with Apple (client_id: {client_id})");
    }

    /// Log token exchange summary
    pub fn log_token_exchange_summary(
        refresh_token: Option<&String>,
        id_token: Option<&String>,
        token_type: Option<&str>,
    ) {
        info!(
            "🔍 Token exchange summary: refresh_token={}, id_token={}, token_type={:?}",
            refresh_token.map_or("missing", |_| "present"),
            id_token.map_or("missing", |_| "present"),
            token_type
        );
    }

    /// Log a successfully authenticated Apple user
    pub fn log_user_authenticated(subject: &str, email_present: bool) {
        info!("✅ Apple user authenticated: {subject}");
        debug!("Identity token email present: {email_present}");
    }

    /// Log a sign-in failure with the cause that is hidden from the caller
    pub fn log_sign_in_failure(reason: &str, cause: &str) {
        error!("❌ Sign in with Apple failed ({reason}): {cause}");
    }

    /// Log which credential issuer is active
    pub fn log_issuer_configured(kind: IssuerKind) {
        info!("🎫 Credential issuer configured: {kind}");
    }
}
