#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the siwa-relay application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod apple;
pub mod handlers;
pub mod issuance;
pub mod models;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use apple::{AppleTokenClient, CodeExchanger};
pub use handlers::{configure_services, health, sign_in_with_apple, sign_in_with_apple_callback};
pub use issuance::{issuer_from_settings, CredentialIssuer};
pub use settings::RelaySettings;
