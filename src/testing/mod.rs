//! Testing utilities for the relay
//!
//! Available to unit tests and, behind the `testing` feature, to the integration
//! tests in `tests/`.
//!
//! - [`fixtures`] - Pre-built settings, credentials, keys and tokens
//! - [`mock`] - In-memory stand-ins for Apple's token endpoint and the Firebase mint
//!
//! ```rust,ignore
//! use siwa_relay::testing::{fixtures::TestFixtures, mock::MockCodeExchanger, relay_app};
//!
//! let exchanger = Arc::new(MockCodeExchanger::returning_identity("u1", Some("a@b.com")));
//! let app = test::init_service(relay_app(
//!     TestFixtures::relay_settings(),
//!     exchanger.clone(),
//!     Arc::new(SessionIssuer),
//! ))
//! .await;
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;

use crate::apple::CodeExchanger;
use crate::handlers::configure_services;
use crate::issuance::CredentialIssuer;
use crate::settings::RelaySettings;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use std::sync::Arc;

/// Common test constants
pub mod constants {
    pub const TEST_PACKAGE_IDENTIFIER: &str = "com.example.app";
    pub const TEST_TEAM_ID: &str = "TEAM123456";
    pub const TEST_KEY_ID: &str = "KEY7890";
    pub const TEST_SERVICE_ID: &str = "com.example.service";
    pub const TEST_BUNDLE_ID: &str = "com.example.app";
    pub const TEST_REDIRECT_URI: &str = "https://relay.example.com/callbacks/sign_in_with_apple";
    pub const TEST_CLIENT_EMAIL: &str = "relay@test-project.iam.gserviceaccount.com";
}

/// The relay's routes wired to the given collaborators, as `main` wires them
pub fn relay_app(
    settings: RelaySettings,
    exchanger: Arc<dyn CodeExchanger>,
    issuer: Arc<dyn CredentialIssuer>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(settings))
        .app_data(web::Data::from(exchanger))
        .app_data(web::Data::from(issuer))
        .configure(configure_services)
}
