// Apple form_post callback relay
use crate::settings::RelaySettings;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use actix_web::{web, HttpResponse, Result};

/// Build the Android intent URI carrying the callback's fields
///
/// Pairs keep their order (duplicates included) and are form-urlencoded, so a
/// space becomes `+`.
#[must_use]
pub fn build_redirect_target(package_identifier: &str, params: &[(String, String)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();

    format!(
        "intent://callback?{query}#Intent;package={package_identifier};scheme=signinwithapple;end"
    )
}

/// `POST /callbacks/sign_in_with_apple`
///
/// Apple posts the authorization result here; Android clients cannot receive a
/// form POST, so the fields are bounced to the app's intent filter.
///
/// # Errors
///
/// Never fails once the form body has been parsed
pub async fn sign_in_with_apple_callback(
    form: web::Form<Vec<(String, String)>>,
    settings: web::Data<RelaySettings>,
) -> Result<HttpResponse> {
    let params = form.into_inner();
    let package = &settings.android.package_identifier;
    let target = build_redirect_target(package, &params);

    LoggingHelper::log_redirect_relayed(
        package,
        params.len(),
        &target,
        settings.application.log_redirect_targets,
    );

    Ok(ResponseBuilder::temporary_redirect(&target))
}
