//! Redirect builder.
//!
//! Builds the authorization and end-session request messages and hands the
//! resulting URL to the transport.

use crate::{
    configuration::OidcConfiguration,
    constants::parameters,
    errors::*,
    message::ProtocolMessage,
    options::OidcOptions,
    transport::HttpExchange,
};
use tracing::{debug, warn};
use url::Url;

/// First non-blank candidate, in precedence order
///
/// Used as `per-call override > configured default > current request URL`.
pub fn resolve_redirect_uri(
    per_call: Option<&str>,
    configured: Option<&str>,
    current_request: Option<&str>,
) -> Option<String> {
    [per_call, configured, current_request]
        .into_iter()
        .flatten()
        .find(|uri| !uri.trim().is_empty())
        .map(str::to_string)
}

/// Authorization request for a challenge
pub fn build_authentication_request(
    options: &OidcOptions,
    configuration: &OidcConfiguration,
    redirect_uri: Option<&str>,
    state: &str,
    nonce: Option<&str>,
) -> ProtocolMessage {
    let mut message = ProtocolMessage::new(configuration.authorization_endpoint.clone());

    message.set_parameter(parameters::CLIENT_ID, options.client_id.as_str());
    message.set_parameter(parameters::RESPONSE_TYPE, options.response_type.as_str());
    message.set_optional(parameters::RESPONSE_MODE, options.response_mode.as_deref());
    message.set_parameter(parameters::SCOPE, options.scope.as_str());
    message.set_optional(parameters::RESOURCE, options.resource.as_deref());
    message.set_optional(parameters::REDIRECT_URI, redirect_uri);
    message.set_optional(parameters::NONCE, nonce);
    message.set_parameter(parameters::STATE, state);

    message
}

/// End-session request for a sign-out
///
/// Without a configuration snapshot the message is addressed to `""`.
pub fn build_logout_request(
    configuration: Option<&OidcConfiguration>,
    post_logout_redirect_uri: Option<&str>,
) -> ProtocolMessage {
    let end_session_endpoint = configuration
        .and_then(|c| c.end_session_endpoint.clone())
        .unwrap_or_default();

    let mut message = ProtocolMessage::new(end_session_endpoint);
    message.set_optional(parameters::POST_LOGOUT_REDIRECT_URI, post_logout_redirect_uri);
    message
}

/// Check that `location` is a well-formed absolute URL
pub fn validate_redirect_url(location: &str) -> Result<Url> {
    Url::parse(location)
        .map_err(|e| OidcError::MalformedRedirectUrl(format!("{}: {}", location, e)))
}

/// Validate `location` and set it as the response redirect
///
/// A malformed URL is logged and the redirect is still attempted, unless
/// `reject_malformed` is set.
pub fn emit_redirect(
    exchange: &mut HttpExchange,
    location: &str,
    reject_malformed: bool,
) -> Result<()> {
    if let Err(e) = validate_redirect_url(location) {
        if reject_malformed {
            return Err(e);
        }
        warn!(error = %e, "Redirect URL is malformed; redirecting anyway");
    }

    debug!(
        location = %location.split('?').next().unwrap_or_default(),
        "Redirecting to identity provider"
    );
    exchange.response.redirect(location);
    Ok(())
}
