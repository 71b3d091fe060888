//! Challenge flow: send the user agent to the identity provider.

use super::OidcHandler;
use crate::{
    constants::property_keys,
    errors::*,
    notifications::{HookOutcome, RedirectContext, RedirectKind},
    properties::AuthenticationProperties,
    redirect::{build_authentication_request, emit_redirect, resolve_redirect_uri},
    transport::HttpExchange,
};
use tracing::{debug, info};
use zero_oidc_crypto::fingerprint_for_log;

/// Per-call challenge inputs
#[derive(Debug, Clone, Default)]
pub struct Challenge {
    /// Properties to round-trip through `state`
    pub properties: AuthenticationProperties,
    /// `redirect_uri` override for this request only
    pub redirect_uri: Option<String>,
}

impl Challenge {
    /// Challenge that returns the user to `redirect_uri` after login
    pub fn returning_to(redirect_uri: impl Into<String>) -> Self {
        Self {
            properties: AuthenticationProperties::with_redirect_uri(redirect_uri),
            redirect_uri: None,
        }
    }
}

impl OidcHandler {
    /// Redirect the user agent to the authorization endpoint
    ///
    /// On return the exchange response holds the redirect, unless the
    /// redirect hook handled or skipped it.
    pub async fn challenge(&self, exchange: &mut HttpExchange, challenge: Challenge) -> Result<()> {
        let options = &self.options;
        let current_uri = exchange.request.current_uri();

        let mut properties = challenge.properties;
        if properties.redirect_uri().is_none() {
            properties.set_redirect_uri(current_uri.clone());
        }

        let configuration = options.configuration_manager.get_configuration().await?;

        let fallback = options
            .use_current_uri_as_redirect
            .then_some(current_uri.as_str());
        let redirect_uri = resolve_redirect_uri(
            challenge.redirect_uri.as_deref(),
            options.redirect_uri.as_deref(),
            fallback,
        );

        if options.requests_code() {
            if let Some(redirect_uri) = redirect_uri.as_deref() {
                properties.insert(property_keys::CODE_REDIRECT_URI, redirect_uri);
            }
        }

        let nonce = if options.protocol_validator.require_nonce() {
            let nonce = options.protocol_validator.generate_nonce();
            options.nonce_store.remember(&nonce, exchange).await?;
            Some(nonce)
        } else {
            None
        };

        let state = options.state_codec.to_state_parameter(&properties)?;
        let mut message = build_authentication_request(
            options,
            &configuration,
            redirect_uri.as_deref(),
            &state,
            nonce.as_deref(),
        );

        let mut context = RedirectContext {
            exchange: &mut *exchange,
            message: &mut message,
            kind: RedirectKind::Authentication,
        };
        match options
            .notifications
            .redirect_to_identity_provider(&mut context)
            .await?
        {
            HookOutcome::Continue => {}
            HookOutcome::Handled(()) => {
                debug!("Authorization redirect handled by hook");
                return Ok(());
            }
            HookOutcome::Skipped => {
                debug!("Authorization redirect skipped by hook");
                return Ok(());
            }
        }

        info!(
            client_id = %options.client_id,
            redirect_uri = ?redirect_uri,
            nonce_hash = ?nonce.as_deref().map(fingerprint_for_log),
            "Challenging with authorization request"
        );

        emit_redirect(
            exchange,
            &message.create_authentication_request_url(),
            options.reject_malformed_redirects,
        )
    }
}
