//! Sign-out flow: send the user agent to the end-session endpoint.

use super::OidcHandler;
use crate::{
    errors::*,
    notifications::{HookOutcome, RedirectContext, RedirectKind},
    properties::AuthenticationProperties,
    redirect::{build_logout_request, emit_redirect, resolve_redirect_uri},
    transport::HttpExchange,
};
use tracing::{debug, info, warn};

impl OidcHandler {
    /// Redirect the user agent to the end-session endpoint
    ///
    /// `properties.redirect_uri` overrides the configured post-logout URI.
    /// Without provider configuration the redirect targets `""`.
    pub async fn sign_out(
        &self,
        exchange: &mut HttpExchange,
        properties: Option<&AuthenticationProperties>,
    ) -> Result<()> {
        let options = &self.options;

        let configuration = match options.configuration_manager.get_configuration().await {
            Ok(configuration) => Some(configuration),
            Err(e) => {
                warn!(error = %e, "Provider configuration unavailable for sign-out");
                None
            }
        };

        let post_logout_redirect_uri = resolve_redirect_uri(
            properties.and_then(AuthenticationProperties::redirect_uri),
            options.post_logout_redirect_uri.as_deref(),
            None,
        );

        let mut message =
            build_logout_request(configuration.as_deref(), post_logout_redirect_uri.as_deref());

        let mut context = RedirectContext {
            exchange: &mut *exchange,
            message: &mut message,
            kind: RedirectKind::Logout,
        };
        match options
            .notifications
            .redirect_to_identity_provider(&mut context)
            .await?
        {
            HookOutcome::Continue => {}
            HookOutcome::Handled(()) | HookOutcome::Skipped => {
                debug!("End-session redirect taken over by hook");
                return Ok(());
            }
        }

        info!(
            post_logout_redirect_uri = ?post_logout_redirect_uri,
            "Signing out via end-session request"
        );

        emit_redirect(
            exchange,
            &message.create_logout_request_url(),
            options.reject_malformed_redirects,
        )
    }
}
