//! Callback flow: turn the provider's response into a ticket.
//!
//! ```text
//! Idle -> MessageReceived -> StatePropertiesResolved -> [TokenValidated] -> [CodeReceived]
//!      -> Ticketed | Aborted | Failed
//! ```
//!
//! Requests that are not callbacks never leave `Idle`. A missing or
//! undecodable `state` aborts quietly. Every error raised after the message is
//! parsed is caught once, offered to the authentication-failed hook and
//! otherwise returned to the caller.

use super::OidcHandler;
use crate::{
    constants::property_keys,
    errors::*,
    message::ProtocolMessage,
    notifications::{
        AuthenticationFailedContext, AuthorizationCodeReceivedContext, CallbackStage, HookOutcome,
        MessageReceivedContext,
    },
    pipeline::{PipelineOutcome, TokenValidationPipeline},
    properties::AuthenticationProperties,
    ticket::{AuthenticationResult, AuthenticationTicket},
    tokens::{JwtToken, SecurityToken},
    transport::{HttpExchange, HttpRequest},
};
use tracing::{debug, error, info, warn};
use zero_oidc_crypto::fingerprint_for_log;

/// Progress of one callback, kept for failure reporting
struct CallbackState {
    message: ProtocolMessage,
    stage: CallbackStage,
    properties: Option<AuthenticationProperties>,
}

impl OidcHandler {
    /// Whether `request` is addressed to the callback endpoint
    pub fn is_callback_request(&self, request: &HttpRequest) -> bool {
        if let Some(callback_path) = self.options.callback_path.as_deref() {
            let path = format!("{}{}", request.path_base, request.path);
            if path != callback_path {
                return false;
            }
        }
        request.is_form_post()
    }

    /// Process a callback request
    ///
    /// Returns [`AuthenticationResult::NoResult`] for requests that are not
    /// callbacks, when `state` is missing or invalid, or when a hook skips.
    pub async fn authenticate(&self, exchange: &mut HttpExchange) -> Result<AuthenticationResult> {
        if !self.is_callback_request(&exchange.request) {
            return Ok(AuthenticationResult::NoResult);
        }

        let mut state = CallbackState {
            message: ProtocolMessage::from_form(&exchange.request.body),
            stage: CallbackStage::MessageReceived,
            properties: None,
        };

        match self.process_callback(exchange, &mut state).await {
            Ok(result) => Ok(result),
            Err(e) => self.handle_failure(exchange, &state, e).await,
        }
    }

    async fn process_callback(
        &self,
        exchange: &mut HttpExchange,
        state: &mut CallbackState,
    ) -> Result<AuthenticationResult> {
        let options = &self.options;

        let mut received = MessageReceivedContext {
            exchange: &mut *exchange,
            message: &mut state.message,
        };
        match options.notifications.message_received(&mut received).await? {
            HookOutcome::Continue => {}
            HookOutcome::Handled(ticket) => return Ok(AuthenticationResult::ticket(ticket)),
            HookOutcome::Skipped => return Ok(AuthenticationResult::NoResult),
        }

        let message = &state.message;
        let Some(raw_state) = message.state() else {
            info!("Callback carries no state; ignoring");
            return Ok(AuthenticationResult::NoResult);
        };
        let Some(properties) = options.state_codec.decode(raw_state) else {
            warn!(
                state_hash = %fingerprint_for_log(raw_state),
                "Callback state could not be decoded; ignoring"
            );
            return Ok(AuthenticationResult::NoResult);
        };
        state.properties = Some(properties.clone());
        state.stage = CallbackStage::StatePropertiesResolved;

        if let Some(error) = message.error() {
            return Err(OidcError::ProtocolError {
                error: error.to_string(),
                error_description: message.error_description().map(str::to_string),
                error_uri: message.error_uri().map(str::to_string),
            });
        }

        let configuration = options.configuration_manager.get_configuration().await?;

        let mut ticket: Option<AuthenticationTicket> = None;
        let mut jwt: Option<JwtToken> = None;

        if let Some(id_token) = message.id_token() {
            state.stage = CallbackStage::TokenReceived;
            let pipeline = TokenValidationPipeline::new(options);
            match pipeline
                .run(exchange, message, &properties, Some(&configuration), id_token)
                .await?
            {
                PipelineOutcome::Validated {
                    ticket: validated,
                    jwt: token,
                } => {
                    ticket = Some(*validated);
                    jwt = Some(*token);
                    state.stage = CallbackStage::TokenValidated;
                }
                PipelineOutcome::Finished(result) => return Ok(result),
            }
        }

        if let Some(code) = message.code() {
            state.stage = CallbackStage::CodeReceived;
            let mut ticket =
                ticket.unwrap_or_else(|| AuthenticationTicket::new(None, properties.clone()));
            let redirect_uri = properties
                .get(property_keys::CODE_REDIRECT_URI)
                .map(str::to_string);

            ticket.authorization_code = Some(code.to_string());
            ticket.validated_token = jwt.clone().map(|j| SecurityToken::Jwt(Box::new(j)));
            ticket.code_redirect_uri = redirect_uri.clone();

            let mut context = AuthorizationCodeReceivedContext {
                exchange: &mut *exchange,
                message,
                ticket: &mut ticket,
                code,
                redirect_uri: redirect_uri.as_deref(),
                jwt: jwt.as_ref(),
            };
            match options
                .notifications
                .authorization_code_received(&mut context)
                .await?
            {
                HookOutcome::Continue => {}
                HookOutcome::Handled(ticket) => return Ok(AuthenticationResult::ticket(ticket)),
                HookOutcome::Skipped => return Ok(AuthenticationResult::NoResult),
            }

            debug!(code_hash = %fingerprint_for_log(code), "Authorization code attached to ticket");
            return Ok(AuthenticationResult::ticket(ticket));
        }

        Ok(match ticket {
            Some(ticket) => AuthenticationResult::ticket(ticket),
            None => AuthenticationResult::NoResult,
        })
    }

    async fn handle_failure(
        &self,
        exchange: &mut HttpExchange,
        state: &CallbackState,
        failure: OidcError,
    ) -> Result<AuthenticationResult> {
        let options = &self.options;
        error!(stage = ?state.stage, error = %failure, "Callback processing failed");

        if options.refresh_on_issuer_key_not_found && failure.is_signature_key_not_found() {
            info!("Signing key not found; requesting configuration refresh");
            options.configuration_manager.request_refresh();
        }

        let mut context = AuthenticationFailedContext {
            exchange,
            message: &state.message,
            properties: state.properties.as_ref(),
            stage: state.stage,
            error: &failure,
        };
        match options
            .notifications
            .authentication_failed(&mut context)
            .await?
        {
            HookOutcome::Continue => Err(failure),
            HookOutcome::Handled(ticket) => Ok(AuthenticationResult::ticket(ticket)),
            HookOutcome::Skipped => Ok(AuthenticationResult::NoResult),
        }
    }
}
