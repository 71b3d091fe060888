//! Token validation pipeline.
//!
//! Runs when the callback message carries an id token:
//!
//! 1. token-received hook
//! 2. per-request validation parameters with provider metadata merged in
//! 3. first validator that can read the token validates it
//! 4. the result must be a JWT
//! 5. ticket with session metadata
//! 6. optional lifetime copy from the token
//! 7. token-validated hook
//! 8. nonce lookup and consumption
//! 9. protocol-level checks

use crate::{
    configuration::OidcConfiguration,
    constants::property_keys,
    errors::*,
    message::ProtocolMessage,
    notifications::{HookOutcome, SecurityTokenReceivedContext, SecurityTokenValidatedContext},
    options::OidcOptions,
    properties::AuthenticationProperties,
    ticket::{AuthenticationResult, AuthenticationTicket, ClaimsPrincipal},
    tokens::{JwtToken, ProtocolValidationContext, SecurityToken, TokenValidationParameters},
    transport::HttpExchange,
};
use tracing::{debug, info, warn};
use zero_oidc_crypto::fingerprint_for_log;

/// Result of running the pipeline
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Token validated; the flow continues with this ticket
    Validated {
        /// Ticket built from the token
        ticket: Box<AuthenticationTicket>,
        /// The validated token
        jwt: Box<JwtToken>,
    },
    /// A hook ended the flow
    Finished(AuthenticationResult),
}

/// Id token validation steps, bound to one set of options
pub struct TokenValidationPipeline<'a> {
    options: &'a OidcOptions,
}

impl<'a> TokenValidationPipeline<'a> {
    /// Create a pipeline over `options`
    pub fn new(options: &'a OidcOptions) -> Self {
        Self { options }
    }

    /// Validate `id_token` and build a ticket from it
    pub async fn run(
        &self,
        exchange: &mut HttpExchange,
        message: &ProtocolMessage,
        properties: &AuthenticationProperties,
        configuration: Option<&OidcConfiguration>,
        id_token: &str,
    ) -> Result<PipelineOutcome> {
        let options = self.options;

        let mut received = SecurityTokenReceivedContext {
            exchange: &mut *exchange,
            message,
            id_token,
        };
        match options.notifications.security_token_received(&mut received).await? {
            HookOutcome::Continue => {}
            HookOutcome::Handled(ticket) => {
                return Ok(PipelineOutcome::Finished(AuthenticationResult::ticket(ticket)))
            }
            HookOutcome::Skipped => return Ok(PipelineOutcome::Finished(AuthenticationResult::NoResult)),
        }

        let parameters = options.token_validation_parameters.for_request(configuration);
        let (principal, jwt) = self.validate_token(id_token, &parameters)?;

        let mut ticket = self.build_ticket(principal, properties, message, configuration, &jwt);

        let mut validated = SecurityTokenValidatedContext {
            exchange: &mut *exchange,
            message,
            ticket: &mut ticket,
        };
        match options.notifications.security_token_validated(&mut validated).await? {
            HookOutcome::Continue => {}
            HookOutcome::Handled(ticket) => {
                return Ok(PipelineOutcome::Finished(AuthenticationResult::ticket(ticket)))
            }
            HookOutcome::Skipped => return Ok(PipelineOutcome::Finished(AuthenticationResult::NoResult)),
        }

        let nonce = self.resolve_nonce(&jwt, exchange).await;

        options.protocol_validator.validate(
            &jwt,
            &ProtocolValidationContext {
                authorization_code: message.code(),
                nonce: nonce.as_deref(),
            },
        )?;

        debug!(
            issuer = %jwt.issuer(),
            subject_hash = %fingerprint_for_log(jwt.claims.sub.as_deref().unwrap_or_default()),
            "Id token validated"
        );

        Ok(PipelineOutcome::Validated {
            ticket: Box::new(ticket),
            jwt: Box::new(jwt),
        })
    }

    /// Steps 3 and 4: first validator that can read the token decides
    fn validate_token(
        &self,
        id_token: &str,
        parameters: &TokenValidationParameters,
    ) -> Result<(ClaimsPrincipal, JwtToken)> {
        for validator in &self.options.token_validators {
            if !validator.can_read(id_token) {
                continue;
            }

            let (principal, token) = validator.validate(id_token, parameters)?;
            return match token {
                SecurityToken::Jwt(jwt) => Ok((principal, *jwt)),
                other => Err(OidcError::UnsupportedTokenType(other.token_type().to_string())),
            };
        }

        Err(OidcError::TokenValidationFailed(format!(
            "no token validator could read the id token ({} configured)",
            self.options.token_validators.len()
        )))
    }

    /// Steps 5 and 6
    fn build_ticket(
        &self,
        principal: ClaimsPrincipal,
        properties: &AuthenticationProperties,
        message: &ProtocolMessage,
        configuration: Option<&OidcConfiguration>,
        jwt: &JwtToken,
    ) -> AuthenticationTicket {
        let mut ticket = AuthenticationTicket::new(Some(principal), properties.clone());

        if let Some(session_state) = message.session_state() {
            ticket
                .properties
                .insert(property_keys::SESSION_STATE, session_state);
        }
        if let Some(iframe) = configuration
            .and_then(|c| c.check_session_iframe.as_deref())
            .filter(|s| !s.is_empty())
        {
            ticket
                .properties
                .insert(property_keys::CHECK_SESSION_IFRAME, iframe);
        }

        if self.options.use_token_lifetime {
            let issued = jwt.valid_from();
            if issued != 0 {
                ticket.properties.set_issued_utc(issued);
            }
            let expires = jwt.valid_to();
            if expires != 0 {
                ticket.properties.set_expires_utc(expires);
            }
            ticket.properties.set_allow_refresh(false);
        }

        ticket
    }

    /// Step 8: a nonce that cannot be consumed becomes `None`
    async fn resolve_nonce(&self, jwt: &JwtToken, exchange: &mut HttpExchange) -> Option<String> {
        let nonce = jwt.nonce()?;

        if self.options.nonce_store.consume(nonce, exchange).await {
            Some(nonce.to_string())
        } else {
            if self.options.protocol_validator.require_nonce() {
                warn!(nonce_hash = %fingerprint_for_log(nonce), "Id token nonce was not issued here or was already used");
            } else {
                info!(nonce_hash = %fingerprint_for_log(nonce), "Id token nonce not recognised");
            }
            None
        }
    }
}
