//! Extension hooks fired at each milestone of the flows.
//!
//! Every hook returns a [`HookOutcome`]: `Continue` lets the flow proceed,
//! `Handled` ends it with the hook's own result and `Skipped` ends it with
//! no result. Each hook fires at most once per request.

use crate::{
    errors::OidcError,
    errors::Result,
    message::ProtocolMessage,
    properties::AuthenticationProperties,
    ticket::AuthenticationTicket,
    tokens::JwtToken,
    transport::HttpExchange,
};
use async_trait::async_trait;

/// Decision returned by a hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome<T> {
    /// Proceed with the flow
    Continue,
    /// Stop; the hook's result wins
    Handled(T),
    /// Stop without a result
    Skipped,
}

/// Milestone the callback flow had reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStage {
    /// Form body parsed into a protocol message
    MessageReceived,
    /// `state` decoded into properties
    StatePropertiesResolved,
    /// Id token handed to the validation pipeline
    TokenReceived,
    /// Id token validated and ticket built
    TokenValidated,
    /// Authorization code attached to the ticket
    CodeReceived,
}

/// Which redirect is about to be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Authorization request (challenge)
    Authentication,
    /// End-session request (sign-out)
    Logout,
}

/// Context for [`OidcNotifications::message_received`]
#[derive(Debug)]
pub struct MessageReceivedContext<'a> {
    /// Current exchange
    pub exchange: &'a mut HttpExchange,
    /// Parsed callback message; hooks may rewrite it
    pub message: &'a mut ProtocolMessage,
}

/// Context for [`OidcNotifications::security_token_received`]
#[derive(Debug)]
pub struct SecurityTokenReceivedContext<'a> {
    /// Current exchange
    pub exchange: &'a mut HttpExchange,
    /// Callback message
    pub message: &'a ProtocolMessage,
    /// Raw id token about to be validated
    pub id_token: &'a str,
}

/// Context for [`OidcNotifications::security_token_validated`]
#[derive(Debug)]
pub struct SecurityTokenValidatedContext<'a> {
    /// Current exchange
    pub exchange: &'a mut HttpExchange,
    /// Callback message
    pub message: &'a ProtocolMessage,
    /// Ticket built from the validated token; hooks may amend it
    pub ticket: &'a mut AuthenticationTicket,
}

/// Context for [`OidcNotifications::authorization_code_received`]
#[derive(Debug)]
pub struct AuthorizationCodeReceivedContext<'a> {
    /// Current exchange
    pub exchange: &'a mut HttpExchange,
    /// Callback message
    pub message: &'a ProtocolMessage,
    /// Ticket carrying the code; hooks may amend it
    pub ticket: &'a mut AuthenticationTicket,
    /// Authorization code
    pub code: &'a str,
    /// `redirect_uri` the code was requested with
    pub redirect_uri: Option<&'a str>,
    /// Validated id token returned alongside the code
    pub jwt: Option<&'a JwtToken>,
}

/// Context for [`OidcNotifications::redirect_to_identity_provider`]
#[derive(Debug)]
pub struct RedirectContext<'a> {
    /// Current exchange
    pub exchange: &'a mut HttpExchange,
    /// Outbound message; hooks may add or change parameters
    pub message: &'a mut ProtocolMessage,
    /// Challenge or sign-out
    pub kind: RedirectKind,
}

/// Context for [`OidcNotifications::authentication_failed`]
#[derive(Debug)]
pub struct AuthenticationFailedContext<'a> {
    /// Current exchange
    pub exchange: &'a mut HttpExchange,
    /// Callback message
    pub message: &'a ProtocolMessage,
    /// Properties, when `state` had already been decoded
    pub properties: Option<&'a AuthenticationProperties>,
    /// Milestone reached before the failure
    pub stage: CallbackStage,
    /// The failure
    pub error: &'a OidcError,
}

/// Hook set; every method defaults to `Continue`
#[async_trait]
pub trait OidcNotifications: Send + Sync {
    /// A callback message was parsed
    async fn message_received(
        &self,
        _context: &mut MessageReceivedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        Ok(HookOutcome::Continue)
    }

    /// An id token is about to be validated
    async fn security_token_received(
        &self,
        _context: &mut SecurityTokenReceivedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        Ok(HookOutcome::Continue)
    }

    /// An id token was validated and a ticket built
    async fn security_token_validated(
        &self,
        _context: &mut SecurityTokenValidatedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        Ok(HookOutcome::Continue)
    }

    /// An authorization code arrived
    async fn authorization_code_received(
        &self,
        _context: &mut AuthorizationCodeReceivedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        Ok(HookOutcome::Continue)
    }

    /// A redirect to the provider is about to be emitted
    ///
    /// `Handled` means the hook produced the response itself.
    async fn redirect_to_identity_provider(
        &self,
        _context: &mut RedirectContext<'_>,
    ) -> Result<HookOutcome<()>> {
        Ok(HookOutcome::Continue)
    }

    /// The callback failed; `Continue` rethrows the error
    async fn authentication_failed(
        &self,
        _context: &mut AuthenticationFailedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        Ok(HookOutcome::Continue)
    }
}

/// Hook set that never intervenes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifications;

impl OidcNotifications for NoOpNotifications {}
