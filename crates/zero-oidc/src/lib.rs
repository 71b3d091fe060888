//! # zero-oidc
//!
//! OpenID Connect relying-party core.
//!
//! This crate implements the protocol state machine of the relying party:
//!
//! - **Challenge**: build an authorization request carrying a protected
//!   `state` and a single-use nonce, and redirect to the provider
//! - **Callback**: parse the provider's form post, recover `state`, validate
//!   the id token, reconcile the nonce and produce an [`AuthenticationTicket`]
//! - **Sign-out**: redirect to the provider's end-session endpoint
//!
//! Extension hooks ([`OidcNotifications`]) fire at every milestone and may
//! take over the flow.
//!
//! ## Architecture
//!
//! The core never touches a concrete HTTP stack. Hosts translate requests
//! into an [`HttpExchange`] and apply the resulting [`HttpResponse`]. Every
//! external capability sits behind a trait:
//!
//! - [`ConfigurationManager`]: provider metadata and signing keys
//! - [`NonceStore`]: cache- or cookie-backed nonce tracking
//! - [`TokenValidator`]: signature and claim validation
//! - [`ProtocolValidator`]: nonce, `c_hash` and required-claim rules
//!
//! ## Example
//!
//! ```no_run
//! use zero_oidc::{Challenge, HttpExchange, HttpRequest, OidcHandler, OidcOptions};
//!
//! # async fn run() -> zero_oidc::Result<()> {
//! let options = OidcOptions::builder("my-client")
//!     .authority("https://login.example.com")
//!     .redirect_uri("https://app.example.com/signin-oidc")
//!     .data_protection_key([7u8; 32])
//!     .build()?;
//! let handler = OidcHandler::new(options);
//!
//! let request = HttpRequest::new(http::Method::GET, "https", "app.example.com", "/login");
//! let mut exchange = HttpExchange::new(request);
//! handler.challenge(&mut exchange, Challenge::returning_to("/dashboard")).await?;
//! assert!(exchange.response.location.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod configuration;
pub mod constants;
pub mod data_format;
pub mod errors;
pub mod handler;
pub mod message;
pub mod nonce;
pub mod notifications;
pub mod options;
pub mod pipeline;
pub mod properties;
pub mod redirect;
pub mod state;
pub mod ticket;
pub mod tokens;
pub mod transport;


pub use configuration::{
    CachedConfigurationManager, ConfigurationManager, ConfigurationRetriever,
    HttpConfigurationRetriever, JwksKey, JwksKeySet, OidcConfiguration,
    StaticConfigurationManager,
};
pub use data_format::{PropertiesDataFormat, SecureDataFormat, StringDataFormat};
pub use errors::{OidcError, Result};
pub use handler::{Challenge, OidcHandler};
pub use message::ProtocolMessage;
pub use nonce::{CacheNonceStore, CookieNonceStore, InMemoryNonceCache, NonceCache, NonceStore};
pub use notifications::{
    AuthenticationFailedContext, AuthorizationCodeReceivedContext, CallbackStage, HookOutcome,
    MessageReceivedContext, NoOpNotifications, OidcNotifications, RedirectContext, RedirectKind,
    SecurityTokenReceivedContext, SecurityTokenValidatedContext,
};
pub use options::{OidcOptions, OidcOptionsBuilder};
pub use properties::AuthenticationProperties;
pub use state::StateCodec;
pub use ticket::{AuthenticationResult, AuthenticationTicket, Claim, ClaimsPrincipal};
pub use tokens::{
    DefaultProtocolValidator, JwtToken, JwtTokenValidator, ProtocolValidationContext,
    ProtocolValidator, SecurityToken, TokenValidationParameters, TokenValidator,
};
pub use transport::{HttpExchange, HttpRequest, HttpResponse};
