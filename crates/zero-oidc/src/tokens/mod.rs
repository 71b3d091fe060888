//! Token validation capabilities.
//!
//! A [`TokenValidator`] turns a raw id token into a principal plus the
//! underlying token object. A [`ProtocolValidator`] then enforces the
//! cross-field rules of the protocol (nonce, `c_hash`, required claims).

pub mod jwt;
pub mod parameters;
pub mod protocol;

pub use jwt::{Audience, IdTokenClaims, JwtToken, JwtTokenValidator};
pub use parameters::TokenValidationParameters;
pub use protocol::{DefaultProtocolValidator, ProtocolValidationContext, ProtocolValidator};

use crate::{errors::*, ticket::ClaimsPrincipal};

/// Token produced by a [`TokenValidator`]
#[derive(Debug, Clone)]
pub enum SecurityToken {
    /// A verified JWT
    Jwt(Box<JwtToken>),
    /// Any other token format
    Opaque {
        /// Format name reported by the validator
        token_type: String,
        /// Token as received
        raw: String,
    },
}

impl SecurityToken {
    /// Name of the concrete token type
    pub fn token_type(&self) -> &str {
        match self {
            SecurityToken::Jwt(_) => "JWT",
            SecurityToken::Opaque { token_type, .. } => token_type,
        }
    }

    /// The JWT, if this is one
    pub fn as_jwt(&self) -> Option<&JwtToken> {
        match self {
            SecurityToken::Jwt(jwt) => Some(jwt),
            SecurityToken::Opaque { .. } => None,
        }
    }
}

/// Pluggable token validator
pub trait TokenValidator: Send + Sync {
    /// Whether this validator understands the token's format
    fn can_read(&self, token: &str) -> bool;

    /// Verify `token` and build a principal from it
    fn validate(
        &self,
        token: &str,
        parameters: &TokenValidationParameters,
    ) -> Result<(ClaimsPrincipal, SecurityToken)>;
}
