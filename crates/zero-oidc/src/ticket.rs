//! Authenticated identity and flow results.

use crate::{properties::AuthenticationProperties, tokens::SecurityToken};
use serde::Serialize;
use serde_json::Value;

/// Single claim about the authenticated subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    /// Claim type (the JWT claim name)
    pub claim_type: String,
    /// Claim value; non-string JSON values are rendered as JSON text
    pub value: String,
    /// Issuer that asserted the claim
    pub issuer: String,
}

/// Authenticated identity built from a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimsPrincipal {
    /// Authentication type the identity was established with
    pub authentication_type: String,
    /// Claims in token order; array claims produce one claim per element
    pub claims: Vec<Claim>,
}

impl ClaimsPrincipal {
    /// Create an identity with no claims
    pub fn new(authentication_type: impl Into<String>) -> Self {
        Self {
            authentication_type: authentication_type.into(),
            claims: Vec::new(),
        }
    }

    /// Build an identity from a JSON claim set
    pub fn from_json_claims(
        authentication_type: impl Into<String>,
        issuer: &str,
        claims: &serde_json::Map<String, Value>,
    ) -> Self {
        let mut principal = Self::new(authentication_type);
        for (claim_type, value) in claims {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        principal.add_claim(claim_type, render_claim_value(item), issuer);
                    }
                }
                other => principal.add_claim(claim_type, render_claim_value(other), issuer),
            }
        }
        principal
    }

    /// Add a claim
    pub fn add_claim(&mut self, claim_type: &str, value: impl Into<String>, issuer: &str) {
        self.claims.push(Claim {
            claim_type: claim_type.to_string(),
            value: value.into(),
            issuer: issuer.to_string(),
        });
    }

    /// First value of `claim_type`
    pub fn find_first(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    /// Subject identifier (`sub`)
    pub fn subject(&self) -> Option<&str> {
        self.find_first("sub")
    }
}

fn render_claim_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result of a successful (or partially successful) callback
#[derive(Debug, Clone)]
pub struct AuthenticationTicket {
    /// Authenticated identity; `None` when only a code was processed
    pub principal: Option<ClaimsPrincipal>,
    /// Properties recovered from `state`, plus session metadata
    pub properties: AuthenticationProperties,
    /// Authorization code returned by the provider
    pub authorization_code: Option<String>,
    /// Token that produced `principal`
    pub validated_token: Option<SecurityToken>,
    /// `redirect_uri` used when the code was requested
    pub code_redirect_uri: Option<String>,
}

impl AuthenticationTicket {
    /// Create a ticket
    pub fn new(principal: Option<ClaimsPrincipal>, properties: AuthenticationProperties) -> Self {
        Self {
            principal,
            properties,
            authorization_code: None,
            validated_token: None,
            code_redirect_uri: None,
        }
    }
}

/// Outcome of the callback flow
///
/// Failures travel separately as `Err(OidcError)`.
#[derive(Debug, Clone)]
pub enum AuthenticationResult {
    /// Authentication completed with a ticket
    Ticket(Box<AuthenticationTicket>),
    /// Nothing to report: not a callback, aborted, or skipped by a hook
    NoResult,
}

impl AuthenticationResult {
    /// Wrap a ticket
    pub fn ticket(ticket: AuthenticationTicket) -> Self {
        Self::Ticket(Box::new(ticket))
    }

    /// The ticket, if any
    pub fn as_ticket(&self) -> Option<&AuthenticationTicket> {
        match self {
            Self::Ticket(ticket) => Some(ticket),
            Self::NoResult => None,
        }
    }

    /// Consume into the ticket, if any
    pub fn into_ticket(self) -> Option<AuthenticationTicket> {
        match self {
            Self::Ticket(ticket) => Some(*ticket),
            Self::NoResult => None,
        }
    }

    /// Whether no ticket was produced
    pub fn is_none(&self) -> bool {
        matches!(self, Self::NoResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_principal_from_json_claims() {
        let claims = json!({
            "sub": "user-123",
            "roles": ["admin", "reader"],
            "email_verified": true,
            "address": { "country": "NZ" },
            "middle_name": null
        });

        let principal = ClaimsPrincipal::from_json_claims(
            "OpenIdConnect",
            "https://idp.example.com",
            claims.as_object().unwrap(),
        );

        assert_eq!(principal.subject(), Some("user-123"));
        assert_eq!(principal.find_first("email_verified"), Some("true"));
        assert_eq!(principal.find_first("address"), Some(r#"{"country":"NZ"}"#));
        assert_eq!(principal.find_first("middle_name"), None);

        let roles: Vec<_> = principal
            .claims
            .iter()
            .filter(|c| c.claim_type == "roles")
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(roles, vec!["admin", "reader"]);
        assert!(principal
            .claims
            .iter()
            .all(|c| c.issuer == "https://idp.example.com"));
    }

    #[test]
    fn test_authentication_result_accessors() {
        let ticket = AuthenticationTicket::new(None, AuthenticationProperties::new());
        let result = AuthenticationResult::ticket(ticket);

        assert!(!result.is_none());
        assert!(result.as_ticket().unwrap().principal.is_none());
        assert!(AuthenticationResult::NoResult.into_ticket().is_none());
    }
}
