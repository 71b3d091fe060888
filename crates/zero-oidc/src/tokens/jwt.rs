//! JWT id tokens: parsed form and signature-verifying validator.

use super::{parameters::TokenValidationParameters, SecurityToken, TokenValidator};
use crate::{configuration::JwksKey, errors::*, ticket::ClaimsPrincipal};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// `aud` claim: a single audience or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// `"aud": "client"`
    Single(String),
    /// `"aud": ["client", "other"]`
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether `audience` is listed
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(a) => a == audience,
            Audience::Multiple(list) => list.iter().any(|a| a == audience),
        }
    }
}

/// ID Token Claims (from JWT payload)
/// Standard OIDC claims: https://openid.net/specs/openid-connect-core-1_0.html#IDToken
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer (provider URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Subject (provider's user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Audience (our client ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    /// Expiration time (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Issued at time (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Not before (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    /// Nonce (for replay protection)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Authorization code hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_hash: Option<String>,
    /// Access token hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,
    /// Every other claim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Parsed JWT plus the key that verified it
#[derive(Debug, Clone)]
pub struct JwtToken {
    /// Compact serialization as received
    pub raw: String,
    /// JOSE header
    pub header: Header,
    /// Typed claims
    pub claims: IdTokenClaims,
    /// Full payload as JSON
    pub payload: serde_json::Map<String, Value>,
    /// Key that verified the signature; `None` for unverified parses
    pub signing_key: Option<JwksKey>,
}

impl JwtToken {
    /// Parse a compact JWT without verifying it
    pub fn parse_unverified(raw: &str) -> Result<Self> {
        let header = decode_header(raw)
            .map_err(|e| OidcError::TokenValidationFailed(format!("Failed to decode header: {}", e)))?;

        let payload_segment = raw.split('.').nth(1).ok_or_else(|| {
            OidcError::TokenValidationFailed("Token has no payload segment".to_string())
        })?;
        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_segment)
            .map_err(|e| OidcError::TokenValidationFailed(format!("Invalid payload encoding: {}", e)))?;
        let payload: serde_json::Map<String, Value> = serde_json::from_slice(&payload_bytes)?;

        Self::from_parts(raw, header, payload, None)
    }

    fn from_parts(
        raw: &str,
        header: Header,
        payload: serde_json::Map<String, Value>,
        signing_key: Option<JwksKey>,
    ) -> Result<Self> {
        let claims: IdTokenClaims = serde_json::from_value(Value::Object(payload.clone()))?;
        Ok(Self {
            raw: raw.to_string(),
            header,
            claims,
            payload,
            signing_key,
        })
    }

    /// Start of the validity window (`nbf`, else `iat`); 0 when unset
    pub fn valid_from(&self) -> u64 {
        self.claims.nbf.or(self.claims.iat).unwrap_or(0)
    }

    /// End of the validity window (`exp`); 0 when unset
    pub fn valid_to(&self) -> u64 {
        self.claims.exp.unwrap_or(0)
    }

    /// Issuer that asserted the token
    pub fn issuer(&self) -> &str {
        self.claims.iss.as_deref().unwrap_or_default()
    }

    /// `nonce` claim
    pub fn nonce(&self) -> Option<&str> {
        self.claims.nonce.as_deref().filter(|n| !n.is_empty())
    }
}

/// Verifies compact-serialized JWTs against the trusted JWKS
#[derive(Debug, Clone, Default)]
pub struct JwtTokenValidator;

impl JwtTokenValidator {
    /// Create a validator
    pub fn new() -> Self {
        Self
    }

    fn candidate_keys<'a>(
        &self,
        header: &Header,
        parameters: &'a TokenValidationParameters,
    ) -> Result<Vec<&'a JwksKey>> {
        let keys = &parameters.issuer_signing_keys;

        match header.kid.as_deref() {
            Some(kid) => match keys.find_key(kid) {
                Some(key) if key.supports(header.alg) => Ok(vec![key]),
                _ => Err(OidcError::SignatureKeyNotFound {
                    kid: kid.to_string(),
                }),
            },
            None => {
                let compatible: Vec<_> = keys
                    .keys
                    .iter()
                    .filter(|k| k.supports(header.alg))
                    .collect();
                if compatible.is_empty() {
                    return Err(OidcError::SignatureKeyNotFound {
                        kid: "missing".to_string(),
                    });
                }
                Ok(compatible)
            }
        }
    }

    fn validation_for(&self, header: &Header, parameters: &TokenValidationParameters) -> Validation {
        let mut validation = Validation::new(header.alg);
        validation.leeway = parameters.clock_skew;
        validation.validate_exp = parameters.validate_lifetime;
        validation.validate_nbf = parameters.validate_lifetime;

        if parameters.validate_lifetime {
            validation.set_required_spec_claims(&["exp"]);
        } else {
            validation.set_required_spec_claims::<&str>(&[]);
        }

        if parameters.valid_audiences.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(parameters.valid_audiences.as_slice());
        }

        if parameters.validate_issuer && !parameters.valid_issuers.is_empty() {
            validation.set_issuer(parameters.valid_issuers.as_slice());
        }

        validation
    }
}

impl TokenValidator for JwtTokenValidator {
    fn can_read(&self, token: &str) -> bool {
        token.split('.').count() == 3 && decode_header(token).is_ok()
    }

    fn validate(
        &self,
        token: &str,
        parameters: &TokenValidationParameters,
    ) -> Result<(ClaimsPrincipal, SecurityToken)> {
        let header = decode_header(token)
            .map_err(|e| OidcError::TokenValidationFailed(format!("Failed to decode header: {}", e)))?;

        if !parameters.valid_algorithms.contains(&header.alg) {
            return Err(OidcError::InvalidSignature(format!(
                "Algorithm {:?} is not accepted",
                header.alg
            )));
        }

        let validation = self.validation_for(&header, parameters);
        let mut last_error = None;

        for key in self.candidate_keys(&header, parameters)? {
            let decoding_key = key.decoding_key()?;
            match decode::<serde_json::Map<String, Value>>(token, &decoding_key, &validation) {
                Ok(data) => {
                    let jwt = JwtToken::from_parts(token, data.header, data.claims, Some(key.clone()))?;
                    debug!(
                        kid = ?key.kid,
                        issuer = %jwt.issuer(),
                        "Token signature verified"
                    );
                    let principal = ClaimsPrincipal::from_json_claims(
                        parameters.authentication_type.clone(),
                        jwt.issuer(),
                        &jwt.payload,
                    );
                    return Ok((principal, SecurityToken::Jwt(Box::new(jwt))));
                }
                Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(map_jwt_error(e)),
            }
        }

        Err(OidcError::InvalidSignature(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no key verified the signature".to_string()),
        ))
    }
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> OidcError {
    match e.kind() {
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
            OidcError::TokenExpired(e.to_string())
        }
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            OidcError::InvalidSignature(e.to_string())
        }
        _ => OidcError::TokenValidationFailed(e.to_string()),
    }
}
