//! Protocol-level id token checks.

use super::jwt::JwtToken;
use crate::{
    constants::DEFAULT_NONCE_LIFETIME,
    errors::*,
    nonce::{generate_timestamped_nonce, nonce_timestamp},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::Algorithm;
use sha2::{Digest, Sha256, Sha384, Sha512};
use zero_oidc_crypto::{current_timestamp, generate_oidc_nonce};

/// Inputs the protocol checks compare the token against
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolValidationContext<'a> {
    /// Authorization code returned alongside the token
    pub authorization_code: Option<&'a str>,
    /// Nonce this relying party issued and successfully consumed
    pub nonce: Option<&'a str>,
}

/// Structural validation of an id token against the protocol rules
pub trait ProtocolValidator: Send + Sync {
    /// Whether every authentication request must carry a nonce
    fn require_nonce(&self) -> bool;

    /// Create a nonce for a new authentication request
    fn generate_nonce(&self) -> String;

    /// Fail with [`OidcError::ProtocolViolation`] when a rule is broken
    fn validate(&self, token: &JwtToken, context: &ProtocolValidationContext<'_>) -> Result<()>;
}

/// Standard OpenID Connect checks
#[derive(Debug, Clone)]
pub struct DefaultProtocolValidator {
    /// Reject tokens whose nonce is missing or was not issued by us
    pub require_nonce: bool,
    /// Nonces embed their issue time and expire after `nonce_lifetime`
    pub require_timestamp_in_nonce: bool,
    /// Nonce lifetime in seconds
    pub nonce_lifetime: u64,
}

impl Default for DefaultProtocolValidator {
    fn default() -> Self {
        Self {
            require_nonce: true,
            require_timestamp_in_nonce: true,
            nonce_lifetime: DEFAULT_NONCE_LIFETIME,
        }
    }
}

impl DefaultProtocolValidator {
    fn validate_required_claims(&self, token: &JwtToken) -> Result<()> {
        let claims = &token.claims;
        let missing = [
            ("aud", claims.aud.is_none()),
            ("exp", claims.exp.is_none()),
            ("iat", claims.iat.is_none()),
            ("iss", claims.iss.as_deref().map_or(true, str::is_empty)),
            ("sub", claims.sub.as_deref().map_or(true, str::is_empty)),
        ];

        for (claim, is_missing) in missing {
            if is_missing {
                return Err(OidcError::ProtocolViolation(format!(
                    "id token is missing the '{}' claim",
                    claim
                )));
            }
        }
        Ok(())
    }

    fn validate_nonce(&self, token: &JwtToken, expected: Option<&str>) -> Result<()> {
        let found = token.nonce();

        match (found, expected) {
            (_, None) if self.require_nonce => Err(OidcError::ProtocolViolation(
                "nonce is required but none was issued for this response".to_string(),
            )),
            (None, _) if self.require_nonce => Err(OidcError::ProtocolViolation(
                "nonce is required but the id token carries none".to_string(),
            )),
            (None, None) | (Some(_), None) => Ok(()),
            (None, Some(_)) => Err(OidcError::ProtocolViolation(
                "a nonce was issued but the id token carries none".to_string(),
            )),
            (Some(found), Some(expected)) => {
                if found != expected {
                    return Err(OidcError::ProtocolViolation(
                        "id token nonce does not match the issued nonce".to_string(),
                    ));
                }
                if self.require_timestamp_in_nonce {
                    self.validate_nonce_timestamp(found)?;
                }
                Ok(())
            }
        }
    }

    fn validate_nonce_timestamp(&self, nonce: &str) -> Result<()> {
        let issued_at = nonce_timestamp(nonce).ok_or_else(|| {
            OidcError::ProtocolViolation("nonce does not carry a timestamp".to_string())
        })?;

        if issued_at.saturating_add(self.nonce_lifetime) < current_timestamp() {
            return Err(OidcError::ProtocolViolation(format!(
                "nonce expired: issued at {}, lifetime {}s",
                issued_at, self.nonce_lifetime
            )));
        }
        Ok(())
    }

    fn validate_c_hash(&self, token: &JwtToken, code: &str) -> Result<()> {
        let c_hash = token
            .claims
            .c_hash
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                OidcError::ProtocolViolation(
                    "id token returned with a code carries no 'c_hash'".to_string(),
                )
            })?;

        if compute_left_half_hash(token.header.alg, code) != c_hash {
            return Err(OidcError::ProtocolViolation(
                "'c_hash' does not match the authorization code".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProtocolValidator for DefaultProtocolValidator {
    fn require_nonce(&self) -> bool {
        self.require_nonce
    }

    fn generate_nonce(&self) -> String {
        if self.require_timestamp_in_nonce {
            generate_timestamped_nonce()
        } else {
            generate_oidc_nonce()
        }
    }

    fn validate(&self, token: &JwtToken, context: &ProtocolValidationContext<'_>) -> Result<()> {
        self.validate_required_claims(token)?;
        self.validate_nonce(token, context.nonce)?;

        if let Some(code) = context.authorization_code {
            self.validate_c_hash(token, code)?;
        }
        Ok(())
    }
}

/// Left half of the token-algorithm digest of `value`, base64url-encoded
///
/// Used for `c_hash` and `at_hash`.
pub fn compute_left_half_hash(alg: Algorithm, value: &str) -> String {
    let digest: Vec<u8> = match alg {
        Algorithm::HS384 | Algorithm::RS384 | Algorithm::PS384 | Algorithm::ES384 => {
            Sha384::digest(value.as_bytes()).to_vec()
        }
        Algorithm::HS512 | Algorithm::RS512 | Algorithm::PS512 | Algorithm::EdDSA => {
            Sha512::digest(value.as_bytes()).to_vec()
        }
        _ => Sha256::digest(value.as_bytes()).to_vec(),
    };
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    fn token(claims: Value) -> JwtToken {
        let raw = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        JwtToken::parse_unverified(&raw).unwrap()
    }

    fn base_claims(nonce: Option<&str>) -> Value {
        let now = current_timestamp();
        let mut claims = json!({
            "iss": "https://idp.example.com",
            "sub": "user-123",
            "aud": "client-1",
            "exp": now + 600,
            "iat": now,
        });
        if let Some(nonce) = nonce {
            claims["nonce"] = json!(nonce);
        }
        claims
    }

    fn context(nonce: Option<&str>) -> ProtocolValidationContext<'_> {
        ProtocolValidationContext {
            authorization_code: None,
            nonce,
        }
    }

    #[test]
    fn test_matching_nonce_passes() {
        let validator = DefaultProtocolValidator::default();
        let nonce = validator.generate_nonce();

        let jwt = token(base_claims(Some(&nonce)));
        assert!(validator.validate(&jwt, &context(Some(&nonce))).is_ok());
    }

    #[test]
    fn test_unissued_nonce_fails_when_required() {
        let validator = DefaultProtocolValidator::default();
        let jwt = token(base_claims(Some("1700000000.deadbeef")));

        assert!(matches!(
            validator.validate(&jwt, &context(None)),
            Err(OidcError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_missing_token_nonce_fails_when_required() {
        let validator = DefaultProtocolValidator::default();
        let nonce = validator.generate_nonce();
        let jwt = token(base_claims(None));

        assert!(matches!(
            validator.validate(&jwt, &context(Some(&nonce))),
            Err(OidcError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_mismatched_nonce_fails() {
        let validator = DefaultProtocolValidator {
            require_nonce: false,
            ..Default::default()
        };
        let issued = validator.generate_nonce();
        let jwt = token(base_claims(Some(&validator.generate_nonce())));

        assert!(matches!(
            validator.validate(&jwt, &context(Some(&issued))),
            Err(OidcError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_nonce_optional_when_not_required() {
        let validator = DefaultProtocolValidator {
            require_nonce: false,
            ..Default::default()
        };
        assert!(validator.validate(&token(base_claims(None)), &context(None)).is_ok());
    }

    #[test]
    fn test_expired_timestamped_nonce_fails() {
        let validator = DefaultProtocolValidator {
            nonce_lifetime: 60,
            ..Default::default()
        };
        let stale = format!("{}.{}", current_timestamp() - 3600, "ab".repeat(32));
        let jwt = token(base_claims(Some(&stale)));

        assert!(matches!(
            validator.validate(&jwt, &context(Some(&stale))),
            Err(OidcError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_untimestamped_nonce_without_timestamp_policy() {
        let validator = DefaultProtocolValidator {
            require_timestamp_in_nonce: false,
            ..Default::default()
        };
        let nonce = validator.generate_nonce();
        assert!(!nonce.contains('.'));

        let jwt = token(base_claims(Some(&nonce)));
        assert!(validator.validate(&jwt, &context(Some(&nonce))).is_ok());
    }

    #[test]
    fn test_required_claims() {
        let validator = DefaultProtocolValidator {
            require_nonce: false,
            ..Default::default()
        };

        for claim in ["aud", "exp", "iat", "iss", "sub"] {
            let mut claims = base_claims(None);
            claims.as_object_mut().unwrap().remove(claim);
            assert!(
                matches!(
                    validator.validate(&token(claims), &context(None)),
                    Err(OidcError::ProtocolViolation(_))
                ),
                "missing {} must fail",
                claim
            );
        }
    }

    #[test]
    fn test_c_hash() {
        let validator = DefaultProtocolValidator {
            require_nonce: false,
            ..Default::default()
        };
        let code = "SplxlOBeZQQYbYS6WxSbIA";

        let mut claims = base_claims(None);
        claims["c_hash"] = json!(compute_left_half_hash(Algorithm::HS256, code));
        let jwt = token(claims);

        let with_code = ProtocolValidationContext {
            authorization_code: Some(code),
            nonce: None,
        };
        assert!(validator.validate(&jwt, &with_code).is_ok());

        let other_code = ProtocolValidationContext {
            authorization_code: Some("another-code"),
            nonce: None,
        };
        assert!(validator.validate(&jwt, &other_code).is_err());

        let without_c_hash = token(base_claims(None));
        assert!(validator.validate(&without_c_hash, &with_code).is_err());
    }

    #[test]
    fn test_left_half_hash_lengths() {
        // 256/384/512-bit digests halve to 16/24/32 bytes
        assert_eq!(compute_left_half_hash(Algorithm::RS256, "x").len(), 22);
        assert_eq!(compute_left_half_hash(Algorithm::RS384, "x").len(), 32);
        assert_eq!(compute_left_half_hash(Algorithm::RS512, "x").len(), 43);
    }
}
