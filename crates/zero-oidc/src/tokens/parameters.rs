//! Token validation parameters.

use crate::{
    configuration::{JwksKeySet, OidcConfiguration},
    constants::{DEFAULT_AUTHENTICATION_TYPE, DEFAULT_CLOCK_SKEW},
};
use jsonwebtoken::Algorithm;

/// Trust anchors and checks applied to an id token
///
/// The configured instance is shared; each callback works on its own copy
/// from [`TokenValidationParameters::for_request`].
#[derive(Debug, Clone)]
pub struct TokenValidationParameters {
    /// Accepted `iss` values
    pub valid_issuers: Vec<String>,
    /// Accepted `aud` values; empty disables the audience check
    pub valid_audiences: Vec<String>,
    /// Keys trusted to sign tokens
    pub issuer_signing_keys: JwksKeySet,
    /// Accepted signing algorithms
    pub valid_algorithms: Vec<Algorithm>,
    /// Whether to check `iss`
    pub validate_issuer: bool,
    /// Whether to check `exp` and `nbf`
    pub validate_lifetime: bool,
    /// Tolerated clock skew in seconds
    pub clock_skew: u64,
    /// Authentication type stamped on the resulting principal
    pub authentication_type: String,
}

impl Default for TokenValidationParameters {
    fn default() -> Self {
        Self {
            valid_issuers: Vec::new(),
            valid_audiences: Vec::new(),
            issuer_signing_keys: JwksKeySet::default(),
            valid_algorithms: vec![
                Algorithm::RS256,
                Algorithm::RS384,
                Algorithm::RS512,
                Algorithm::PS256,
                Algorithm::PS384,
                Algorithm::PS512,
                Algorithm::ES256,
                Algorithm::ES384,
                Algorithm::EdDSA,
                Algorithm::HS256,
                Algorithm::HS384,
                Algorithm::HS512,
            ],
            validate_issuer: true,
            validate_lifetime: true,
            clock_skew: DEFAULT_CLOCK_SKEW,
            authentication_type: DEFAULT_AUTHENTICATION_TYPE.to_string(),
        }
    }
}

impl TokenValidationParameters {
    /// Per-request copy with provider metadata merged in
    pub fn for_request(&self, configuration: Option<&OidcConfiguration>) -> Self {
        let mut parameters = self.clone();
        if let Some(configuration) = configuration {
            parameters.merge_configuration(configuration);
        }
        parameters
    }

    /// Add the provider issuer and signing keys to the existing trust anchors
    pub fn merge_configuration(&mut self, configuration: &OidcConfiguration) {
        let issuer = configuration.issuer.trim();
        if !issuer.is_empty() && !self.valid_issuers.iter().any(|i| i == issuer) {
            self.valid_issuers.push(issuer.to_string());
        }

        self.issuer_signing_keys
            .extend_from(&configuration.signing_keys);
    }
}
