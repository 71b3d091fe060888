//! Relying-party error types.

use thiserror::Error;

/// OpenID Connect relying-party errors
#[derive(Debug, Error)]
pub enum OidcError {
    /// Inbound request is not a recognized protocol message
    #[error("Malformed protocol message: {0}")]
    MalformedMessage(String),

    /// `state` parameter missing or could not be unprotected
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Identity provider returned an explicit `error` parameter
    #[error("Identity provider returned error '{error}'{}", .error_description.as_deref().map(|d| format!(": {}", d)).unwrap_or_default())]
    ProtocolError {
        /// `error` parameter value (e.g. `access_denied`)
        error: String,
        /// `error_description` parameter value
        error_description: Option<String>,
        /// `error_uri` parameter value
        error_uri: Option<String>,
    },

    /// A token validator produced a token that is not a JWT
    #[error("Unsupported token type: {0}")]
    UnsupportedTokenType(String),

    /// No configured token validator accepted the id token
    #[error("Token validation failed: {0}")]
    TokenValidationFailed(String),

    /// The signing key referenced by the token is not in the trusted key set
    #[error("Signing key not found: kid={kid}")]
    SignatureKeyNotFound {
        /// Key ID from the token header
        kid: String,
    },

    /// Token signature did not verify
    #[error("Invalid token signature: {0}")]
    InvalidSignature(String),

    /// Token is outside its validity window
    #[error("Token expired or not yet valid: {0}")]
    TokenExpired(String),

    /// Cross-field protocol check failed (nonce, c_hash, required claims)
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// A freshly issued nonce was already present in the nonce cache
    #[error("Nonce already exists in cache: {0}")]
    NonceCollision(String),

    /// Outbound redirect URL is not a well-formed absolute URL
    #[error("Malformed redirect URL: {0}")]
    MalformedRedirectUrl(String),

    /// Provider configuration could not be retrieved
    #[error("Configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    /// Options failed validation
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Crypto error
    #[error("Crypto error: {0}")]
    Crypto(#[from] zero_oidc_crypto::CryptoError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

impl OidcError {
    /// Whether this failure may be caused by a provider key rollover
    pub fn is_signature_key_not_found(&self) -> bool {
        matches!(self, OidcError::SignatureKeyNotFound { .. })
    }
}

impl From<serde_json::Error> for OidcError {
    fn from(e: serde_json::Error) -> Self {
        OidcError::Serialization(e.to_string())
    }
}

/// Result type for relying-party operations
pub type Result<T> = std::result::Result<T, OidcError>;
