//! Provider metadata and signing keys.

use crate::errors::*;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};

/// Provider configuration snapshot
///
/// Deserialized from `/.well-known/openid-configuration`; `signing_keys` is
/// filled from `jwks_uri` by the retriever.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OidcConfiguration {
    /// Issuer identifier
    pub issuer: String,
    /// Authorization endpoint
    #[serde(default)]
    pub authorization_endpoint: String,
    /// Token endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    /// End-session (logout) endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<String>,
    /// Session management iframe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_session_iframe: Option<String>,
    /// JWKS URI (JSON Web Key Set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    /// Userinfo endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    /// Supported response types
    #[serde(default)]
    pub response_types_supported: Vec<String>,
    /// ID token signing algorithms supported
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,
    /// Keys the provider signs id tokens with
    #[serde(skip)]
    pub signing_keys: JwksKeySet,
}

/// JSON Web Key Set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwksKeySet {
    /// Array of JWK keys
    pub keys: Vec<JwksKey>,
}

impl JwksKeySet {
    /// Find key by Key ID (kid)
    pub fn find_key(&self, kid: &str) -> Option<&JwksKey> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    /// Append keys not already present
    pub fn extend_from(&mut self, other: &JwksKeySet) {
        for key in &other.keys {
            if !self.keys.contains(key) {
                self.keys.push(key.clone());
            }
        }
    }

    /// Whether the set holds no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Individual JSON Web Key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwksKey {
    /// Key type: `RSA`, `EC`, `OKP` or `oct`
    pub kty: String,
    /// Key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Key use (e.g., "sig" for signature)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    /// Algorithm (e.g., "RS256")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus (base64url)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent (base64url)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Curve name for `EC` / `OKP` keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// Curve x coordinate (base64url)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Curve y coordinate (base64url)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Symmetric key value (base64url)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
}

impl JwksKey {
    /// Symmetric `oct` key for HMAC algorithms
    pub fn symmetric(kid: impl Into<String>, secret: &[u8]) -> Self {
        Self {
            kty: "oct".to_string(),
            kid: Some(kid.into()),
            use_: Some("sig".to_string()),
            alg: None,
            n: None,
            e: None,
            crv: None,
            x: None,
            y: None,
            k: Some(URL_SAFE_NO_PAD.encode(secret)),
        }
    }

    /// Whether this key can verify a signature made with `alg`
    pub fn supports(&self, alg: Algorithm) -> bool {
        if let Some(use_) = self.use_.as_deref() {
            if use_ != "sig" {
                return false;
            }
        }

        if let Some(key_alg) = self.alg.as_deref() {
            if key_alg != format!("{:?}", alg) {
                return false;
            }
        }

        let kty = match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => "oct",
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => "RSA",
            Algorithm::ES256 | Algorithm::ES384 => "EC",
            Algorithm::EdDSA => "OKP",
        };
        self.kty == kty
    }

    /// Build a verification key
    pub fn decoding_key(&self) -> Result<DecodingKey> {
        let missing = |field: &str| {
            OidcError::InvalidSignature(format!("{} key is missing '{}'", self.kty, field))
        };
        let invalid = |e: jsonwebtoken::errors::Error| {
            OidcError::InvalidSignature(format!("Invalid {} key: {}", self.kty, e))
        };

        match self.kty.as_str() {
            "RSA" => {
                let n = self.n.as_deref().ok_or_else(|| missing("n"))?;
                let e = self.e.as_deref().ok_or_else(|| missing("e"))?;
                DecodingKey::from_rsa_components(n, e).map_err(invalid)
            }
            "EC" => {
                let x = self.x.as_deref().ok_or_else(|| missing("x"))?;
                let y = self.y.as_deref().ok_or_else(|| missing("y"))?;
                DecodingKey::from_ec_components(x, y).map_err(invalid)
            }
            "OKP" => {
                let x = self.x.as_deref().ok_or_else(|| missing("x"))?;
                DecodingKey::from_ed_components(x).map_err(invalid)
            }
            "oct" => {
                let k = self.k.as_deref().ok_or_else(|| missing("k"))?;
                let secret = URL_SAFE_NO_PAD
                    .decode(k.trim_end_matches('='))
                    .map_err(|e| OidcError::InvalidSignature(format!("Invalid oct key: {}", e)))?;
                Ok(DecodingKey::from_secret(&secret))
            }
            other => Err(OidcError::InvalidSignature(format!(
                "Unsupported key type: {}",
                other
            ))),
        }
    }
}
