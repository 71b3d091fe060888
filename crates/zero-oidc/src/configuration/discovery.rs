//! OIDC provider discovery via .well-known endpoint.

use super::{
    manager::ConfigurationRetriever,
    types::{JwksKeySet, OidcConfiguration},
};
use crate::errors::*;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Well-known discovery document path
pub const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// Fetches the discovery document and its JWKS over HTTP
#[derive(Debug, Clone)]
pub struct HttpConfigurationRetriever {
    client: Client,
    metadata_address: String,
}

impl HttpConfigurationRetriever {
    /// Retrieve from an explicit discovery document URL
    pub fn new(metadata_address: impl Into<String>) -> Self {
        Self::with_client(Client::new(), metadata_address)
    }

    /// Retrieve from `{authority}/.well-known/openid-configuration`
    pub fn from_authority(authority: &str) -> Self {
        Self::new(format!("{}{}", authority.trim_end_matches('/'), DISCOVERY_PATH))
    }

    /// Retrieve with a preconfigured HTTP client
    pub fn with_client(client: Client, metadata_address: impl Into<String>) -> Self {
        Self {
            client,
            metadata_address: metadata_address.into(),
        }
    }

    /// Discovery document URL
    pub fn metadata_address(&self) -> &str {
        &self.metadata_address
    }

    async fn fetch_jwks(&self, jwks_uri: &str) -> Result<JwksKeySet> {
        let jwks: JwksKeySet = self
            .client
            .get(jwks_uri)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                OidcError::ConfigurationUnavailable(format!("Failed to fetch JWKS: {}", e))
            })?
            .json()
            .await
            .map_err(|e| {
                OidcError::ConfigurationUnavailable(format!("Failed to parse JWKS: {}", e))
            })?;

        Ok(jwks)
    }
}

#[async_trait]
impl ConfigurationRetriever for HttpConfigurationRetriever {
    async fn retrieve(&self) -> Result<OidcConfiguration> {
        debug!(metadata_address = %self.metadata_address, "Fetching provider configuration");

        let mut config: OidcConfiguration = self
            .client
            .get(&self.metadata_address)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OidcError::ConfigurationUnavailable(format!("HTTP error: {}", e)))?
            .json()
            .await
            .map_err(|e| {
                OidcError::ConfigurationUnavailable(format!("JSON parse error: {}", e))
            })?;

        if let Some(jwks_uri) = config.jwks_uri.clone() {
            config.signing_keys = self.fetch_jwks(&jwks_uri).await?;
        }

        Ok(config)
    }
}
