use anyhow::{Context, Result};
use std::net::SocketAddr;

/// Where outstanding nonces are kept between challenge and callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceStoreKind {
    /// One protected cookie per nonce
    Cookie,
    /// In-process cache
    Cache,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Identity provider base URL
    pub authority: Option<String>,

    /// Explicit discovery document URL (wins over `authority`)
    pub metadata_address: Option<String>,

    /// OAuth client identifier
    pub client_id: String,

    /// `redirect_uri` sent with authorization requests
    pub redirect_uri: Option<String>,

    /// `post_logout_redirect_uri` sent with end-session requests
    pub post_logout_redirect_uri: Option<String>,

    pub scope: Option<String>,

    pub response_type: Option<String>,

    /// Path the provider posts back to
    pub callback_path: String,

    pub nonce_store: NonceStoreKind,

    /// Master key for state and nonce protection (hex-encoded 32 bytes)
    pub data_protection_key: [u8; 32],
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address = var("BIND_ADDRESS")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .context("BIND_ADDRESS must be a socket address")?;

        let authority = var("OIDC_AUTHORITY");
        let metadata_address = var("OIDC_METADATA_ADDRESS");
        if authority.is_none() && metadata_address.is_none() {
            anyhow::bail!("one of OIDC_AUTHORITY or OIDC_METADATA_ADDRESS is required");
        }

        let client_id = var("OIDC_CLIENT_ID").context("OIDC_CLIENT_ID environment variable required")?;

        let nonce_store = match var("OIDC_NONCE_STORE").as_deref() {
            None | Some("cookie") => NonceStoreKind::Cookie,
            Some("cache") => NonceStoreKind::Cache,
            Some(other) => anyhow::bail!("OIDC_NONCE_STORE must be 'cookie' or 'cache', got '{}'", other),
        };

        let data_protection_key = {
            let hex_key = var("DATA_PROTECTION_KEY")
                .context("DATA_PROTECTION_KEY environment variable required")?;
            let bytes = hex::decode(hex_key.trim())?;
            if bytes.len() != 32 {
                anyhow::bail!("DATA_PROTECTION_KEY must be 32 bytes (64 hex chars)");
            }
            let mut key = [0u8; 32];
            key.copy_from_slice(&bytes);
            key
        };

        Ok(Config {
            bind_address,
            authority,
            metadata_address,
            client_id,
            redirect_uri: var("OIDC_REDIRECT_URI"),
            post_logout_redirect_uri: var("OIDC_POST_LOGOUT_REDIRECT_URI"),
            scope: var("OIDC_SCOPE"),
            response_type: var("OIDC_RESPONSE_TYPE"),
            callback_path: var("OIDC_CALLBACK_PATH").unwrap_or_else(|| "/signin-oidc".to_string()),
            nonce_store,
            data_protection_key,
        })
    }
}
