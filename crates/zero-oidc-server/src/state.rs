use anyhow::Result;
use std::sync::Arc;
use zero_oidc::{InMemoryNonceCache, OidcHandler, OidcOptions};

use crate::config::{Config, NonceStoreKind};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub handler: OidcHandler,
    /// Present when nonces are kept in-process; swept periodically
    pub nonce_cache: Option<Arc<InMemoryNonceCache>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = OidcOptions::builder(config.client_id.clone())
            .callback_path(config.callback_path.clone())
            .data_protection_key(config.data_protection_key);

        if let Some(metadata_address) = &config.metadata_address {
            builder = builder.metadata_address(metadata_address.clone());
        }
        if let Some(authority) = &config.authority {
            builder = builder.authority(authority.clone());
        }
        if let Some(redirect_uri) = &config.redirect_uri {
            builder = builder.redirect_uri(redirect_uri.clone());
        } else {
            builder = builder.use_current_uri_as_redirect(true);
        }
        if let Some(uri) = &config.post_logout_redirect_uri {
            builder = builder.post_logout_redirect_uri(uri.clone());
        }
        if let Some(scope) = &config.scope {
            builder = builder.scope(scope.clone());
        }
        if let Some(response_type) = &config.response_type {
            builder = builder.response_type(response_type.clone());
        }

        let nonce_cache = match config.nonce_store {
            NonceStoreKind::Cookie => None,
            NonceStoreKind::Cache => {
                let cache = Arc::new(InMemoryNonceCache::new());
                builder = builder.nonce_cache(cache.clone());
                Some(cache)
            }
        };

        let options = builder.build()?;
        tracing::info!(
            client_id = %options.client_id,
            response_type = %options.response_type,
            nonce_store = ?config.nonce_store,
            "Relying party configured"
        );

        Ok(AppState {
            config,
            handler: OidcHandler::new(options),
            nonce_cache,
        })
    }
}
