//! Configuration snapshot cache.

use super::types::OidcConfiguration;
use crate::{constants::DEFAULT_AUTOMATIC_REFRESH_INTERVAL, errors::*};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zero_oidc_crypto::current_timestamp;

/// Source of fresh provider configuration
#[async_trait]
pub trait ConfigurationRetriever: Send + Sync {
    /// Fetch the configuration from its origin
    async fn retrieve(&self) -> Result<OidcConfiguration>;
}

/// Read-or-fetch access to the provider configuration
#[async_trait]
pub trait ConfigurationManager: Send + Sync {
    /// Current configuration snapshot, fetching it when needed
    async fn get_configuration(&self) -> Result<Arc<OidcConfiguration>>;

    /// Mark the snapshot stale so the next read re-fetches it
    fn request_refresh(&self);
}

/// Configuration entry with fetch time
#[derive(Debug, Clone)]
struct CachedConfiguration {
    configuration: Arc<OidcConfiguration>,
    fetched_at: u64,
}

impl CachedConfiguration {
    fn is_valid(&self, current_time: u64, ttl: u64) -> bool {
        current_time < self.fetched_at.saturating_add(ttl)
    }
}

/// Lazily fetched, periodically refreshed configuration
///
/// Concurrent refreshes may race; the last writer wins. When a refresh fails
/// and a snapshot is already cached, the stale snapshot keeps being served.
pub struct CachedConfigurationManager<R> {
    retriever: R,
    cache: RwLock<Option<CachedConfiguration>>,
    refresh_requested: AtomicBool,
    automatic_refresh_interval: u64,
}

impl<R: ConfigurationRetriever> CachedConfigurationManager<R> {
    /// Create a manager refreshing every 24 hours
    pub fn new(retriever: R) -> Self {
        Self::with_refresh_interval(retriever, DEFAULT_AUTOMATIC_REFRESH_INTERVAL)
    }

    /// Create a manager refreshing every `automatic_refresh_interval` seconds
    pub fn with_refresh_interval(retriever: R, automatic_refresh_interval: u64) -> Self {
        Self {
            retriever,
            cache: RwLock::new(None),
            refresh_requested: AtomicBool::new(false),
            automatic_refresh_interval,
        }
    }

    async fn fetch(&self) -> Result<Arc<OidcConfiguration>> {
        match self.retriever.retrieve().await {
            Ok(configuration) => {
                let configuration = Arc::new(configuration);
                info!(
                    issuer = %configuration.issuer,
                    signing_keys = configuration.signing_keys.keys.len(),
                    "Provider configuration refreshed"
                );

                let mut cache_write = self.cache.write().await;
                *cache_write = Some(CachedConfiguration {
                    configuration: Arc::clone(&configuration),
                    fetched_at: current_timestamp(),
                });
                Ok(configuration)
            }
            Err(e) => {
                let cache_read = self.cache.read().await;
                if let Some(entry) = cache_read.as_ref() {
                    warn!(
                        error = %e,
                        fetched_at = entry.fetched_at,
                        "Configuration refresh failed, serving cached configuration"
                    );
                    return Ok(Arc::clone(&entry.configuration));
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<R: ConfigurationRetriever> ConfigurationManager for CachedConfigurationManager<R> {
    async fn get_configuration(&self) -> Result<Arc<OidcConfiguration>> {
        let current_time = current_timestamp();

        // Check cache first (read lock)
        if !self.refresh_requested.load(Ordering::Acquire) {
            let cache_read = self.cache.read().await;
            if let Some(entry) = cache_read.as_ref() {
                if entry.is_valid(current_time, self.automatic_refresh_interval) {
                    return Ok(Arc::clone(&entry.configuration));
                }
            }
        }

        if self.refresh_requested.swap(false, Ordering::AcqRel) {
            debug!("Refreshing configuration on request");
        }
        self.fetch().await
    }

    fn request_refresh(&self) {
        self.refresh_requested.store(true, Ordering::Release);
    }
}

impl<R> std::fmt::Debug for CachedConfigurationManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedConfigurationManager")
            .field("automatic_refresh_interval", &self.automatic_refresh_interval)
            .field(
                "refresh_requested",
                &self.refresh_requested.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

/// Fixed configuration, never refreshed
#[derive(Debug, Clone)]
pub struct StaticConfigurationManager {
    configuration: Arc<OidcConfiguration>,
}

impl StaticConfigurationManager {
    /// Serve `configuration` forever
    pub fn new(configuration: OidcConfiguration) -> Self {
        Self {
            configuration: Arc::new(configuration),
        }
    }
}

#[async_trait]
impl ConfigurationManager for StaticConfigurationManager {
    async fn get_configuration(&self) -> Result<Arc<OidcConfiguration>> {
        Ok(Arc::clone(&self.configuration))
    }

    fn request_refresh(&self) {
        debug!("Refresh requested on static configuration; ignoring");
    }
}
