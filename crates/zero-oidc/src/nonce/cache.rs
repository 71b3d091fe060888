//! Cache-backed nonce strategy.

use super::NonceStore;
use crate::{errors::*, transport::HttpExchange};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use tracing::{debug, warn};
use zero_oidc_crypto::{current_timestamp, fingerprint_for_log};

/// Backing cache for [`CacheNonceStore`]
///
/// Implementations must make `try_remove` an atomic check-and-remove: of any
/// number of concurrent calls for the same nonce, at most one returns `true`.
#[async_trait]
pub trait NonceCache: Send + Sync {
    /// Insert `nonce` until `expires_at`; `false` if it is already present
    async fn try_add(&self, nonce: &str, expires_at: u64) -> bool;

    /// Remove `nonce`; `true` only if it was present and unexpired
    async fn try_remove(&self, nonce: &str) -> bool;
}

/// Process-local [`NonceCache`]
#[derive(Debug, Default)]
pub struct InMemoryNonceCache {
    entries: DashMap<String, u64>,
}

impl InMemoryNonceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = current_timestamp();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of outstanding entries (expired ones included until purged)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl NonceCache for InMemoryNonceCache {
    async fn try_add(&self, nonce: &str, expires_at: u64) -> bool {
        let now = current_timestamp();
        match self.entries.entry(nonce.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    return false;
                }
                entry.insert(expires_at);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(expires_at);
                true
            }
        }
    }

    async fn try_remove(&self, nonce: &str) -> bool {
        match self.entries.remove(nonce) {
            Some((_, expires_at)) => expires_at > current_timestamp(),
            None => false,
        }
    }
}

/// Nonce strategy backed by a [`NonceCache`]
pub struct CacheNonceStore {
    cache: Arc<dyn NonceCache>,
    lifetime: u64,
}

impl CacheNonceStore {
    /// Create a store over `cache`; entries live for `lifetime` seconds
    pub fn new(cache: Arc<dyn NonceCache>, lifetime: u64) -> Self {
        Self { cache, lifetime }
    }
}

impl std::fmt::Debug for CacheNonceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheNonceStore")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NonceStore for CacheNonceStore {
    async fn remember(&self, nonce: &str, _exchange: &mut HttpExchange) -> Result<()> {
        let expires_at = current_timestamp() + self.lifetime;
        if !self.cache.try_add(nonce, expires_at).await {
            warn!(
                nonce_hash = %fingerprint_for_log(nonce),
                "Nonce already present in cache"
            );
            return Err(OidcError::NonceCollision(fingerprint_for_log(nonce)));
        }

        debug!(nonce_hash = %fingerprint_for_log(nonce), expires_at, "Nonce cached");
        Ok(())
    }

    async fn consume(&self, nonce: &str, _exchange: &mut HttpExchange) -> bool {
        let accepted = self.cache.try_remove(nonce).await;
        if !accepted {
            debug!(nonce_hash = %fingerprint_for_log(nonce), "Nonce not found in cache");
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpRequest;
    use http::Method;

    fn exchange() -> HttpExchange {
        HttpExchange::new(HttpRequest::new(Method::POST, "https", "app", "/signin-oidc"))
    }

    #[tokio::test]
    async fn test_nonce_accepted_once() {
        let store = CacheNonceStore::new(Arc::new(InMemoryNonceCache::new()), 3600);
        let mut exchange = exchange();
        let nonce = crate::nonce::generate_timestamped_nonce();

        store.remember(&nonce, &mut exchange).await.unwrap();
        assert!(store.consume(&nonce, &mut exchange).await);
        assert!(!store.consume(&nonce, &mut exchange).await);
    }

    #[tokio::test]
    async fn test_unknown_nonce_rejected() {
        let store = CacheNonceStore::new(Arc::new(InMemoryNonceCache::new()), 3600);
        assert!(!store.consume("never-issued", &mut exchange()).await);
    }

    #[tokio::test]
    async fn test_collision_is_an_error() {
        let store = CacheNonceStore::new(Arc::new(InMemoryNonceCache::new()), 3600);
        let mut exchange = exchange();

        store.remember("dup", &mut exchange).await.unwrap();
        let result = store.remember("dup", &mut exchange).await;
        assert!(matches!(result, Err(OidcError::NonceCollision(_))));
    }

    #[tokio::test]
    async fn test_expired_entry_is_rejected_and_replaceable() {
        let cache = InMemoryNonceCache::new();
        let past = current_timestamp() - 10;

        assert!(cache.try_add("old", past).await);
        assert!(!cache.try_remove("old").await);

        assert!(cache.try_add("stale", past).await);
        assert!(cache.try_add("stale", current_timestamp() + 60).await);
        assert!(cache.try_remove("stale").await);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = InMemoryNonceCache::new();
        cache.try_add("expired", current_timestamp() - 1).await;
        cache.try_add("live", current_timestamp() + 60).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.try_remove("live").await);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_consume_accepts_once() {
        let cache = Arc::new(InMemoryNonceCache::new());
        let store = Arc::new(CacheNonceStore::new(cache, 3600));
        store.remember("contended", &mut exchange()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.consume("contended", &mut exchange()).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
    }
}
