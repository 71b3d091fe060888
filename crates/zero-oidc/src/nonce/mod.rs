//! Nonce manager.
//!
//! A nonce binds the id token returned at the callback to the challenge that
//! requested it. Each nonce is remembered once at challenge time and accepted
//! by at most one [`NonceStore::consume`] call.
//!
//! Two strategies exist and exactly one is selected when options are built:
//!
//! - [`CacheNonceStore`]: server-side cache with atomic check-and-remove
//! - [`CookieNonceStore`]: a protected cookie per outstanding nonce

mod cache;
mod cookie;

pub use self::cache::{CacheNonceStore, InMemoryNonceCache, NonceCache};
pub use self::cookie::CookieNonceStore;

use crate::{errors::*, transport::HttpExchange};
use async_trait::async_trait;
use zero_oidc_crypto::{current_timestamp, generate_oidc_nonce};

/// Storage strategy for outstanding nonces
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Record `nonce` as outstanding
    ///
    /// Fails when the nonce cannot be recorded (e.g. it is already present).
    async fn remember(&self, nonce: &str, exchange: &mut HttpExchange) -> Result<()>;

    /// Accept and forget `nonce`
    ///
    /// Returns `false` when the nonce is unknown or was already consumed.
    async fn consume(&self, nonce: &str, exchange: &mut HttpExchange) -> bool;
}

/// `"<unix-seconds>.<64 hex chars>"`
pub fn generate_timestamped_nonce() -> String {
    format!("{}.{}", current_timestamp(), generate_oidc_nonce())
}

/// Issue time embedded in a timestamped nonce
pub fn nonce_timestamp(nonce: &str) -> Option<u64> {
    let (timestamp, random) = nonce.split_once('.')?;
    if random.is_empty() {
        return None;
    }
    timestamp.parse().ok()
}
