//! Cookie-backed nonce strategy.
//!
//! Each outstanding nonce is a cookie named `prefix + protect(nonce)` with a
//! constant value. Consuming scans the prefixed cookies, unprotects each
//! name and removes the first match from the request and the user agent.

use super::NonceStore;
use crate::{
    constants::NONCE_COOKIE_VALUE,
    data_format::StringDataFormat,
    errors::*,
    transport::{nonce_cookie, HttpExchange},
};
use async_trait::async_trait;
use tracing::{debug, warn};
use zero_oidc_crypto::fingerprint_for_log;

/// Nonce strategy that keeps nonces in protected cookies
#[derive(Debug, Clone)]
pub struct CookieNonceStore {
    format: StringDataFormat,
    prefix: String,
    lifetime: u64,
}

impl CookieNonceStore {
    /// Create a store; cookies are named `prefix + protect(nonce)`
    pub fn new(format: StringDataFormat, prefix: impl Into<String>, lifetime: u64) -> Self {
        Self {
            format,
            prefix: prefix.into(),
            lifetime,
        }
    }

    /// Cookie name prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[async_trait]
impl NonceStore for CookieNonceStore {
    async fn remember(&self, nonce: &str, exchange: &mut HttpExchange) -> Result<()> {
        let name = format!("{}{}", self.prefix, self.format.protect(&nonce.to_string())?);
        let secure = exchange.request.is_secure();

        exchange
            .response
            .append_cookie(nonce_cookie(name, NONCE_COOKIE_VALUE, secure, self.lifetime));

        debug!(nonce_hash = %fingerprint_for_log(nonce), "Nonce cookie set");
        Ok(())
    }

    async fn consume(&self, nonce: &str, exchange: &mut HttpExchange) -> bool {
        let candidates: Vec<String> = exchange
            .request
            .cookies_with_prefix(&self.prefix)
            .map(|(name, _)| name.to_string())
            .collect();

        for name in candidates {
            let protected = &name[self.prefix.len()..];
            match self.format.unprotect(protected) {
                Ok(candidate) if candidate == nonce => {
                    exchange.request.cookies.remove(&name);
                    exchange.response.delete_cookie(&name);
                    debug!(nonce_hash = %fingerprint_for_log(nonce), "Nonce cookie consumed");
                    return true;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        cookie_hash = %fingerprint_for_log(&name),
                        error = %e,
                        "Skipping unreadable nonce cookie"
                    );
                }
            }
        }

        debug!(nonce_hash = %fingerprint_for_log(nonce), "No nonce cookie matched");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::NONCE_COOKIE_PREFIX,
        data_format::SecureDataFormat,
        transport::{HttpExchange, HttpRequest},
    };
    use http::Method;
    use std::sync::Arc;
    use zero_oidc_crypto::{AeadDataProtector, PURPOSE_NONCE};

    fn store() -> CookieNonceStore {
        let protector = AeadDataProtector::new([9u8; 32], PURPOSE_NONCE).unwrap();
        CookieNonceStore::new(SecureDataFormat::new(Arc::new(protector)), NONCE_COOKIE_PREFIX, 3600)
    }

    fn callback_exchange() -> HttpExchange {
        HttpExchange::new(HttpRequest::new(Method::POST, "https", "app", "/signin-oidc"))
    }

    /// Carry the cookies set on a challenge response into a callback request
    fn carry_cookies(from: &HttpExchange, to: &mut HttpExchange) {
        for cookie in &from.response.cookies {
            to.request
                .cookies
                .insert(cookie.name().to_string(), cookie.value().to_string());
        }
    }

    #[tokio::test]
    async fn test_remember_sets_protected_cookie() {
        let store = store();
        let mut challenge = callback_exchange();

        store.remember("nonce-1", &mut challenge).await.unwrap();

        let cookie = &challenge.response.cookies[0];
        assert!(cookie.name().starts_with(NONCE_COOKIE_PREFIX));
        assert!(!cookie.name().contains("nonce-1"));
        assert_eq!(cookie.value(), "N");
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[tokio::test]
    async fn test_nonce_accepted_once() {
        let store = store();
        let mut challenge = callback_exchange();
        store.remember("nonce-1", &mut challenge).await.unwrap();

        let mut first = callback_exchange();
        carry_cookies(&challenge, &mut first);
        assert!(store.consume("nonce-1", &mut first).await);

        let name = challenge.response.cookies[0].name().to_string();
        let removal = first.response.cookie(&name).unwrap();
        assert_eq!(removal.value(), "");

        // The user agent honoured the removal, so the replay carries no cookie
        let mut replay = callback_exchange();
        assert!(!store.consume("nonce-1", &mut replay).await);
    }

    #[tokio::test]
    async fn test_second_consume_on_same_exchange_rejected() {
        let store = store();
        let mut challenge = callback_exchange();
        store.remember("nonce-1", &mut challenge).await.unwrap();

        let mut callback = callback_exchange();
        carry_cookies(&challenge, &mut callback);

        assert!(store.consume("nonce-1", &mut callback).await);
        assert!(!store.consume("nonce-1", &mut callback).await);
        assert_eq!(callback.request.cookies_with_prefix(NONCE_COOKIE_PREFIX).count(), 0);
        assert_eq!(callback.response.cookies.len(), 1);
    }

    #[tokio::test]
    async fn test_picks_matching_cookie_among_several() {
        let store = store();
        let mut challenge = callback_exchange();
        store.remember("nonce-a", &mut challenge).await.unwrap();
        store.remember("nonce-b", &mut challenge).await.unwrap();

        let mut callback = callback_exchange();
        carry_cookies(&challenge, &mut callback);

        assert!(store.consume("nonce-b", &mut callback).await);
        let deleted = &callback.response.cookies;
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].name(), challenge.response.cookies[1].name());
    }

    #[tokio::test]
    async fn test_unreadable_cookies_are_skipped() {
        let store = store();
        let mut challenge = callback_exchange();
        store.remember("nonce-1", &mut challenge).await.unwrap();

        let mut callback = callback_exchange()
            .request
            .with_cookie(format!("{}garbage", NONCE_COOKIE_PREFIX), "N")
            .with_cookie(format!("{}!!!", NONCE_COOKIE_PREFIX), "N");
        for cookie in &challenge.response.cookies {
            callback = callback.with_cookie(cookie.name().to_string(), cookie.value().to_string());
        }
        let mut callback = HttpExchange::new(callback);

        assert!(store.consume("nonce-1", &mut callback).await);
    }

    #[tokio::test]
    async fn test_unknown_nonce_rejected() {
        let store = store();
        let mut challenge = callback_exchange();
        store.remember("nonce-1", &mut challenge).await.unwrap();

        let mut callback = callback_exchange();
        carry_cookies(&challenge, &mut callback);

        assert!(!store.consume("nonce-2", &mut callback).await);
        assert!(callback.response.cookies.is_empty());
    }

    #[tokio::test]
    async fn test_cookie_from_other_key_rejected() {
        let other = CookieNonceStore::new(
            SecureDataFormat::new(Arc::new(
                AeadDataProtector::new([1u8; 32], PURPOSE_NONCE).unwrap(),
            )),
            NONCE_COOKIE_PREFIX,
            3600,
        );
        let mut challenge = callback_exchange();
        other.remember("nonce-1", &mut challenge).await.unwrap();

        let mut callback = callback_exchange();
        carry_cookies(&challenge, &mut callback);
        assert!(!store().consume("nonce-1", &mut callback).await);
    }
}
