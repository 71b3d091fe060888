//! Caller-defined properties carried through the `state` parameter.

use crate::constants::property_keys;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String-to-string property bag round-tripped through the identity provider
///
/// Only ever serialized through the state codec's protect step; never parsed
/// from raw wire bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthenticationProperties {
    items: BTreeMap<String, String>,
}

impl AuthenticationProperties {
    /// Create an empty property bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a property bag with a post-login redirect URI
    pub fn with_redirect_uri(redirect_uri: impl Into<String>) -> Self {
        let mut properties = Self::new();
        properties.set_redirect_uri(redirect_uri);
        properties
    }

    /// Get a property
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    /// Set a property
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.insert(key.into(), value.into());
    }

    /// Remove a property
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.items.remove(key)
    }

    /// Whether a property is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// All properties in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the bag is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Where to send the user agent after login (or logout)
    pub fn redirect_uri(&self) -> Option<&str> {
        self.get(property_keys::REDIRECT_URI).filter(|v| !v.is_empty())
    }

    /// Set the post-login (or post-logout) redirect URI
    pub fn set_redirect_uri(&mut self, redirect_uri: impl Into<String>) {
        self.insert(property_keys::REDIRECT_URI, redirect_uri);
    }

    /// Ticket issue time (Unix seconds)
    pub fn issued_utc(&self) -> Option<u64> {
        self.get_timestamp(property_keys::ISSUED_UTC)
    }

    /// Set the ticket issue time (Unix seconds)
    pub fn set_issued_utc(&mut self, timestamp: u64) {
        self.insert(property_keys::ISSUED_UTC, timestamp.to_string());
    }

    /// Ticket expiry time (Unix seconds)
    pub fn expires_utc(&self) -> Option<u64> {
        self.get_timestamp(property_keys::EXPIRES_UTC)
    }

    /// Set the ticket expiry time (Unix seconds)
    pub fn set_expires_utc(&mut self, timestamp: u64) {
        self.insert(property_keys::EXPIRES_UTC, timestamp.to_string());
    }

    /// Whether the ticket may be refreshed
    pub fn allow_refresh(&self) -> Option<bool> {
        self.get(property_keys::ALLOW_REFRESH)
            .and_then(|v| v.parse().ok())
    }

    /// Set whether the ticket may be refreshed
    pub fn set_allow_refresh(&mut self, allow: bool) {
        self.insert(property_keys::ALLOW_REFRESH, allow.to_string());
    }

    fn get_timestamp(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse().ok())
    }
}

impl FromIterator<(String, String)> for AuthenticationProperties {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
