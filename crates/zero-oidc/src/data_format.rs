//! Typed wrappers over the protect/unprotect capability.

use crate::{errors::*, properties::AuthenticationProperties};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use zero_oidc_crypto::DataProtector;

/// Serializes `T` with serde_json and protects the bytes
pub struct SecureDataFormat<T> {
    protector: Arc<dyn DataProtector>,
    _marker: PhantomData<fn() -> T>,
}

/// Format used for the `state` parameter
pub type PropertiesDataFormat = SecureDataFormat<AuthenticationProperties>;

/// Format used for nonce cookie names
pub type StringDataFormat = SecureDataFormat<String>;

impl<T> SecureDataFormat<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a format over `protector`
    pub fn new(protector: Arc<dyn DataProtector>) -> Self {
        Self {
            protector,
            _marker: PhantomData,
        }
    }

    /// Serialize and protect `data`
    pub fn protect(&self, data: &T) -> Result<String> {
        let bytes = serde_json::to_vec(data)?;
        Ok(self.protector.protect(&bytes)?)
    }

    /// Unprotect and deserialize a value produced by [`SecureDataFormat::protect`]
    pub fn unprotect(&self, protected: &str) -> Result<T> {
        let bytes = self.protector.unprotect(protected)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl<T> Clone for SecureDataFormat<T> {
    fn clone(&self) -> Self {
        Self {
            protector: Arc::clone(&self.protector),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for SecureDataFormat<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureDataFormat").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zero_oidc_crypto::{AeadDataProtector, PURPOSE_NONCE};

    fn format() -> StringDataFormat {
        let protector = AeadDataProtector::new([3u8; 32], PURPOSE_NONCE).unwrap();
        StringDataFormat::new(Arc::new(protector))
    }

    #[test]
    fn test_string_format_roundtrip() {
        let format = format();
        let protected = format.protect(&"nonce-value".to_string()).unwrap();

        assert!(!protected.contains("nonce-value"));
        assert_eq!(format.unprotect(&protected).unwrap(), "nonce-value");
    }

    #[test]
    fn test_unprotect_garbage_fails() {
        assert!(matches!(
            format().unprotect("garbage"),
            Err(OidcError::Crypto(_))
        ));
    }
}
