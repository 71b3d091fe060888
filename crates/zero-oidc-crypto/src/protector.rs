//! Purpose-bound data protection.
//!
//! A [`DataProtector`] turns bytes into an opaque, tamper-evident string and
//! back. The relying party treats it as a black box: anything it produces can
//! only be read back by a protector created from the same master key and
//! purpose.
//!
//! Wire format of [`AeadDataProtector`] output (base64url, no padding):
//!
//! ```text
//! version (1 byte) || nonce (24 bytes) || ciphertext + tag
//! ```

use crate::{constants::*, derivation::derive_purpose_key, encryption, errors::*};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use zeroize::Zeroizing;

/// Protect/unprotect capability
pub trait DataProtector: Send + Sync {
    /// Protect `plaintext`, returning a URL-safe opaque string
    fn protect(&self, plaintext: &[u8]) -> Result<String>;

    /// Recover the plaintext of a value produced by [`DataProtector::protect`]
    ///
    /// Fails on any modification of the protected value.
    fn unprotect(&self, protected: &str) -> Result<Vec<u8>>;
}

/// XChaCha20-Poly1305 protector bound to a purpose string
pub struct AeadDataProtector {
    master_key: Zeroizing<[u8; KEY_SIZE]>,
    key: Zeroizing<[u8; KEY_SIZE]>,
    purpose: String,
}

impl AeadDataProtector {
    /// Create a protector for `purpose` from the data protection master key
    pub fn new(master_key: [u8; KEY_SIZE], purpose: &str) -> Result<Self> {
        let key = derive_purpose_key(&master_key, purpose)?;
        Ok(Self {
            master_key: Zeroizing::new(master_key),
            key,
            purpose: purpose.to_string(),
        })
    }

    /// Create a protector from a master key slice of arbitrary length
    pub fn from_slice(master_key: &[u8], purpose: &str) -> Result<Self> {
        if master_key.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeySize {
                expected: KEY_SIZE,
                actual: master_key.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(master_key);
        Self::new(key, purpose)
    }

    /// Create a sibling protector with a more specific purpose
    ///
    /// The child purpose is `"{parent}/{sub_purpose}"`, so payloads are not
    /// interchangeable between parent and child.
    pub fn create_protector(&self, sub_purpose: &str) -> Result<Self> {
        Self::new(*self.master_key, &format!("{}/{}", self.purpose, sub_purpose))
    }

    /// Purpose this protector is bound to
    pub fn purpose(&self) -> &str {
        &self.purpose
    }
}

impl std::fmt::Debug for AeadDataProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AeadDataProtector")
            .field("purpose", &self.purpose)
            .finish_non_exhaustive()
    }
}

impl DataProtector for AeadDataProtector {
    fn protect(&self, plaintext: &[u8]) -> Result<String> {
        let envelope = encryption::seal(&self.key, plaintext, self.purpose.as_bytes())?;

        let mut payload = Vec::with_capacity(1 + envelope.len());
        payload.push(PROTECTOR_VERSION);
        payload.extend_from_slice(&envelope);

        Ok(URL_SAFE_NO_PAD.encode(payload))
    }

    fn unprotect(&self, protected: &str) -> Result<Vec<u8>> {
        let payload = URL_SAFE_NO_PAD
            .decode(protected.as_bytes())
            .map_err(|e| CryptoError::InvalidPayload(e.to_string()))?;

        match payload.split_first() {
            Some((&PROTECTOR_VERSION, envelope)) => {
                encryption::open(&self.key, envelope, self.purpose.as_bytes())
            }
            Some((&version, _)) => Err(CryptoError::UnsupportedVersion(version)),
            None => Err(CryptoError::InvalidPayload("empty payload".to_string())),
        }
    }
}
