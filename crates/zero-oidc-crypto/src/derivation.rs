//! Per-purpose key derivation using HKDF-SHA256.

use crate::{constants::*, errors::*};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Derive the protector key for a purpose from the data protection master key
///
/// `purpose_key = HKDF-SHA256(ikm = master_key, info = DOMAIN_PROTECTOR ":" purpose)`
pub fn derive_purpose_key(
    master_key: &[u8; KEY_SIZE],
    purpose: &str,
) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let info = format!("{}:{}", DOMAIN_PROTECTOR, purpose);
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);

    Hkdf::<Sha256>::new(None, master_key)
        .expand(info.as_bytes(), &mut key[..])
        .map_err(|_| CryptoError::HkdfError)?;

    Ok(key)
}
