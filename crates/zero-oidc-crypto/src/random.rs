//! Random material for AEAD nonces and OIDC nonces.

use crate::{constants::*, errors::*};
use rand::RngCore;

/// Generate a random 24-byte XChaCha20-Poly1305 nonce
pub fn generate_nonce() -> Result<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng()
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;
    Ok(nonce)
}

/// Generate `N` random bytes
pub fn generate_random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate cryptographically secure nonce for OIDC
///
/// 64 hex characters (32 random bytes).
pub fn generate_oidc_nonce() -> String {
    hex::encode(generate_random_bytes::<OIDC_NONCE_SIZE>())
}
