//! XChaCha20-Poly1305 sealing of protected payloads.
//!
//! A sealed envelope is `nonce (24 bytes) || ciphertext || tag (16 bytes)`.
//! The purpose string of the caller is bound in as associated data.

use crate::{constants::*, errors::*, random::generate_nonce};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};

/// Smallest well-formed envelope: a nonce and an empty message's tag
pub const MIN_SEALED_LEN: usize = NONCE_SIZE + TAG_SIZE;

/// Seal `plaintext` under `key` with a fresh random nonce
///
/// `aad` is authenticated but not encrypted. The nonce is prefixed to the
/// returned envelope.
pub fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let nonce = generate_nonce()?;
    let cipher = XChaCha20Poly1305::new(key.into());

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), Payload { msg: plaintext, aad })
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Open an envelope produced by [`seal`]
///
/// Any change to the envelope, or a different key or `aad`, fails with
/// [`CryptoError::DecryptionFailed`].
pub fn open(key: &[u8; KEY_SIZE], envelope: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < MIN_SEALED_LEN {
        return Err(CryptoError::InvalidPayload(format!(
            "sealed envelope too short: {} bytes",
            envelope.len()
        )));
    }

    let (nonce, ciphertext) = envelope.split_at(NONCE_SIZE);
    let cipher = XChaCha20Poly1305::new(key.into());

    cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}
