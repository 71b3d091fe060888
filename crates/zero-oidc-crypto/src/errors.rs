//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic operation errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key size
    #[error("Invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize {
        /// Expected key size in bytes
        expected: usize,
        /// Actual key size in bytes
        actual: usize,
    },

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (tampered payload, wrong key or wrong purpose)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// HKDF expansion failed
    #[error("HKDF error")]
    HkdfError,

    /// Random number generation failed
    #[error("Random number generation failed: {0}")]
    RandomGenerationFailed(String),

    /// Protected payload is not valid base64url or is truncated
    #[error("Invalid protected payload: {0}")]
    InvalidPayload(String),

    /// Protected payload was produced by an unknown format version
    #[error("Unsupported payload version: {0}")]
    UnsupportedVersion(u8),
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;
