//! Cryptographic constants and domain separation strings.
//!
//! Changing any of these invalidates every outstanding `state` value and
//! nonce cookie issued by a running deployment.

/// Size of data protection master keys and derived keys in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of XChaCha20-Poly1305 nonces in bytes (192 bits)
pub const NONCE_SIZE: usize = 24;

/// Size of XChaCha20-Poly1305 authentication tags in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Format version prefixed to every protected payload
pub const PROTECTOR_VERSION: u8 = 0x01;

/// Number of random bytes in an OIDC nonce
pub const OIDC_NONCE_SIZE: usize = 32;

/// Domain separation prefix for protector key derivation
pub const DOMAIN_PROTECTOR: &str = "zero-oidc:protector:v1";

/// Purpose string for the `state` parameter properties format
pub const PURPOSE_STATE: &str = "zero-oidc:state:v1";

/// Purpose string for nonce cookie names
pub const PURPOSE_NONCE: &str = "zero-oidc:nonce:v1";
