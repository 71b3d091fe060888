//! # zero-oidc-crypto
//!
//! Cryptographic primitives for the zero-oidc relying party.
//!
//! This crate provides the "protect/unprotect" capability the relying party
//! uses for its `state` parameter and nonce cookies, plus the random material
//! and timestamps the protocol flows depend on.
//!
//! ## Security Properties
//!
//! - Protected payloads are authenticated (XChaCha20-Poly1305)
//! - Each consumer gets its own key, derived with HKDF-SHA256 from a purpose string
//! - Key material is zeroized on drop
//! - No unsafe code

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod derivation;
pub mod encryption;
pub mod errors;
pub mod protector;
pub mod random;
pub mod utils;

pub use constants::*;
pub use derivation::*;
pub use encryption::*;
pub use errors::{CryptoError, Result};
pub use protector::{AeadDataProtector, DataProtector};
pub use random::*;
pub use utils::*;
