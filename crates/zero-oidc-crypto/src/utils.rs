//! Common utility functions.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current Unix timestamp in seconds.
///
/// # Panics
///
/// Panics if the system time is set before the Unix epoch (January 1, 1970).
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time is before Unix epoch")
        .as_secs()
}

/// Short BLAKE3 fingerprint of a secret value, safe to put in logs.
pub fn fingerprint_for_log(value: &str) -> String {
    let hash = blake3::hash(value.as_bytes());
    hex::encode(&hash.as_bytes()[..8])
}
