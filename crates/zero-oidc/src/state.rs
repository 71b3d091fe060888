//! State codec.
//!
//! The `state` protocol parameter has the shape
//! `…&OpenIdConnect.AuthenticationProperties=<url-escaped protected blob>&…`.
//! Callers may add their own parameters around the marker; decoding locates
//! the marker, takes the value up to the next `&`, unescapes it and
//! unprotects it. Any failure yields no properties at all.

use crate::{
    constants::STATE_PROPERTIES_KEY, data_format::PropertiesDataFormat, errors::*,
    properties::AuthenticationProperties,
};
use tracing::{debug, warn};
use zero_oidc_crypto::fingerprint_for_log;

/// Encodes properties into `state` and decodes them back
#[derive(Debug, Clone)]
pub struct StateCodec {
    format: PropertiesDataFormat,
}

impl StateCodec {
    /// Create a codec over a properties format
    pub fn new(format: PropertiesDataFormat) -> Self {
        Self { format }
    }

    /// Protect `properties` into an opaque string
    pub fn encode(&self, properties: &AuthenticationProperties) -> Result<String> {
        self.format.protect(properties)
    }

    /// Build the full `state` parameter value: `<marker>=<escaped blob>`
    pub fn to_state_parameter(&self, properties: &AuthenticationProperties) -> Result<String> {
        let protected = self.encode(properties)?;
        Ok(format!(
            "{}={}",
            STATE_PROPERTIES_KEY,
            urlencoding::encode(&protected)
        ))
    }

    /// Recover properties from a raw `state` value
    ///
    /// Returns `None` when the marker is absent, not followed by `=`, or the
    /// blob fails to unprotect.
    pub fn decode(&self, state: &str) -> Option<AuthenticationProperties> {
        let Some(candidate) = extract_properties_value(state) else {
            debug!(
                state_hash = %fingerprint_for_log(state),
                "State does not carry protected properties"
            );
            return None;
        };

        let unescaped = candidate.replace('+', " ");
        let unescaped = match urlencoding::decode(&unescaped) {
            Ok(value) => value.into_owned(),
            Err(e) => {
                warn!(
                    state_hash = %fingerprint_for_log(state),
                    error = %e,
                    "State properties are not valid percent-encoding"
                );
                return None;
            }
        };

        match self.format.unprotect(&unescaped) {
            Ok(properties) => Some(properties),
            Err(e) => {
                warn!(
                    state_hash = %fingerprint_for_log(state),
                    error = %e,
                    "Unable to unprotect state properties"
                );
                None
            }
        }
    }
}

/// Locate the protected properties blob inside a raw `state` value
fn extract_properties_value(state: &str) -> Option<&str> {
    if state.trim().is_empty() {
        return None;
    }

    let start = state.find(STATE_PROPERTIES_KEY)?;
    let rest = &state[start + STATE_PROPERTIES_KEY.len()..];
    let value = rest.strip_prefix('=')?;

    match value.find('&') {
        Some(end) => Some(&value[..end]),
        None => Some(value),
    }
}
