//! Flow orchestrator.
//!
//! [`OidcHandler`] drives the three flows of the relying party:
//!
//! - [`OidcHandler::challenge`]: redirect to the provider's authorization endpoint
//! - [`OidcHandler::authenticate`]: process the provider's callback into a ticket
//! - [`OidcHandler::sign_out`]: redirect to the provider's end-session endpoint
//!
//! The handler holds no per-request state; one instance serves every request
//! concurrently.

mod callback;
mod challenge;
mod signout;

pub use challenge::Challenge;

use crate::options::OidcOptions;
use std::sync::Arc;

/// OpenID Connect relying-party flow orchestrator
#[derive(Debug, Clone)]
pub struct OidcHandler {
    options: Arc<OidcOptions>,
}

impl OidcHandler {
    /// Create a handler over `options`
    pub fn new(options: OidcOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    /// Options this handler runs with
    pub fn options(&self) -> &OidcOptions {
        &self.options
    }
}
