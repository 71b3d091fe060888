//! Provider configuration: discovery, JWKS and the snapshot cache.

pub mod discovery;
pub mod manager;
pub mod types;

pub use discovery::HttpConfigurationRetriever;
pub use manager::{
    CachedConfigurationManager, ConfigurationManager, ConfigurationRetriever,
    StaticConfigurationManager,
};
pub use types::{JwksKey, JwksKeySet, OidcConfiguration};
