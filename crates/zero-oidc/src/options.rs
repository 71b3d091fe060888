//! Relying-party options and their builder.

use crate::{
    configuration::{CachedConfigurationManager, ConfigurationManager, HttpConfigurationRetriever},
    constants::*,
    data_format::SecureDataFormat,
    errors::*,
    nonce::{CacheNonceStore, CookieNonceStore, NonceCache, NonceStore},
    notifications::{NoOpNotifications, OidcNotifications},
    state::StateCodec,
    tokens::{
        DefaultProtocolValidator, JwtTokenValidator, ProtocolValidator, TokenValidationParameters,
        TokenValidator,
    },
};
use std::sync::Arc;
use zero_oidc_crypto::{AeadDataProtector, DataProtector, PURPOSE_NONCE, PURPOSE_STATE};

/// Everything the flows need, assembled once at startup
#[derive(Clone)]
pub struct OidcOptions {
    /// Authentication type stamped on principals
    pub authentication_type: String,
    /// OAuth client identifier
    pub client_id: String,
    /// Default `redirect_uri` for authorization requests
    pub redirect_uri: Option<String>,
    /// Default `post_logout_redirect_uri` for end-session requests
    pub post_logout_redirect_uri: Option<String>,
    /// `response_type`
    pub response_type: String,
    /// `response_mode`
    pub response_mode: Option<String>,
    /// `scope`
    pub scope: String,
    /// `resource`
    pub resource: Option<String>,
    /// Only requests on this path (below the path base) are callbacks
    pub callback_path: Option<String>,
    /// Fall back to the current request URL as `redirect_uri`
    pub use_current_uri_as_redirect: bool,
    /// Copy the token's validity window into the ticket
    pub use_token_lifetime: bool,
    /// Request a configuration refresh when the signing key is unknown
    pub refresh_on_issuer_key_not_found: bool,
    /// Fail instead of warning when an outbound redirect URL is malformed
    pub reject_malformed_redirects: bool,
    /// Encodes properties into `state`
    pub state_codec: StateCodec,
    /// Nonce strategy
    pub nonce_store: Arc<dyn NonceStore>,
    /// Provider configuration source
    pub configuration_manager: Arc<dyn ConfigurationManager>,
    /// Base token validation parameters (cloned per request)
    pub token_validation_parameters: TokenValidationParameters,
    /// Token validators, tried in order
    pub token_validators: Vec<Arc<dyn TokenValidator>>,
    /// Protocol-level id token checks
    pub protocol_validator: Arc<dyn ProtocolValidator>,
    /// Extension hooks
    pub notifications: Arc<dyn OidcNotifications>,
}

impl OidcOptions {
    /// Start building options for `client_id`
    pub fn builder(client_id: impl Into<String>) -> OidcOptionsBuilder {
        OidcOptionsBuilder::new(client_id)
    }

    /// Whether `response_type` asks for an authorization code
    pub fn requests_code(&self) -> bool {
        self.response_type
            .split_whitespace()
            .any(|t| t == parameters::CODE)
    }
}

impl std::fmt::Debug for OidcOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcOptions")
            .field("authentication_type", &self.authentication_type)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("post_logout_redirect_uri", &self.post_logout_redirect_uri)
            .field("response_type", &self.response_type)
            .field("response_mode", &self.response_mode)
            .field("scope", &self.scope)
            .field("callback_path", &self.callback_path)
            .field("token_validators", &self.token_validators.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`OidcOptions`]
pub struct OidcOptionsBuilder {
    client_id: String,
    authentication_type: String,
    authority: Option<String>,
    metadata_address: Option<String>,
    configuration_manager: Option<Arc<dyn ConfigurationManager>>,
    redirect_uri: Option<String>,
    post_logout_redirect_uri: Option<String>,
    response_type: String,
    response_mode: Option<String>,
    scope: String,
    resource: Option<String>,
    callback_path: Option<String>,
    use_current_uri_as_redirect: bool,
    use_token_lifetime: bool,
    refresh_on_issuer_key_not_found: bool,
    reject_malformed_redirects: bool,
    data_protection_key: Option<[u8; 32]>,
    state_protector: Option<Arc<dyn DataProtector>>,
    nonce_protector: Option<Arc<dyn DataProtector>>,
    nonce_store: Option<Arc<dyn NonceStore>>,
    nonce_cache: Option<Arc<dyn NonceCache>>,
    nonce_cookie_prefix: String,
    nonce_lifetime: u64,
    token_validation_parameters: TokenValidationParameters,
    token_validators: Vec<Arc<dyn TokenValidator>>,
    protocol_validator: Option<Arc<dyn ProtocolValidator>>,
    notifications: Arc<dyn OidcNotifications>,
}

impl OidcOptionsBuilder {
    /// Builder with defaults for `client_id`
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            authentication_type: DEFAULT_AUTHENTICATION_TYPE.to_string(),
            authority: None,
            metadata_address: None,
            configuration_manager: None,
            redirect_uri: None,
            post_logout_redirect_uri: None,
            response_type: DEFAULT_RESPONSE_TYPE.to_string(),
            response_mode: Some(DEFAULT_RESPONSE_MODE.to_string()),
            scope: DEFAULT_SCOPE.to_string(),
            resource: None,
            callback_path: None,
            use_current_uri_as_redirect: false,
            use_token_lifetime: true,
            refresh_on_issuer_key_not_found: true,
            reject_malformed_redirects: false,
            data_protection_key: None,
            state_protector: None,
            nonce_protector: None,
            nonce_store: None,
            nonce_cache: None,
            nonce_cookie_prefix: NONCE_COOKIE_PREFIX.to_string(),
            nonce_lifetime: DEFAULT_NONCE_LIFETIME,
            token_validation_parameters: TokenValidationParameters::default(),
            token_validators: Vec::new(),
            protocol_validator: None,
            notifications: Arc::new(NoOpNotifications),
        }
    }

    /// Authentication type stamped on principals
    pub fn authentication_type(mut self, authentication_type: impl Into<String>) -> Self {
        self.authentication_type = authentication_type.into();
        self
    }

    /// Provider base URL; discovery is fetched from its well-known path
    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    /// Explicit discovery document URL
    pub fn metadata_address(mut self, metadata_address: impl Into<String>) -> Self {
        self.metadata_address = Some(metadata_address.into());
        self
    }

    /// Use a custom configuration source
    pub fn configuration_manager(mut self, manager: Arc<dyn ConfigurationManager>) -> Self {
        self.configuration_manager = Some(manager);
        self
    }

    /// Default `redirect_uri`
    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Default `post_logout_redirect_uri`
    pub fn post_logout_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.post_logout_redirect_uri = Some(uri.into());
        self
    }

    /// `response_type`
    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = response_type.into();
        self
    }

    /// `response_mode`; `None` omits the parameter
    pub fn response_mode(mut self, response_mode: Option<String>) -> Self {
        self.response_mode = response_mode;
        self
    }

    /// `scope`
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// `resource`
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Restrict callbacks to one path
    pub fn callback_path(mut self, callback_path: impl Into<String>) -> Self {
        self.callback_path = Some(callback_path.into());
        self
    }

    /// Fall back to the current request URL as `redirect_uri`
    pub fn use_current_uri_as_redirect(mut self, enabled: bool) -> Self {
        self.use_current_uri_as_redirect = enabled;
        self
    }

    /// Copy the token's validity window into the ticket
    pub fn use_token_lifetime(mut self, enabled: bool) -> Self {
        self.use_token_lifetime = enabled;
        self
    }

    /// Request a configuration refresh on unknown signing keys
    pub fn refresh_on_issuer_key_not_found(mut self, enabled: bool) -> Self {
        self.refresh_on_issuer_key_not_found = enabled;
        self
    }

    /// Fail on malformed outbound redirect URLs
    pub fn reject_malformed_redirects(mut self, enabled: bool) -> Self {
        self.reject_malformed_redirects = enabled;
        self
    }

    /// Master key the state and nonce protectors are derived from
    pub fn data_protection_key(mut self, key: [u8; 32]) -> Self {
        self.data_protection_key = Some(key);
        self
    }

    /// Custom protector for `state`
    pub fn state_protector(mut self, protector: Arc<dyn DataProtector>) -> Self {
        self.state_protector = Some(protector);
        self
    }

    /// Custom protector for nonce cookie names
    pub fn nonce_protector(mut self, protector: Arc<dyn DataProtector>) -> Self {
        self.nonce_protector = Some(protector);
        self
    }

    /// Keep nonces in a server-side cache instead of cookies
    pub fn nonce_cache(mut self, cache: Arc<dyn NonceCache>) -> Self {
        self.nonce_cache = Some(cache);
        self
    }

    /// Use a custom nonce strategy
    pub fn nonce_store(mut self, store: Arc<dyn NonceStore>) -> Self {
        self.nonce_store = Some(store);
        self
    }

    /// Nonce cookie name prefix
    pub fn nonce_cookie_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.nonce_cookie_prefix = prefix.into();
        self
    }

    /// Nonce lifetime in seconds
    pub fn nonce_lifetime(mut self, seconds: u64) -> Self {
        self.nonce_lifetime = seconds;
        self
    }

    /// Base token validation parameters
    pub fn token_validation_parameters(mut self, parameters: TokenValidationParameters) -> Self {
        self.token_validation_parameters = parameters;
        self
    }

    /// Append a token validator; the JWT validator is used when none is added
    pub fn token_validator(mut self, validator: Arc<dyn TokenValidator>) -> Self {
        self.token_validators.push(validator);
        self
    }

    /// Custom protocol validator
    pub fn protocol_validator(mut self, validator: Arc<dyn ProtocolValidator>) -> Self {
        self.protocol_validator = Some(validator);
        self
    }

    /// Extension hooks
    pub fn notifications(mut self, notifications: Arc<dyn OidcNotifications>) -> Self {
        self.notifications = notifications;
        self
    }

    /// Validate and assemble the options
    pub fn build(self) -> Result<OidcOptions> {
        if self.client_id.trim().is_empty() {
            return Err(OidcError::InvalidOptions("client_id is required".to_string()));
        }
        if self.response_type.trim().is_empty() {
            return Err(OidcError::InvalidOptions("response_type is required".to_string()));
        }
        if self.nonce_store.is_some() && self.nonce_cache.is_some() {
            return Err(OidcError::InvalidOptions(
                "nonce_store and nonce_cache are mutually exclusive".to_string(),
            ));
        }

        let configuration_manager = match self.configuration_manager {
            Some(manager) => manager,
            None => {
                let retriever = match (&self.metadata_address, &self.authority) {
                    (Some(address), _) => HttpConfigurationRetriever::new(address.clone()),
                    (None, Some(authority)) => HttpConfigurationRetriever::from_authority(authority),
                    (None, None) => {
                        return Err(OidcError::InvalidOptions(
                            "one of configuration_manager, metadata_address or authority is required"
                                .to_string(),
                        ))
                    }
                };
                Arc::new(CachedConfigurationManager::new(retriever))
            }
        };

        let state_protector = match self.state_protector {
            Some(protector) => protector,
            None => derive_protector(&self.data_protection_key, PURPOSE_STATE, &self.authentication_type)?,
        };
        let state_codec = StateCodec::new(SecureDataFormat::new(state_protector));

        let nonce_store: Arc<dyn NonceStore> = match (self.nonce_store, self.nonce_cache) {
            (Some(store), _) => store,
            (None, Some(cache)) => Arc::new(CacheNonceStore::new(cache, self.nonce_lifetime)),
            (None, None) => {
                let protector = match self.nonce_protector {
                    Some(protector) => protector,
                    None => derive_protector(
                        &self.data_protection_key,
                        PURPOSE_NONCE,
                        &self.authentication_type,
                    )?,
                };
                Arc::new(CookieNonceStore::new(
                    SecureDataFormat::new(protector),
                    self.nonce_cookie_prefix,
                    self.nonce_lifetime,
                ))
            }
        };

        let mut token_validation_parameters = self.token_validation_parameters;
        if token_validation_parameters.valid_audiences.is_empty() {
            token_validation_parameters
                .valid_audiences
                .push(self.client_id.clone());
        }
        token_validation_parameters.authentication_type = self.authentication_type.clone();

        let token_validators = if self.token_validators.is_empty() {
            vec![Arc::new(JwtTokenValidator::new()) as Arc<dyn TokenValidator>]
        } else {
            self.token_validators
        };

        let protocol_validator = self.protocol_validator.unwrap_or_else(|| {
            Arc::new(DefaultProtocolValidator {
                nonce_lifetime: self.nonce_lifetime,
                ..Default::default()
            })
        });

        Ok(OidcOptions {
            authentication_type: self.authentication_type,
            client_id: self.client_id,
            redirect_uri: self.redirect_uri,
            post_logout_redirect_uri: self.post_logout_redirect_uri,
            response_type: self.response_type,
            response_mode: self.response_mode,
            scope: self.scope,
            resource: self.resource,
            callback_path: self.callback_path,
            use_current_uri_as_redirect: self.use_current_uri_as_redirect,
            use_token_lifetime: self.use_token_lifetime,
            refresh_on_issuer_key_not_found: self.refresh_on_issuer_key_not_found,
            reject_malformed_redirects: self.reject_malformed_redirects,
            state_codec,
            nonce_store,
            configuration_manager,
            token_validation_parameters,
            token_validators,
            protocol_validator,
            notifications: self.notifications,
        })
    }
}

/// Protector for `purpose`, scoped to the authentication type
fn derive_protector(
    key: &Option<[u8; 32]>,
    purpose: &str,
    authentication_type: &str,
) -> Result<Arc<dyn DataProtector>> {
    let key = key.ok_or_else(|| {
        OidcError::InvalidOptions(format!(
            "data_protection_key is required for '{}' without a custom protector",
            purpose
        ))
    })?;
    let protector = AeadDataProtector::new(key, purpose)?.create_protector(authentication_type)?;
    Ok(Arc::new(protector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{OidcConfiguration, StaticConfigurationManager};
    use crate::nonce::InMemoryNonceCache;

    fn manager() -> Arc<dyn ConfigurationManager> {
        Arc::new(StaticConfigurationManager::new(OidcConfiguration::default()))
    }

    #[test]
    fn test_defaults() {
        let options = OidcOptions::builder("client-1")
            .configuration_manager(manager())
            .data_protection_key([1u8; 32])
            .build()
            .unwrap();

        assert_eq!(options.authentication_type, "OpenIdConnect");
        assert_eq!(options.response_type, "code id_token");
        assert_eq!(options.response_mode.as_deref(), Some("form_post"));
        assert_eq!(options.scope, "openid profile");
        assert!(options.use_token_lifetime);
        assert!(options.refresh_on_issuer_key_not_found);
        assert!(!options.use_current_uri_as_redirect);
        assert!(!options.reject_malformed_redirects);
        assert!(options.requests_code());
        assert_eq!(options.token_validators.len(), 1);
        assert!(options.protocol_validator.require_nonce());
        assert_eq!(
            options.token_validation_parameters.valid_audiences,
            vec!["client-1"]
        );
    }

    #[test]
    fn test_requires_client_id() {
        let result = OidcOptions::builder("  ")
            .configuration_manager(manager())
            .data_protection_key([1u8; 32])
            .build();
        assert!(matches!(result, Err(OidcError::InvalidOptions(_))));
    }

    #[test]
    fn test_requires_configuration_source() {
        let result = OidcOptions::builder("client-1")
            .data_protection_key([1u8; 32])
            .build();
        assert!(matches!(result, Err(OidcError::InvalidOptions(_))));

        let from_authority = OidcOptions::builder("client-1")
            .authority("https://idp.example.com")
            .data_protection_key([1u8; 32])
            .build();
        assert!(from_authority.is_ok());
    }

    #[test]
    fn test_requires_protection_key() {
        let result = OidcOptions::builder("client-1")
            .configuration_manager(manager())
            .build();
        assert!(matches!(result, Err(OidcError::InvalidOptions(_))));
    }

    #[test]
    fn test_nonce_strategies_are_exclusive() {
        let cache: Arc<dyn NonceCache> = Arc::new(InMemoryNonceCache::new());
        let store: Arc<dyn NonceStore> =
            Arc::new(CacheNonceStore::new(Arc::clone(&cache), 60));

        let result = OidcOptions::builder("client-1")
            .configuration_manager(manager())
            .data_protection_key([1u8; 32])
            .nonce_cache(cache)
            .nonce_store(store)
            .build();
        assert!(matches!(result, Err(OidcError::InvalidOptions(_))));
    }

    #[test]
    fn test_requests_code() {
        let options = OidcOptions::builder("client-1")
            .configuration_manager(manager())
            .data_protection_key([1u8; 32])
            .response_type("id_token")
            .build()
            .unwrap();
        assert!(!options.requests_code());
    }
}
