//! Protocol parameter names, well-known property keys and defaults.

/// OpenID Connect / OAuth 2.0 protocol parameter names
pub mod parameters {
    /// `client_id`
    pub const CLIENT_ID: &str = "client_id";
    /// `redirect_uri`
    pub const REDIRECT_URI: &str = "redirect_uri";
    /// `post_logout_redirect_uri`
    pub const POST_LOGOUT_REDIRECT_URI: &str = "post_logout_redirect_uri";
    /// `response_type`
    pub const RESPONSE_TYPE: &str = "response_type";
    /// `response_mode`
    pub const RESPONSE_MODE: &str = "response_mode";
    /// `scope`
    pub const SCOPE: &str = "scope";
    /// `resource`
    pub const RESOURCE: &str = "resource";
    /// `state`
    pub const STATE: &str = "state";
    /// `nonce`
    pub const NONCE: &str = "nonce";
    /// `id_token`
    pub const ID_TOKEN: &str = "id_token";
    /// `id_token_hint`
    pub const ID_TOKEN_HINT: &str = "id_token_hint";
    /// `code`
    pub const CODE: &str = "code";
    /// `error`
    pub const ERROR: &str = "error";
    /// `error_description`
    pub const ERROR_DESCRIPTION: &str = "error_description";
    /// `error_uri`
    pub const ERROR_URI: &str = "error_uri";
    /// `session_state`
    pub const SESSION_STATE: &str = "session_state";
}

/// Well-known [`AuthenticationProperties`](crate::AuthenticationProperties) keys
pub mod property_keys {
    /// Where to send the user agent after a completed login or logout
    pub const REDIRECT_URI: &str = ".redirect";
    /// Ticket issue time (Unix seconds)
    pub const ISSUED_UTC: &str = ".issued";
    /// Ticket expiry time (Unix seconds)
    pub const EXPIRES_UTC: &str = ".expires";
    /// Whether the ticket may be refreshed
    pub const ALLOW_REFRESH: &str = ".refresh";
    /// `redirect_uri` sent with the authorization request; needed to redeem the code
    pub const CODE_REDIRECT_URI: &str = "oidc.code.redirect_uri";
    /// `session_state` returned by the provider
    pub const SESSION_STATE: &str = "oidc.session.session_state";
    /// Provider `check_session_iframe` endpoint
    pub const CHECK_SESSION_IFRAME: &str = "oidc.session.check_session_iframe";
}

/// Key marker that prefixes the protected properties inside `state`
pub const STATE_PROPERTIES_KEY: &str = "OpenIdConnect.AuthenticationProperties";

/// Default authentication type stamped on principals
pub const DEFAULT_AUTHENTICATION_TYPE: &str = "OpenIdConnect";

/// Default `response_type`
pub const DEFAULT_RESPONSE_TYPE: &str = "code id_token";

/// Default `response_mode`
pub const DEFAULT_RESPONSE_MODE: &str = "form_post";

/// Default `scope`
pub const DEFAULT_SCOPE: &str = "openid profile";

/// Prefix of nonce cookie names
pub const NONCE_COOKIE_PREFIX: &str = "zero-oidc.nonce.";

/// Constant value stored in nonce cookies
pub const NONCE_COOKIE_VALUE: &str = "N";

/// Default nonce lifetime in seconds (1 hour)
pub const DEFAULT_NONCE_LIFETIME: u64 = 3600;

/// Default clock skew tolerated when validating token lifetimes (5 minutes)
pub const DEFAULT_CLOCK_SKEW: u64 = 300;

/// Default interval after which cached configuration is re-fetched (24 hours)
pub const DEFAULT_AUTOMATIC_REFRESH_INTERVAL: u64 = 86_400;

/// Form content type accepted on the callback endpoint
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
