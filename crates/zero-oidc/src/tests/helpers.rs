//! Shared fixtures for flow tests.

use crate::tokens::protocol::compute_left_half_hash;
use crate::*;
use async_trait::async_trait;
use http::Method;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zero_oidc_crypto::current_timestamp;

pub const ISSUER: &str = "https://idp.example.com";
pub const CLIENT_ID: &str = "client-1";
pub const KID: &str = "k1";
pub const SECRET: &[u8] = b"an-hmac-secret-of-reasonable-length";
pub const AUTHORIZATION_ENDPOINT: &str = "https://idp.example.com/authorize";
pub const END_SESSION_ENDPOINT: &str = "https://idp.example.com/logout";
pub const CHECK_SESSION_IFRAME: &str = "https://idp.example.com/checksession";
pub const APP_HOST: &str = "app.example.com";
pub const CALLBACK_PATH: &str = "/signin-oidc";
pub const REDIRECT_URI: &str = "https://app.example.com/signin-oidc";

/// Ordered record of observable events shared across mocks
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn record(log: &EventLog, event: impl Into<String>) {
    log.lock().unwrap().push(event.into());
}

pub fn test_configuration() -> OidcConfiguration {
    OidcConfiguration {
        issuer: ISSUER.to_string(),
        authorization_endpoint: AUTHORIZATION_ENDPOINT.to_string(),
        end_session_endpoint: Some(END_SESSION_ENDPOINT.to_string()),
        check_session_iframe: Some(CHECK_SESSION_IFRAME.to_string()),
        signing_keys: JwksKeySet {
            keys: vec![JwksKey::symmetric(KID, SECRET)],
        },
        ..Default::default()
    }
}

/// Options wired to a static configuration and the default validators
pub fn create_test_options() -> OidcOptionsBuilder {
    OidcOptions::builder(CLIENT_ID)
        .configuration_manager(Arc::new(StaticConfigurationManager::new(
            test_configuration(),
        )))
        .redirect_uri(REDIRECT_URI)
        .data_protection_key([42u8; 32])
}

pub fn create_test_handler(builder: OidcOptionsBuilder) -> OidcHandler {
    OidcHandler::new(builder.build().unwrap())
}

/// Standard id token claims, valid for ten minutes
pub fn id_token_claims(nonce: Option<&str>, code: Option<&str>) -> Value {
    let now = current_timestamp();
    let mut claims = json!({
        "iss": ISSUER,
        "sub": "user-123",
        "aud": CLIENT_ID,
        "exp": now + 600,
        "iat": now,
        "name": "Test User",
    });
    if let Some(nonce) = nonce {
        claims["nonce"] = json!(nonce);
    }
    if let Some(code) = code {
        claims["c_hash"] = json!(compute_left_half_hash(Algorithm::HS256, code));
    }
    claims
}

pub fn mint_id_token_with_kid(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_secret(SECRET)).unwrap()
}

pub fn mint_id_token(claims: &Value) -> String {
    mint_id_token_with_kid(KID, claims)
}

/// GET request for an application page
pub fn page_request(path: &str) -> HttpRequest {
    HttpRequest::new(Method::GET, "https", APP_HOST, path)
}

/// Run a challenge and parse the authorization request it redirected to
pub async fn run_challenge(
    handler: &OidcHandler,
    challenge: Challenge,
) -> (HttpExchange, ProtocolMessage) {
    let mut exchange = HttpExchange::new(page_request("/account"));
    handler.challenge(&mut exchange, challenge).await.unwrap();

    let location = exchange
        .response
        .location
        .clone()
        .expect("challenge should redirect");
    let query = location.split_once('?').map(|(_, q)| q).unwrap_or_default();
    let message = ProtocolMessage::from_query(query);
    (exchange, message)
}

/// Form-post callback carrying `params` and every cookie set by `previous`
pub fn callback_request(params: &[(&str, &str)], previous: Option<&HttpResponse>) -> HttpRequest {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().copied())
        .finish();
    let mut request =
        HttpRequest::new(Method::POST, "https", APP_HOST, CALLBACK_PATH).with_form_body(body);

    if let Some(previous) = previous {
        for cookie in &previous.cookies {
            if !cookie.value().is_empty() {
                request = request.with_cookie(cookie.name(), cookie.value());
            }
        }
    }
    request
}

/// Hook set that records every call and answers with preset outcomes
pub struct RecordingNotifications {
    pub log: EventLog,
    pub message_received: HookOutcome<AuthenticationTicket>,
    pub token_received: HookOutcome<AuthenticationTicket>,
    pub token_validated: HookOutcome<AuthenticationTicket>,
    pub code_received: HookOutcome<AuthenticationTicket>,
    pub redirect: HookOutcome<()>,
    pub failed: HookOutcome<AuthenticationTicket>,
}

impl RecordingNotifications {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            message_received: HookOutcome::Continue,
            token_received: HookOutcome::Continue,
            token_validated: HookOutcome::Continue,
            code_received: HookOutcome::Continue,
            redirect: HookOutcome::Continue,
            failed: HookOutcome::Continue,
        }
    }
}

#[async_trait]
impl OidcNotifications for RecordingNotifications {
    async fn message_received(
        &self,
        _context: &mut MessageReceivedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        record(&self.log, "message_received");
        Ok(self.message_received.clone())
    }

    async fn security_token_received(
        &self,
        _context: &mut SecurityTokenReceivedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        record(&self.log, "security_token_received");
        Ok(self.token_received.clone())
    }

    async fn security_token_validated(
        &self,
        _context: &mut SecurityTokenValidatedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        record(&self.log, "security_token_validated");
        Ok(self.token_validated.clone())
    }

    async fn authorization_code_received(
        &self,
        context: &mut AuthorizationCodeReceivedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        record(&self.log, format!("authorization_code_received:{}", context.code));
        Ok(self.code_received.clone())
    }

    async fn redirect_to_identity_provider(
        &self,
        context: &mut RedirectContext<'_>,
    ) -> Result<HookOutcome<()>> {
        record(&self.log, format!("redirect:{:?}", context.kind));
        Ok(self.redirect.clone())
    }

    async fn authentication_failed(
        &self,
        context: &mut AuthenticationFailedContext<'_>,
    ) -> Result<HookOutcome<AuthenticationTicket>> {
        record(&self.log, format!("authentication_failed:{:?}", context.stage));
        Ok(self.failed.clone())
    }
}

/// Static configuration that records refresh requests
pub struct RecordingConfigurationManager {
    configuration: Arc<OidcConfiguration>,
    log: EventLog,
    pub refreshes: AtomicUsize,
}

impl RecordingConfigurationManager {
    pub fn new(configuration: OidcConfiguration, log: EventLog) -> Self {
        Self {
            configuration: Arc::new(configuration),
            log,
            refreshes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ConfigurationManager for RecordingConfigurationManager {
    async fn get_configuration(&self) -> Result<Arc<OidcConfiguration>> {
        Ok(Arc::clone(&self.configuration))
    }

    fn request_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        record(&self.log, "request_refresh");
    }
}

/// Configuration source that is always down
pub struct UnavailableConfigurationManager;

#[async_trait]
impl ConfigurationManager for UnavailableConfigurationManager {
    async fn get_configuration(&self) -> Result<Arc<OidcConfiguration>> {
        Err(OidcError::ConfigurationUnavailable(
            "metadata endpoint unreachable".to_string(),
        ))
    }

    fn request_refresh(&self) {}
}

/// Validator that accepts anything it is told to read and yields a non-JWT token
pub struct OpaqueTokenValidator {
    pub readable: bool,
    pub calls: AtomicUsize,
}

impl OpaqueTokenValidator {
    pub fn new(readable: bool) -> Self {
        Self {
            readable,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenValidator for OpaqueTokenValidator {
    fn can_read(&self, _token: &str) -> bool {
        self.readable
    }

    fn validate(
        &self,
        token: &str,
        parameters: &TokenValidationParameters,
    ) -> Result<(ClaimsPrincipal, SecurityToken)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((
            ClaimsPrincipal::new(parameters.authentication_type.clone()),
            SecurityToken::Opaque {
                token_type: "SAML2".to_string(),
                raw: token.to_string(),
            },
        ))
    }
}
