//! OpenID Connect protocol messages.
//!
//! A [`ProtocolMessage`] is the parameter bag exchanged with the identity
//! provider: built outbound for authorization and end-session requests, or
//! parsed from the form body the provider posts back to the callback.

use crate::constants::parameters;
use std::collections::BTreeMap;

/// Protocol parameters plus the endpoint they are addressed to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolMessage {
    issuer_address: String,
    parameters: BTreeMap<String, String>,
}

impl ProtocolMessage {
    /// Create an empty outbound message addressed to `issuer_address`
    pub fn new(issuer_address: impl Into<String>) -> Self {
        Self {
            issuer_address: issuer_address.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` body
    ///
    /// When a parameter repeats, the first occurrence wins.
    pub fn from_form(body: &[u8]) -> Self {
        let mut parameters = BTreeMap::new();
        for (name, value) in url::form_urlencoded::parse(body) {
            parameters
                .entry(name.into_owned())
                .or_insert_with(|| value.into_owned());
        }

        Self {
            issuer_address: String::new(),
            parameters,
        }
    }

    /// Parse a query string (without the leading `?`)
    pub fn from_query(query: &str) -> Self {
        Self::from_form(query.trim_start_matches('?').as_bytes())
    }

    /// Endpoint the message is addressed to
    pub fn issuer_address(&self) -> &str {
        &self.issuer_address
    }

    /// Re-address the message
    pub fn set_issuer_address(&mut self, issuer_address: impl Into<String>) {
        self.issuer_address = issuer_address.into();
    }

    /// Raw parameter value
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Set a parameter; an empty value removes it
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            self.parameters.remove(&name);
        } else {
            self.parameters.insert(name, value);
        }
    }

    /// Set a parameter when `value` is present
    pub fn set_optional(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.set_parameter(name, value);
        }
    }

    /// Remove a parameter, returning its previous value
    pub fn remove_parameter(&mut self, name: &str) -> Option<String> {
        self.parameters.remove(name)
    }

    /// All parameters in name order
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the message carries no parameters
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    fn non_empty(&self, name: &str) -> Option<&str> {
        self.parameter(name).filter(|v| !v.trim().is_empty())
    }

    /// `client_id`
    pub fn client_id(&self) -> Option<&str> {
        self.non_empty(parameters::CLIENT_ID)
    }

    /// `redirect_uri`
    pub fn redirect_uri(&self) -> Option<&str> {
        self.non_empty(parameters::REDIRECT_URI)
    }

    /// `post_logout_redirect_uri`
    pub fn post_logout_redirect_uri(&self) -> Option<&str> {
        self.non_empty(parameters::POST_LOGOUT_REDIRECT_URI)
    }

    /// `response_type`
    pub fn response_type(&self) -> Option<&str> {
        self.non_empty(parameters::RESPONSE_TYPE)
    }

    /// `scope`
    pub fn scope(&self) -> Option<&str> {
        self.non_empty(parameters::SCOPE)
    }

    /// `state`
    pub fn state(&self) -> Option<&str> {
        self.non_empty(parameters::STATE)
    }

    /// `nonce`
    pub fn nonce(&self) -> Option<&str> {
        self.non_empty(parameters::NONCE)
    }

    /// `id_token`
    pub fn id_token(&self) -> Option<&str> {
        self.non_empty(parameters::ID_TOKEN)
    }

    /// `code`
    pub fn code(&self) -> Option<&str> {
        self.non_empty(parameters::CODE)
    }

    /// `error`
    pub fn error(&self) -> Option<&str> {
        self.non_empty(parameters::ERROR)
    }

    /// `error_description`
    pub fn error_description(&self) -> Option<&str> {
        self.non_empty(parameters::ERROR_DESCRIPTION)
    }

    /// `error_uri`
    pub fn error_uri(&self) -> Option<&str> {
        self.non_empty(parameters::ERROR_URI)
    }

    /// `session_state`
    pub fn session_state(&self) -> Option<&str> {
        self.non_empty(parameters::SESSION_STATE)
    }

    /// Build the authorization request URL
    pub fn create_authentication_request_url(&self) -> String {
        self.build_redirect_url()
    }

    /// Build the end-session request URL
    pub fn create_logout_request_url(&self) -> String {
        self.build_redirect_url()
    }

    fn build_redirect_url(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.parameters.iter())
            .finish();

        if query.is_empty() {
            return self.issuer_address.clone();
        }

        let separator = if self.issuer_address.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.issuer_address, separator, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_form_parses_callback_body() {
        let body = b"id_token=eyJ.a.b&state=OpenIdConnect.AuthenticationProperties%3Dabc&session_state=xyz";
        let message = ProtocolMessage::from_form(body);

        assert_eq!(message.id_token(), Some("eyJ.a.b"));
        assert_eq!(
            message.state(),
            Some("OpenIdConnect.AuthenticationProperties=abc")
        );
        assert_eq!(message.session_state(), Some("xyz"));
        assert_eq!(message.code(), None);
    }

    #[test]
    fn test_first_duplicate_parameter_wins() {
        let message = ProtocolMessage::from_form(b"code=first&code=second");
        assert_eq!(message.code(), Some("first"));
    }

    #[test]
    fn test_blank_values_read_as_absent() {
        let message = ProtocolMessage::from_form(b"state=&error=%20");
        assert_eq!(message.state(), None);
        assert_eq!(message.error(), None);
        assert_eq!(message.parameter("state"), Some(""));
    }

    #[test]
    fn test_set_parameter_empty_removes() {
        let mut message = ProtocolMessage::new("https://idp.example.com/authorize");
        message.set_parameter(parameters::SCOPE, "openid");
        message.set_parameter(parameters::SCOPE, "");
        assert!(message.is_empty());
    }

    #[test]
    fn test_build_redirect_url() {
        let mut message = ProtocolMessage::new("https://idp.example.com/authorize");
        message.set_parameter(parameters::CLIENT_ID, "client 1");
        message.set_parameter(parameters::STATE, "key=value&x");

        let url = message.create_authentication_request_url();
        assert_eq!(
            url,
            "https://idp.example.com/authorize?client_id=client+1&state=key%3Dvalue%26x"
        );
    }

    #[test]
    fn test_build_redirect_url_appends_to_existing_query() {
        let mut message = ProtocolMessage::new("https://idp.example.com/logout?tenant=a");
        message.set_parameter(parameters::POST_LOGOUT_REDIRECT_URI, "https://app/");

        assert_eq!(
            message.create_logout_request_url(),
            "https://idp.example.com/logout?tenant=a&post_logout_redirect_uri=https%3A%2F%2Fapp%2F"
        );
    }

    #[test]
    fn test_build_redirect_url_without_parameters() {
        let message = ProtocolMessage::new("https://idp.example.com/logout");
        assert_eq!(message.create_logout_request_url(), "https://idp.example.com/logout");
    }

    #[test]
    fn test_from_query_strips_question_mark() {
        let message = ProtocolMessage::from_query("?error=access_denied");
        assert_eq!(message.error(), Some("access_denied"));
    }
}
