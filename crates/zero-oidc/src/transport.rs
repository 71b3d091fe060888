//! Transport boundary.
//!
//! The relying party never touches a concrete HTTP stack. Hosts translate
//! their requests into an [`HttpRequest`], run a flow against an
//! [`HttpExchange`], then apply the resulting [`HttpResponse`] (status,
//! `Location`, `Set-Cookie`) to whatever they answer with.

use crate::constants::FORM_CONTENT_TYPE;
use cookie::{time::Duration, Cookie, SameSite};
use http::{Method, StatusCode};
use std::collections::BTreeMap;

/// Inbound request as seen by the relying party
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// `http` or `https`
    pub scheme: String,
    /// Host header value (may include a port)
    pub host: String,
    /// Mount point of the application, e.g. `/app` (empty at the root)
    pub path_base: String,
    /// Request path below `path_base`
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    /// `Content-Type` header value
    pub content_type: Option<String>,
    /// Buffered request body
    pub body: Vec<u8>,
    /// Request cookies by name
    pub cookies: BTreeMap<String, String>,
}

impl HttpRequest {
    /// Create a request for `method` on `scheme://host/path`
    pub fn new(method: Method, scheme: &str, host: &str, path: &str) -> Self {
        Self {
            method,
            scheme: scheme.to_string(),
            host: host.to_string(),
            path_base: String::new(),
            path: path.to_string(),
            query: None,
            content_type: None,
            body: Vec::new(),
            cookies: BTreeMap::new(),
        }
    }

    /// Attach a form-encoded body
    pub fn with_form_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.content_type = Some(FORM_CONTENT_TYPE.to_string());
        self.body = body.into();
        self
    }

    /// Attach a query string
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Attach a cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Parse a `Cookie` request header into the cookie map
    ///
    /// Unparseable pairs are ignored.
    pub fn add_cookie_header(&mut self, header: &str) {
        for cookie in Cookie::split_parse(header.to_string()).flatten() {
            self.cookies
                .insert(cookie.name().to_string(), cookie.value().to_string());
        }
    }

    /// Whether the request arrived over TLS
    pub fn is_secure(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }

    /// `scheme://host/path_base`
    pub fn base_uri(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.path_base)
    }

    /// Full URL of the current request, including the query string
    pub fn current_uri(&self) -> String {
        match self.query.as_deref().filter(|q| !q.is_empty()) {
            Some(query) => format!("{}{}?{}", self.base_uri(), self.path, query),
            None => format!("{}{}", self.base_uri(), self.path),
        }
    }

    /// `POST` with a form-urlencoded body
    pub fn is_form_post(&self) -> bool {
        if self.method != Method::POST {
            return false;
        }

        self.content_type
            .as_deref()
            .map(|ct| {
                ct.split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .eq_ignore_ascii_case(FORM_CONTENT_TYPE)
            })
            .unwrap_or(false)
            && !self.body.is_empty()
    }

    /// Cookies whose name starts with `prefix`
    pub fn cookies_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.cookies
            .iter()
            .filter(move |(name, _)| name.starts_with(prefix))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Outbound response effects produced by a flow
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code to send
    pub status: StatusCode,
    /// Redirect target, if any
    pub location: Option<String>,
    /// Cookies to set or delete, in the order they were added
    pub cookies: Vec<Cookie<'static>>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            location: None,
            cookies: Vec::new(),
        }
    }
}

impl HttpResponse {
    /// Turn the response into a `302 Found` redirect
    pub fn redirect(&mut self, location: impl Into<String>) {
        self.status = StatusCode::FOUND;
        self.location = Some(location.into());
    }

    /// Set the status code
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Queue a cookie
    pub fn append_cookie(&mut self, cookie: Cookie<'static>) {
        self.cookies.push(cookie);
    }

    /// Queue a removal cookie for `name`
    pub fn delete_cookie(&mut self, name: &str) {
        let mut cookie = Cookie::build((name.to_string(), ""))
            .path("/")
            .http_only(true)
            .build();
        cookie.make_removal();
        self.cookies.push(cookie);
    }

    /// Cookie most recently queued under `name`
    pub fn cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.iter().rev().find(|c| c.name() == name)
    }

    /// Rendered `Set-Cookie` header values
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.cookies.iter().map(ToString::to_string).collect()
    }
}

/// Build the cookie the nonce strategy stores in the user agent
pub(crate) fn nonce_cookie(name: String, value: &str, secure: bool, lifetime: u64) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .max_age(Duration::seconds(lifetime as i64))
        .build()
}

/// One request/response pair flowing through the relying party
#[derive(Debug, Clone)]
pub struct HttpExchange {
    /// Inbound request
    pub request: HttpRequest,
    /// Outbound effects
    pub response: HttpResponse,
}

impl HttpExchange {
    /// Wrap a request with an empty response
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            response: HttpResponse::default(),
        }
    }
}
