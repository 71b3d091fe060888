//! Mapping between axum requests/responses and the relying-party exchange.

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, HOST, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, Request, StatusCode,
    },
    response::Response,
};
use zero_oidc::{HttpExchange, HttpRequest, HttpResponse};

use crate::error::ApiError;

/// Largest callback body accepted
const MAX_BODY_BYTES: usize = 64 * 1024;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Buffer `request` into an exchange
///
/// The scheme comes from `X-Forwarded-Proto` when a proxy sets it.
pub async fn exchange_from_request(request: Request<Body>) -> Result<HttpExchange, ApiError> {
    let (parts, body) = request.into_parts();
    let headers = &parts.headers;

    let host = header_str(headers, HOST.as_str())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .ok_or_else(|| ApiError::InvalidRequest("missing Host header".to_string()))?
        .to_string();
    let scheme = header_str(headers, "x-forwarded-proto")
        .or_else(|| parts.uri.scheme_str())
        .unwrap_or("http")
        .to_string();

    let mut inbound = HttpRequest::new(parts.method.clone(), &scheme, &host, parts.uri.path());
    inbound.query = parts.uri.query().map(str::to_string);
    inbound.content_type = header_str(headers, CONTENT_TYPE.as_str()).map(str::to_string);
    for cookie_header in headers.get_all(COOKIE) {
        if let Ok(value) = cookie_header.to_str() {
            inbound.add_cookie_header(value);
        }
    }

    inbound.body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("unreadable body: {}", e)))?
        .to_vec();

    Ok(HttpExchange::new(inbound))
}

/// Copy status, `Location` and `Set-Cookie` from `effects` onto `response`
///
/// The status is only replaced when the flow set one other than `200 OK`.
pub fn apply_effects(effects: &HttpResponse, mut response: Response) -> Response {
    if effects.status != StatusCode::OK {
        *response.status_mut() = effects.status;
    }
    let headers = response.headers_mut();

    if let Some(location) = &effects.location {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                headers.insert(LOCATION, value);
            }
            Err(e) => tracing::warn!(error = %e, "Redirect location is not a valid header value"),
        }
    }

    for cookie in effects.set_cookie_headers() {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Dropping unrepresentable Set-Cookie header"),
        }
    }

    response
}
