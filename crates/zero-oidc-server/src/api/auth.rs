use axum::{
    body::Body,
    extract::{Query, State},
    http::Request,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zero_oidc::{AuthenticationProperties, AuthenticationResult, AuthenticationTicket, Challenge};

use crate::{
    error::ApiError,
    state::AppState,
    transport::{apply_effects, exchange_from_request},
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Local path to land on after login
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogoutQuery {
    /// Local path to land on after the provider signs the user out
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketSummary {
    pub subject: Option<String>,
    pub name: Option<String>,
    pub authentication_type: Option<String>,
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    pub has_authorization_code: bool,
    pub claim_count: usize,
}

impl From<&AuthenticationTicket> for TicketSummary {
    fn from(ticket: &AuthenticationTicket) -> Self {
        let principal = ticket.principal.as_ref();
        Self {
            subject: principal.and_then(|p| p.subject()).map(str::to_string),
            name: principal.and_then(|p| p.find_first("name")).map(str::to_string),
            authentication_type: principal.map(|p| p.authentication_type.clone()),
            return_url: ticket.properties.redirect_uri().map(str::to_string),
            issued_at: ticket.properties.issued_utc(),
            expires_at: ticket.properties.expires_utc(),
            session_state: ticket
                .properties
                .get(zero_oidc::constants::property_keys::SESSION_STATE)
                .map(str::to_string),
            has_authorization_code: ticket.authorization_code.is_some(),
            claim_count: principal.map_or(0, |p| p.claims.len()),
        }
    }
}

/// Only same-site paths are accepted as a post-login destination
fn validate_return_url(return_url: &str) -> Result<(), ApiError> {
    if !return_url.starts_with('/') || return_url.starts_with("//") || return_url.contains('\\') {
        return Err(ApiError::InvalidRequest(
            "return_url must be a local path".to_string(),
        ));
    }
    Ok(())
}

/// Absolute post-logout destination on this host for a local `return_url`
fn post_logout_destination(base_uri: &str, return_url: &str) -> Result<String, ApiError> {
    validate_return_url(return_url)?;
    Ok(format!("{}{}", base_uri.trim_end_matches('/'), return_url))
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a login by redirecting to the identity provider
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
    request: Request<Body>,
) -> Result<Response, ApiError> {
    let challenge = match query.return_url {
        Some(return_url) => {
            validate_return_url(&return_url)?;
            Challenge::returning_to(return_url)
        }
        None => Challenge::returning_to("/"),
    };

    let mut exchange = exchange_from_request(request).await?;
    state.handler.challenge(&mut exchange, challenge).await?;

    Ok(apply_effects(&exchange.response, ().into_response()))
}

/// Receive the provider's form post
pub async fn callback(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Result<Response, ApiError> {
    let mut exchange = exchange_from_request(request).await?;

    let response = match state.handler.authenticate(&mut exchange).await {
        Ok(AuthenticationResult::Ticket(ticket)) => {
            let summary = TicketSummary::from(ticket.as_ref());
            tracing::info!(
                has_principal = summary.subject.is_some(),
                has_code = summary.has_authorization_code,
                "Login completed"
            );
            Json(summary).into_response()
        }
        Ok(AuthenticationResult::NoResult) => ApiError::Unauthorized.into_response(),
        Err(e) => ApiError::from(e).into_response(),
    };

    Ok(apply_effects(&exchange.response, response))
}

/// Sign out at the identity provider
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogoutQuery>,
    request: Request<Body>,
) -> Result<Response, ApiError> {
    let mut exchange = exchange_from_request(request).await?;
    let properties = query
        .return_url
        .map(|path| post_logout_destination(&exchange.request.base_uri(), &path))
        .transpose()?
        .map(AuthenticationProperties::with_redirect_uri);

    state
        .handler
        .sign_out(&mut exchange, properties.as_ref())
        .await?;

    Ok(apply_effects(&exchange.response, ().into_response()))
}
