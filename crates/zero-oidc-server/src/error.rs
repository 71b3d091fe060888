use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use zero_oidc::OidcError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Oidc(#[from] OidcError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg, None),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "No authentication result".to_string(),
                None,
            ),
            ApiError::Oidc(err) => oidc_parts(err),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

fn oidc_parts(err: OidcError) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    match err {
        OidcError::MalformedMessage(_) | OidcError::InvalidState(_) => {
            (StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.to_string(), None)
        }
        OidcError::ProtocolError {
            ref error,
            ref error_description,
            ref error_uri,
        } => {
            let details = serde_json::json!({
                "error": error,
                "error_description": error_description,
                "error_uri": error_uri,
            });
            (
                StatusCode::UNAUTHORIZED,
                "PROVIDER_ERROR",
                err.to_string(),
                Some(details),
            )
        }
        OidcError::UnsupportedTokenType(_)
        | OidcError::TokenValidationFailed(_)
        | OidcError::SignatureKeyNotFound { .. }
        | OidcError::InvalidSignature(_)
        | OidcError::TokenExpired(_)
        | OidcError::ProtocolViolation(_) => (
            StatusCode::UNAUTHORIZED,
            "AUTHENTICATION_FAILED",
            err.to_string(),
            None,
        ),
        OidcError::ConfigurationUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "PROVIDER_UNAVAILABLE",
            "Identity provider configuration is unavailable".to_string(),
            None,
        ),
        other => {
            tracing::error!(error = %other, "Relying-party failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            )
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}
