//! Error types for wa-api

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use wa_whatsapp::WhatsAppError;

/// wa-api error type, rendered as `{"detail": ...}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Platform answered with a non-200 status; passed through unchanged
    #[error("Upstream error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Bad gateway: {0}")]
    BadGateway(String),
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl From<WhatsAppError> for ApiError {
    fn from(err: WhatsAppError) -> Self {
        match err {
            WhatsAppError::MissingVerificationParams => ApiError::BadRequest(err.to_string()),
            WhatsAppError::VerificationFailed => ApiError::Forbidden,
            WhatsAppError::SignatureVerificationFailed => ApiError::Unauthorized,
            WhatsAppError::InvalidPayload(msg) => ApiError::BadRequest(msg),
            WhatsAppError::NoMessages => ApiError::NotFound(err.to_string()),
            WhatsAppError::Upstream { status, body } => ApiError::Upstream { status, body },
            WhatsAppError::InvalidResponse(msg) | WhatsAppError::Http(msg) => {
                ApiError::BadGateway(msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream { status, body } => (upstream_status(status), body),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Platform status as our own; informational or invalid codes become 502
fn upstream_status(status: u16) -> StatusCode {
    match StatusCode::from_u16(status) {
        Ok(code) if !code.is_informational() => code,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_error_mapping() {
        assert!(matches!(
            ApiError::from(WhatsAppError::MissingVerificationParams),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(WhatsAppError::VerificationFailed),
            ApiError::Forbidden
        ));
        assert!(matches!(
            ApiError::from(WhatsAppError::NoMessages),
            ApiError::NotFound(ref msg) if msg == "No messages found"
        ));
        assert!(matches!(
            ApiError::from(WhatsAppError::Http("timed out".to_string())),
            ApiError::BadGateway(_)
        ));
    }

    #[test]
    fn test_upstream_status_passthrough() {
        let response = ApiError::Upstream {
            status: 201,
            body: "raw".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = ApiError::Upstream {
            status: 429,
            body: "slow down".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_upstream_status_invalid() {
        assert_eq!(upstream_status(100), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream_status(42), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream_status(503), StatusCode::SERVICE_UNAVAILABLE);
    }
}
