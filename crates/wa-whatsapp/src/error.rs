//! Error types for wa-whatsapp

use thiserror::Error;

/// wa-whatsapp error type
#[derive(Error, Debug)]
pub enum WhatsAppError {
    #[error("Missing webhook verification parameters")]
    MissingVerificationParams,

    #[error("Webhook verification failed")]
    VerificationFailed,

    #[error("Webhook signature verification failed")]
    SignatureVerificationFailed,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("No messages found")]
    NoMessages,

    /// Non-200 answer from the Graph API, kept as-is
    #[error("WhatsApp API returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid WhatsApp API response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for WhatsAppError {
    fn from(err: reqwest::Error) -> Self {
        WhatsAppError::Http(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, WhatsAppError>;
