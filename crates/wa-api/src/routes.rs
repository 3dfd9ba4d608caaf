//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{health, receive_webhook, send_message, verify_webhook};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Platform callbacks: verification handshake and event delivery
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        // Outbound send, reachable with or without the trailing slash
        .route("/send-whatsapp-message/", post(send_message))
        .route("/send-whatsapp-message", post(send_message))
}
