//! HTTP API handlers
//!
//! Webhook endpoints called by the platform and the send endpoint called by
//! the hosting application.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use wa_whatsapp::security::{SIGNATURE_HEADER, verify_signature};
use wa_whatsapp::webhook::verify_subscription;
use wa_whatsapp::{
    DeliveryOutcome, SendMessageRequest, TextMessage, VerifyQuery, WebhookPayload, WhatsAppError,
};

use crate::error::{ApiError, Result};
use crate::server::AppState;

/// Echo policy response
#[derive(Debug, Serialize)]
pub struct ReceivedResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
}

/// Extract-only policy response
#[derive(Debug, Serialize)]
pub struct ExtractedResponse {
    pub message: String,
}

/// Health check
pub async fn health() -> &'static str {
    "OK"
}

/// Webhook verification handshake
///
/// Echoes `challenge` back as plain text when mode and token check out.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<String> {
    let challenge = verify_subscription(&query, &state.config.whatsapp.verify_token)?;
    Ok(challenge)
}

/// Webhook event delivery
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    if let Some(secret) = state.config.whatsapp.app_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if signature.is_empty() {
            warn!("Webhook delivery without {} header", SIGNATURE_HEADER);
            return Err(ApiError::Unauthorized);
        }
        if !verify_signature(signature, &body, secret) {
            return Err(ApiError::Unauthorized);
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        warn!("Malformed webhook payload: {}", e);
        WhatsAppError::InvalidPayload(format!("Invalid JSON payload: {}", e))
    })?;

    debug!("Webhook payload: {}", String::from_utf8_lossy(&body));

    let outcome = state.webhook.process(&payload).await?;

    let response = match outcome {
        DeliveryOutcome::Ignored => serde_json::to_value(ReceivedResponse {
            status: "ignored",
            acknowledged: None,
            failed: None,
        }),
        DeliveryOutcome::Acknowledged {
            acknowledged,
            failed,
        } => serde_json::to_value(ReceivedResponse {
            status: "received",
            acknowledged: Some(acknowledged),
            failed: Some(failed),
        }),
        DeliveryOutcome::Extracted { message } => {
            serde_json::to_value(ExtractedResponse { message })
        }
    }
    .map_err(|e| ApiError::BadGateway(e.to_string()))?;

    Ok(Json(response))
}

/// Send a text message through the platform
///
/// A 200 from the platform is returned as-is; any other status comes back
/// unchanged with the raw body in `detail`.
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Value>> {
    info!("Send request for {}", request.to);

    let message = TextMessage::from(request);
    let reply = state
        .sender
        .send_text(&state.config.whatsapp.phone_number_id, &message)
        .await?;

    Ok(Json(reply))
}
