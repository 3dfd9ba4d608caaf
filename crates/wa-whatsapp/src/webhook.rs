//! Webhook verification handshake and payload walking

use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::error::{Result, WhatsAppError};
use crate::types::{InboundText, WebhookPayload};

/// Mode the platform sends when subscribing a callback URL
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Query parameters of the verification handshake
///
/// Accepts both the plain names and the `hub.`-prefixed names Meta sends.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(alias = "hub.mode")]
    pub mode: Option<String>,
    #[serde(alias = "hub.verify_token")]
    pub token: Option<String>,
    #[serde(alias = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Check a verification request and return the challenge to echo back
///
/// - mode or token missing (or empty): [`WhatsAppError::MissingVerificationParams`]
/// - mode is not `subscribe` or token does not match: [`WhatsAppError::VerificationFailed`]
pub fn verify_subscription(query: &VerifyQuery, verify_token: &str) -> Result<String> {
    let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

    let (Some(mode), Some(token)) = (present(&query.mode), present(&query.token)) else {
        warn!("Webhook verification request without mode or token");
        return Err(WhatsAppError::MissingVerificationParams);
    };

    let token_matches: bool = token.as_bytes().ct_eq(verify_token.as_bytes()).into();
    if mode != SUBSCRIBE_MODE || !token_matches {
        warn!("Webhook verification failed: mode={}", mode);
        return Err(WhatsAppError::VerificationFailed);
    }

    let challenge = query.challenge.clone().ok_or_else(|| {
        warn!("Webhook verification request without challenge");
        WhatsAppError::MissingVerificationParams
    })?;

    info!("Webhook verified successfully");
    Ok(challenge)
}

/// Collect every text message in the payload, in delivery order
///
/// Changes without a value, values without messages and messages without a
/// sender or text body are skipped.
pub fn extract_text_messages(payload: &WebhookPayload) -> Vec<InboundText> {
    payload
        .entry
        .iter()
        .flat_map(|entry| &entry.changes)
        .filter_map(|change| change.value.as_ref())
        .flat_map(|value| {
            let phone_number_id = value
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.phone_number_id.clone());

            value
                .messages
                .iter()
                .flatten()
                .filter_map(move |message| {
                    let from = message.from.clone()?;
                    let body = message.text.as_ref()?.body.clone()?;
                    Some(InboundText {
                        phone_number_id: phone_number_id.clone(),
                        from,
                        body,
                    })
                })
        })
        .collect()
}

/// Number of delivery status updates in the payload
pub fn count_statuses(payload: &WebhookPayload) -> usize {
    payload
        .entry
        .iter()
        .flat_map(|entry| &entry.changes)
        .filter_map(|change| change.value.as_ref())
        .filter_map(|value| value.statuses.as_ref())
        .map(Vec::len)
        .sum()
}
