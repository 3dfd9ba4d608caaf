//! Inbound message handling
//!
//! Applies the configured [`ReplyPolicy`] to a webhook payload. Acknowledging a
//! message is its own operation ([`WebhookHandler::acknowledge`]) so callers
//! and tests can drive it directly.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use wa_core::{Config, ReplyPolicy};

use crate::api::MessageSender;
use crate::error::{Result, WhatsAppError};
use crate::types::{InboundText, TextMessage, WebhookPayload};
use crate::webhook::{count_statuses, extract_text_messages};

/// Prefix put in front of echoed message bodies
pub const ACK_PREFIX: &str = "Ack: ";

/// Text sent back for an inbound message body
pub fn ack_text(body: &str) -> String {
    format!("{}{}", ACK_PREFIX, body)
}

/// Result of processing one webhook delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Payload had no `object` tag; nothing was looked at
    Ignored,
    /// Echo policy: how many acknowledgements went out and how many failed
    Acknowledged { acknowledged: usize, failed: usize },
    /// Extract-only policy: body of the last text message
    Extracted { message: String },
}

/// Applies the reply policy to inbound webhook payloads
pub struct WebhookHandler {
    sender: Arc<dyn MessageSender>,
    policy: ReplyPolicy,
    default_phone_number_id: String,
}

impl WebhookHandler {
    /// Create a new handler
    pub fn new(
        sender: Arc<dyn MessageSender>,
        policy: ReplyPolicy,
        default_phone_number_id: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            policy,
            default_phone_number_id: default_phone_number_id.into(),
        }
    }

    /// Create a handler using the configured policy and sender number
    pub fn from_config(config: &Config, sender: Arc<dyn MessageSender>) -> Self {
        Self::new(
            sender,
            config.webhook.policy,
            config.whatsapp.phone_number_id.clone(),
        )
    }

    pub fn policy(&self) -> ReplyPolicy {
        self.policy
    }

    /// Reply to one inbound message with `Ack: <text>`
    ///
    /// The reply goes out from the number the message was addressed to, or
    /// from the configured number when the payload did not say.
    pub async fn acknowledge(&self, inbound: &InboundText) -> Result<Value> {
        let phone_number_id = inbound
            .phone_number_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.default_phone_number_id);

        let reply = TextMessage::new(inbound.from.as_str(), ack_text(&inbound.body), false);
        self.sender.send_text(phone_number_id, &reply).await
    }

    /// Process a webhook payload according to the policy
    ///
    /// Under [`ReplyPolicy::ExtractOnly`] a payload without any text message
    /// yields [`WhatsAppError::NoMessages`].
    pub async fn process(&self, payload: &WebhookPayload) -> Result<DeliveryOutcome> {
        if !payload.has_object() {
            warn!("Webhook payload without object tag, skipping");
            return match self.policy {
                ReplyPolicy::Echo => Ok(DeliveryOutcome::Ignored),
                ReplyPolicy::ExtractOnly => Err(WhatsAppError::NoMessages),
            };
        }

        let statuses = count_statuses(payload);
        if statuses > 0 {
            debug!("Ignoring {} status update(s)", statuses);
        }

        let messages = extract_text_messages(payload);

        match self.policy {
            ReplyPolicy::ExtractOnly => messages
                .into_iter()
                .last()
                .map(|inbound| DeliveryOutcome::Extracted {
                    message: inbound.body,
                })
                .ok_or(WhatsAppError::NoMessages),
            ReplyPolicy::Echo => {
                let mut acknowledged = 0;
                let mut failed = 0;

                for inbound in &messages {
                    info!("Received message from {}", inbound.from);
                    match self.acknowledge(inbound).await {
                        Ok(_) => acknowledged += 1,
                        Err(e) => {
                            // Keep going; the remaining messages still get their ack.
                            error!("Failed to acknowledge message from {}: {}", inbound.from, e);
                            failed += 1;
                        }
                    }
                }

                Ok(DeliveryOutcome::Acknowledged {
                    acknowledged,
                    failed,
                })
            }
        }
    }
}
