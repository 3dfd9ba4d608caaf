//! WhatsApp Cloud API wire types
//!
//! Inbound types mirror the webhook notification layout. Every level is
//! optional so that partial or unexpected payloads deserialize instead of
//! failing; callers walk them with `Option` combinators.

use serde::{Deserialize, Serialize};

/// `messaging_product` value for every outbound envelope
pub const MESSAGING_PRODUCT: &str = "whatsapp";

// =============================================================================
// Inbound webhook notifications
// =============================================================================

/// Top-level webhook notification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Usually `whatsapp_business_account`
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

impl WebhookPayload {
    /// Whether the `object` tag is present and non-empty
    pub fn has_object(&self) -> bool {
        self.object.as_deref().is_some_and(|object| !object.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Change {
    /// Subscription field, `messages` for message and status notifications
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<ChangeValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messaging_product: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub statuses: Option<Vec<Status>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub display_phone_number: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
}

/// Inbound message; only text messages carry `text`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub msg_type: Option<String>,
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub body: Option<String>,
}

/// Delivery status update for a message we sent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
}

/// A text message pulled out of a webhook payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    /// Business number the message was sent to, from the change metadata
    pub phone_number_id: Option<String>,
    /// Sender's WhatsApp ID
    pub from: String,
    pub body: String,
}

// =============================================================================
// Outbound messages
// =============================================================================

/// Body accepted by the send endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub to: String,
    pub body: String,
    #[serde(default)]
    pub preview_url: bool,
}

/// Text message envelope posted to `/{phone_number_id}/messages`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextMessage {
    pub messaging_product: String,
    pub recipient_type: String,
    pub to: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: TextBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBody {
    pub preview_url: bool,
    pub body: String,
}

impl TextMessage {
    /// Build an individual text message
    pub fn new(to: impl Into<String>, body: impl Into<String>, preview_url: bool) -> Self {
        Self {
            messaging_product: MESSAGING_PRODUCT.to_string(),
            recipient_type: "individual".to_string(),
            to: to.into(),
            message_type: "text".to_string(),
            text: TextBody {
                preview_url,
                body: body.into(),
            },
        }
    }
}

impl From<SendMessageRequest> for TextMessage {
    fn from(request: SendMessageRequest) -> Self {
        Self::new(request.to, request.body, request.preview_url)
    }
}
