//! wa-whatsapp: WhatsApp Cloud API integration for wa-bridge
//!
//! This crate holds everything that speaks the platform's language:
//! the Graph API client used to send messages, the webhook wire types,
//! the verification handshake, payload signature checks and the reply
//! policies applied to inbound messages.

pub mod api;
pub mod error;
pub mod handler;
pub mod security;
pub mod types;
pub mod webhook;

pub use api::{GraphClient, MessageSender};
pub use error::{Result, WhatsAppError};
pub use handler::{DeliveryOutcome, WebhookHandler};
pub use types::{InboundText, SendMessageRequest, TextMessage, WebhookPayload};
pub use webhook::VerifyQuery;
