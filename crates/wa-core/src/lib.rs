//! wa-core: shared configuration and error types for wa-bridge
//!
//! Everything here is loaded once at startup and then only read.

pub mod config;
pub mod error;

pub use config::{Config, GraphConfig, ReplyPolicy, ServerConfig, WebhookConfig, WhatsAppConfig};
pub use error::{Error, Result};
