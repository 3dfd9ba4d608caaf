//! wa-api: HTTP surface of wa-bridge
//!
//! Exposes the webhook endpoints the platform calls and the send endpoint
//! the hosting application calls. Built with axum.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, create_router, start_server};
