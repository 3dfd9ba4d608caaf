//! HTTP API Server
//!
//! Builds the router and runs the axum server.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use wa_core::Config;
use wa_whatsapp::{GraphClient, MessageSender, WebhookHandler};

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sender: Arc<dyn MessageSender>,
    pub webhook: Arc<WebhookHandler>,
}

impl AppState {
    /// Build state around any message sender
    pub fn new(config: Config, sender: Arc<dyn MessageSender>) -> Self {
        let webhook = WebhookHandler::from_config(&config, Arc::clone(&sender));
        Self {
            config: Arc::new(config),
            sender,
            webhook: Arc::new(webhook),
        }
    }

    /// Build state that talks to the Graph API
    pub fn from_config(config: Config) -> wa_whatsapp::Result<Self> {
        let client = GraphClient::new(&config)?;
        Ok(Self::new(config, Arc::new(client)))
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;
    let state = AppState::from_config(config)?;

    info!(
        "HTTP API listening on {} (webhook policy: {})",
        addr,
        state.webhook.policy()
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
