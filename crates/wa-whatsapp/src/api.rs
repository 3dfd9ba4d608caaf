//! WhatsApp Cloud (Graph) API client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info};

use wa_core::{Config, GraphConfig};

use crate::error::{Result, WhatsAppError};
use crate::types::TextMessage;

/// Anything that can deliver a text message through the platform
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `message` from `phone_number_id` and return the platform's JSON reply
    async fn send_text(&self, phone_number_id: &str, message: &TextMessage) -> Result<Value>;
}

/// Graph API client authenticated with a bearer token
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    graph: GraphConfig,
    access_token: String,
}

impl GraphClient {
    /// Create a client with the configured timeout applied to every call
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.graph.timeout()).build()?;

        Ok(Self {
            client,
            graph: config.graph.clone(),
            access_token: config.whatsapp.access_token.clone(),
        })
    }
}

#[async_trait]
impl MessageSender for GraphClient {
    async fn send_text(&self, phone_number_id: &str, message: &TextMessage) -> Result<Value> {
        let url = self.graph.messages_url(phone_number_id);

        debug!("Sending message to {} from {}", message.to, phone_number_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Anything but a plain 200 is handed back untouched.
        if status != StatusCode::OK {
            error!("WhatsApp API error: {} - {}", status, body);
            return Err(WhatsAppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let reply: Value = serde_json::from_str(&body)
            .map_err(|e| WhatsAppError::InvalidResponse(e.to_string()))?;

        info!("Message sent to {}", message.to);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::HeaderMap,
        routing::post,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use wa_core::ReplyPolicy;

    use crate::handler::{DeliveryOutcome, WebhookHandler};
    use crate::types::WebhookPayload;

    /// What the fake Graph endpoint saw
    #[derive(Debug, Clone)]
    struct Captured {
        version: String,
        phone_number_id: String,
        authorization: Option<String>,
        body: Value,
    }

    #[derive(Clone)]
    struct FakeGraph {
        status: u16,
        reply: String,
        captured: Arc<Mutex<Vec<Captured>>>,
    }

    async fn fake_messages(
        State(fake): State<FakeGraph>,
        Path((version, phone_number_id)): Path<(String, String)>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (axum::http::StatusCode, String) {
        fake.captured.lock().unwrap().push(Captured {
            version,
            phone_number_id,
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
        (
            axum::http::StatusCode::from_u16(fake.status).unwrap(),
            fake.reply.clone(),
        )
    }

    async fn spawn_fake_graph(status: u16, reply: &str) -> (Config, Arc<Mutex<Vec<Captured>>>) {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let fake = FakeGraph {
            status,
            reply: reply.to_string(),
            captured: Arc::clone(&captured),
        };

        let app = Router::new()
            .route("/{version}/{phone_number_id}/messages", post(fake_messages))
            .with_state(fake);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = Config::default();
        config.whatsapp.access_token = "test-token".to_string();
        config.graph.base_url = format!("http://{}", addr);
        config.graph.version = "v18.0".to_string();

        (config, captured)
    }

    #[tokio::test]
    async fn test_send_text_success_returns_reply_verbatim() {
        let reply = r#"{"recipient_id":"1555000111","message_id":"wamid.abc"}"#;
        let (config, captured) = spawn_fake_graph(200, reply).await;
        let client = GraphClient::new(&config).unwrap();

        let message = TextMessage::new("1555000111", "hi", true);
        let result = client.send_text("pn-1", &message).await.unwrap();

        assert_eq!(result, serde_json::from_str::<Value>(reply).unwrap());
        assert_eq!(result["recipient_id"], "1555000111");
        assert_eq!(result["message_id"], "wamid.abc");

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].version, "v18.0");
        assert_eq!(captured[0].phone_number_id, "pn-1");
        assert_eq!(captured[0].authorization.as_deref(), Some("Bearer test-token"));
        assert_eq!(
            captured[0].body,
            json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": "1555000111",
                "type": "text",
                "text": {"preview_url": true, "body": "hi"}
            })
        );
    }

    #[tokio::test]
    async fn test_send_text_non_200_is_error() {
        let (config, _captured) = spawn_fake_graph(201, "created, but not what we expect").await;
        let client = GraphClient::new(&config).unwrap();

        let err = client
            .send_text("pn-1", &TextMessage::new("1555000111", "hi", false))
            .await
            .unwrap_err();

        match err {
            WhatsAppError::Upstream { status, body } => {
                assert_eq!(status, 201);
                assert_eq!(body, "created, but not what we expect");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_text_platform_error_body_kept() {
        let reply = r#"{"error":{"message":"Invalid OAuth access token.","code":190}}"#;
        let (config, _captured) = spawn_fake_graph(401, reply).await;
        let client = GraphClient::new(&config).unwrap();

        let err = client
            .send_text("pn-1", &TextMessage::new("1555000111", "hi", false))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WhatsAppError::Upstream { status: 401, ref body } if body == reply
        ));
    }

    /// Graph endpoint that answers only after `delay`
    async fn spawn_slow_graph(delay: Duration) -> Config {
        let app = Router::new().route(
            "/{version}/{phone_number_id}/messages",
            post(move || async move {
                tokio::time::sleep(delay).await;
                "{}"
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = Config::default();
        config.whatsapp.access_token = "test-token".to_string();
        config.graph.base_url = format!("http://{}", addr);
        config.graph.timeout_secs = 1;
        config
    }

    #[tokio::test]
    async fn test_send_text_times_out() {
        let config = spawn_slow_graph(Duration::from_secs(10)).await;
        let client = GraphClient::new(&config).unwrap();

        let started = Instant::now();
        let err = client
            .send_text("pn-1", &TextMessage::new("1555000111", "hi", false))
            .await
            .unwrap_err();

        assert!(matches!(err, WhatsAppError::Http(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_echo_counts_timed_out_ack_as_failed() {
        let config = spawn_slow_graph(Duration::from_secs(10)).await;
        let client = GraphClient::new(&config).unwrap();
        let handler = WebhookHandler::new(Arc::new(client), ReplyPolicy::Echo, "pn-1");

        let payload: WebhookPayload = serde_json::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {
                "messages": [{"from": "1555000111", "text": {"body": "hello"}}]
            }}]}]
        }))
        .unwrap();

        let started = Instant::now();
        let outcome = handler.process(&payload).await.unwrap();

        assert_eq!(
            outcome,
            DeliveryOutcome::Acknowledged {
                acknowledged: 0,
                failed: 1
            }
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_send_text_unreachable_platform() {
        let mut config = Config::default();
        config.whatsapp.access_token = "test-token".to_string();
        // Port 9 (discard) is not expected to be listening locally.
        config.graph.base_url = "http://127.0.0.1:9".to_string();
        config.graph.timeout_secs = 2;
        let client = GraphClient::new(&config).unwrap();

        let err = client
            .send_text("pn-1", &TextMessage::new("1555000111", "hi", false))
            .await
            .unwrap_err();

        assert!(matches!(err, WhatsAppError::Http(_)));
    }
}
