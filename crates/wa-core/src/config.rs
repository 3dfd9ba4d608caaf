//! Configuration management
//!
//! Settings are read in this order, later sources winning:
//! 1. built-in defaults
//! 2. `wa-bridge.toml` (or the file passed with `--config`)
//! 3. environment variables
//!
//! Inside the TOML file `${VAR_NAME}` is replaced with the environment value.
//! The resulting [`Config`] is immutable and shared by reference for the
//! lifetime of the process.

use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "wa-bridge.toml";

/// What the webhook receiver does with inbound text messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyPolicy {
    /// Reply to every inbound text with `Ack: <text>`
    #[default]
    Echo,
    /// Do not call the platform; hand the last message body back to the caller
    ExtractOnly,
}

impl FromStr for ReplyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "echo" | "ack" => Ok(Self::Echo),
            "extract-only" | "extract_only" | "extract" => Ok(Self::ExtractOnly),
            other => Err(Error::Config(format!(
                "unknown webhook policy '{}' (expected 'echo' or 'extract-only')",
                other
            ))),
        }
    }
}

impl fmt::Display for ReplyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Echo => write!(f, "echo"),
            Self::ExtractOnly => write!(f, "extract-only"),
        }
    }
}

/// WhatsApp Business credentials
#[derive(Clone, Default)]
pub struct WhatsAppConfig {
    /// Bearer token for the Graph API
    pub access_token: String,

    /// Token the platform echoes during the verification handshake
    pub verify_token: String,

    /// Phone-number identifier outbound messages are sent from
    pub phone_number_id: String,

    /// App secret for `X-Hub-Signature-256` checks; no check when unset
    pub app_secret: Option<String>,
}

impl fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("access_token", &"***")
            .field("verify_token", &"***")
            .field("phone_number_id", &self.phone_number_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Graph API endpoint settings
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Base URL, without version
    pub base_url: String,

    /// Versioned path segment, e.g. `v18.0`
    pub version: String,

    /// Upper bound for every outbound call, in seconds
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_graph_base_url(),
            version: default_graph_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GraphConfig {
    /// Timeout applied to outbound calls
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Send-message endpoint for the given phone-number identifier
    pub fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.version.trim_matches('/'),
            phone_number_id
        )
    }
}

/// Webhook receiver settings
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookConfig {
    pub policy: ReplyPolicy,
}

/// Listen address
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen address: {}", e)))
    }
}

/// Main configuration for wa-bridge
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub whatsapp: WhatsAppConfig,
    pub graph: GraphConfig,
    pub webhook: WebhookConfig,
    pub server: ServerConfig,
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_graph_version() -> String {
    "v18.0".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// Load configuration from `path`, the default file, or the environment only
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(DEFAULT_CONFIG_FILE)
            }
            None => Self::from_env(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Build configuration from defaults plus whatever `lookup` provides
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        cfg.apply_overrides(&lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a TOML config file; environment variables still take precedence
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&content, env_lookup)
    }

    /// Parse TOML content, expanding `${VAR}` and applying overrides via `lookup`
    pub fn from_toml_str<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_env_vars(content, &lookup);
        let toml: TomlConfig = toml::from_str(&expanded)?;

        let mut cfg = Self::from_toml_config(toml)?;
        cfg.apply_overrides(&lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_toml_config(toml: TomlConfig) -> Result<Self> {
        let whatsapp = toml.whatsapp.unwrap_or_default();
        let graph = toml.graph.unwrap_or_default();
        let webhook = toml.webhook.unwrap_or_default();
        let server = toml.server.unwrap_or_default();

        let policy = match webhook.policy {
            Some(policy) => policy.parse()?,
            None => ReplyPolicy::default(),
        };

        Ok(Config {
            whatsapp: WhatsAppConfig {
                access_token: whatsapp.access_token.unwrap_or_default(),
                verify_token: whatsapp.verify_token.unwrap_or_default(),
                phone_number_id: whatsapp.phone_number_id.unwrap_or_default(),
                app_secret: whatsapp.app_secret.filter(|s| !s.is_empty()),
            },
            graph: GraphConfig {
                base_url: graph.base_url.unwrap_or_else(default_graph_base_url),
                version: graph.version.unwrap_or_else(default_graph_version),
                timeout_secs: graph.timeout_secs.unwrap_or_else(default_timeout_secs),
            },
            webhook: WebhookConfig { policy },
            server: ServerConfig {
                host: server.host.unwrap_or_else(default_host),
                port: server.port.unwrap_or_else(default_port),
            },
        })
    }

    /// Overwrite fields with the values `lookup` knows about
    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("WHATSAPP_ACCESS_TOKEN").or_else(|| get("WHATSAPP_TOKEN")) {
            self.whatsapp.access_token = token;
        }
        if let Some(token) = get("VERIFY_TOKEN") {
            self.whatsapp.verify_token = token;
        }
        if let Some(id) = get("FROM_PHONE_NUMBER_ID") {
            self.whatsapp.phone_number_id = id;
        }
        if let Some(secret) = get("WHATSAPP_APP_SECRET") {
            self.whatsapp.app_secret = Some(secret);
        }

        if let Some(base_url) = get("GRAPH_API_BASE") {
            self.graph.base_url = base_url;
        }
        if let Some(version) = get("GRAPH_API_VERSION") {
            self.graph.version = version;
        }
        if let Some(secs) = get("GRAPH_TIMEOUT_SECS") {
            self.graph.timeout_secs = secs.trim().parse().map_err(|_| {
                Error::Config(format!("GRAPH_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }

        if let Some(policy) = get("WEBHOOK_POLICY") {
            self.webhook.policy = policy.parse()?;
        }

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {}", port)))?;
        }

        Ok(())
    }

    /// Reject configurations the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("WHATSAPP_ACCESS_TOKEN", &self.whatsapp.access_token),
            ("VERIFY_TOKEN", &self.whatsapp.verify_token),
            ("FROM_PHONE_NUMBER_ID", &self.whatsapp.phone_number_id),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(Error::Config(format!("{} not set", missing.join(", "))));
        }

        if self.graph.timeout_secs == 0 {
            return Err(Error::Config(
                "GRAPH_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Replace `${VAR_NAME}` with the value from `lookup`; unknown names become empty
fn expand_env_vars<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end) => {
                if let Some(env_value) = lookup(&after[..end]) {
                    result.push_str(&env_value);
                }
                rest = &after[end + 1..];
            }
            None => {
                // unterminated, keep verbatim
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    result
}

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    whatsapp: Option<TomlWhatsAppConfig>,
    graph: Option<TomlGraphConfig>,
    webhook: Option<TomlWebhookConfig>,
    server: Option<TomlServerConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlWhatsAppConfig {
    access_token: Option<String>,
    verify_token: Option<String>,
    phone_number_id: Option<String>,
    app_secret: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlGraphConfig {
    base_url: Option<String>,
    version: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlWebhookConfig {
    policy: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServerConfig {
    host: Option<String>,
    port: Option<u16>,
}
