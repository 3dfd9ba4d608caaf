//! wa-gateway: WhatsApp webhook bridge binary
//!
//! Usage:
//!   wa-gateway                    - Start the HTTP server
//!   wa-gateway --config <path>    - Start with an explicit TOML config file
//!   wa-gateway --help             - Show help

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use wa_core::Config;

/// Run mode
#[derive(Debug, PartialEq)]
enum RunMode {
    /// Serve the webhook and send endpoints
    Server { config_path: Option<PathBuf> },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1))?;

    let config_path = match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("wa-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server { config_path } => config_path,
    };

    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .init();

    let config = Config::load(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting wa-gateway...");
    tracing::info!(
        "Graph API: {}/{}",
        config.graph.base_url,
        config.graph.version
    );
    if config.whatsapp.app_secret.is_none() {
        tracing::warn!("WHATSAPP_APP_SECRET not set, webhook signatures will not be checked");
    }

    run_server(config).await
}

/// Log filter from `RUST_LOG`-style directives, `info` when none are given
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> anyhow::Result<RunMode>
where
    I: IntoIterator<Item = String>,
{
    let mut config_path = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                config_path = Some(PathBuf::from(path));
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(RunMode::Server { config_path })
}

/// Print help message
fn print_help() {
    println!("wa-gateway - WhatsApp webhook bridge");
    println!();
    println!("Usage:");
    println!("  wa-gateway                   Start the HTTP server");
    println!("  wa-gateway --config <path>   Read settings from a TOML file");
    println!(
        "                               (default: {} if present)",
        wa_core::config::DEFAULT_CONFIG_FILE
    );
    println!("  wa-gateway --help            Show this help message");
    println!("  wa-gateway --version         Show version");
    println!();
    println!("Environment Variables:");
    println!("  WHATSAPP_ACCESS_TOKEN  Graph API access token (required)");
    println!("  VERIFY_TOKEN           Webhook verification token (required)");
    println!("  FROM_PHONE_NUMBER_ID   Sender phone number id (required)");
    println!("  WHATSAPP_APP_SECRET    App secret for X-Hub-Signature-256 checks");
    println!("  GRAPH_API_BASE         Graph API base URL (default: https://graph.facebook.com)");
    println!("  GRAPH_API_VERSION      Graph API version (default: v18.0)");
    println!("  GRAPH_TIMEOUT_SECS     Outbound request timeout (default: 10)");
    println!("  WEBHOOK_POLICY         echo or extract-only (default: echo)");
    println!("  HOST                   Listen address (default: 0.0.0.0)");
    println!("  PORT                   Listen port (default: 8000)");
    println!("  RUST_LOG               Log filter (default: info)");
}

/// Run the HTTP server until Ctrl+C or until it stops on its own
async fn run_server(config: Config) -> anyhow::Result<()> {
    let mut handle = tokio::spawn(wa_api::start_server(config));
    let abort = handle.abort_handle();

    tracing::info!("Press Ctrl+C to exit");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down...");
            abort.abort();
        }
        joined = &mut handle => {
            // Server only returns on bind or accept failure
            joined??;
        }
    }

    tracing::info!("wa-gateway stopped");
    Ok(())
}
