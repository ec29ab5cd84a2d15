//! Trace Webhook - injects span contexts into Pods at admission time

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trace_webhook::config::Config;
use trace_webhook::server::{start_server, ServerConfig};
use trace_webhook::trace::SpanContextMinter;
use trace_webhook::webhook::WebhookState;
use trace_webhook::{DEFAULT_CERT_PATH, DEFAULT_CONFIG_PATH, DEFAULT_KEY_PATH, DEFAULT_WEBHOOK_PORT};

/// Trace Webhook - mutating admission webhook that embeds span contexts in Pods
#[derive(Parser, Debug)]
#[command(name = "trace-webhook", version, about, long_about = None)]
struct Cli {
    /// Path that points to the YAML configuration for this webhook
    #[arg(long, env = "WEBHOOK_CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    /// TLS certificate served to the API server
    #[arg(long, default_value = DEFAULT_CERT_PATH)]
    cert_path: PathBuf,

    /// TLS private key for the serving certificate
    #[arg(long, default_value = DEFAULT_KEY_PATH)]
    key_path: PathBuf,

    /// HTTPS port to listen on
    #[arg(long, default_value_t = DEFAULT_WEBHOOK_PORT)]
    port: u16,

    /// Seconds in-flight admissions may take to drain on shutdown
    #[arg(long, default_value = "10")]
    shutdown_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install crypto provider before any TLS configuration is built
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("CRITICAL: Failed to install crypto provider: {:?}", e);
        std::process::exit(1);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Parse and validate configuration; an invalid rate never reaches the sampler
    let config = Config::load_from_path(&cli.config_path)
        .await
        .map_err(|e| anyhow::anyhow!("configuration parse failed: {}", e))?;
    let rate = config
        .validate()
        .map_err(|e| anyhow::anyhow!("configuration validation failed: {}", e))?;

    info!(config_path = %cli.config_path.display(), "Configuration loaded");

    let state = Arc::new(WebhookState::new(SpanContextMinter::new(rate)));
    info!(
        sample_rate = state.minter.sample_rate().get(),
        "Span context minter ready"
    );

    let server_config = ServerConfig {
        addr: SocketAddr::from(([0, 0, 0, 0], cli.port)),
        cert_path: cli.cert_path,
        key_path: cli.key_path,
        shutdown_timeout: Duration::from_secs(cli.shutdown_timeout_secs),
    };

    start_server(server_config, state)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
}
