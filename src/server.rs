//! HTTPS server for the webhook

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tracing::{error, info};

use crate::webhook::{webhook_router, WebhookState};
use crate::{Error, Result};

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind the server
    pub addr: SocketAddr,
    /// TLS certificate PEM file
    pub cert_path: PathBuf,
    /// TLS private key PEM file
    pub key_path: PathBuf,
    /// How long in-flight admissions may drain after a shutdown signal
    pub shutdown_timeout: Duration,
}

/// Load the serving certificate and key
///
/// Failure here is fatal: the API server only talks to the webhook over TLS.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig> {
    for (what, path) in [("certificate", cert_path), ("private key", key_path)] {
        if !path.exists() {
            return Err(Error::tls(format!(
                "{what} file not found: {}",
                path.display()
            )));
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| Error::tls(format!("failed to load key pair: {e}")))
}

/// Start the webhook server and serve until SIGINT or SIGTERM
pub async fn start_server(config: ServerConfig, state: Arc<WebhookState>) -> Result<()> {
    let tls_config = load_tls_config(&config.cert_path, &config.key_path).await?;
    let app = webhook_router(state);

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone(), config.shutdown_timeout));

    info!(addr = %config.addr, "Starting trace webhook server");

    axum_server::bind_rustls(config.addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|e| Error::server(format!("failed to listen and serve: {e}")))?;

    info!("Trace webhook server stopped");
    Ok(())
}

/// Wait for a shutdown signal, then drain the server
async fn shutdown_on_signal(handle: Handle, timeout: Duration) {
    shutdown_signal().await;
    info!(
        timeout_secs = timeout.as_secs(),
        "Got OS shutdown signal, shutting down webhook server gracefully"
    );
    handle.graceful_shutdown(Some(timeout));
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
