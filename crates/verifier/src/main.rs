//! `card-token-verifier` — verification service binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise telemetry (JSON logs, optional OTLP export).
//! 3. Initialise the KMS-backed key service client.
//! 4. Build the recovery pipeline and Axum router.
//! 5. Start the HTTP server.

mod config;
mod process;
mod server;
mod telemetry;
mod verify;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use config::Config;
use server::state::AppState;
use vault::keysvc::{KeyService, KmsKeyService};
use verify::TokenVerifier;

/// Service name reported in telemetry and health responses.
pub(crate) const SERVICE_NAME: &str = "card-token-verifier";

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(
        SERVICE_NAME,
        cfg.otel_exporter_otlp_endpoint.as_deref(),
        &cfg.log_level,
    )?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "card-token-verifier starting"
    );

    // -----------------------------------------------------------------------
    // 3. Key service client
    // -----------------------------------------------------------------------
    let keysvc: Arc<dyn KeyService> =
        Arc::new(KmsKeyService::init(cfg.kms_endpoint_url.as_deref()).await);

    // -----------------------------------------------------------------------
    // 4. Pipeline and router
    // -----------------------------------------------------------------------
    let state = AppState::new(TokenVerifier::new(keysvc, &cfg));
    let router = server::router::build(state);

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
