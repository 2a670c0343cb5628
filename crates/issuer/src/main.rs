//! `card-token-issuer` — issuance service binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise telemetry (JSON logs, optional OTLP export).
//! 3. Initialise the KMS-backed key service client.
//! 4. Build the issuance pipeline and Axum router.
//! 5. Start the HTTP server.

mod config;
mod issue;
mod server;
mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use config::Config;
use issue::TokenIssuer;
use server::state::AppState;
use vault::keysvc::{KeyService, KmsKeyService};

/// Service name reported in telemetry and health responses.
pub(crate) const SERVICE_NAME: &str = "card-token-issuer";

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
        "card-token-issuer starting"
    );

    // -----------------------------------------------------------------------
    // 3. Key service client
    // -----------------------------------------------------------------------
    let keysvc: Arc<dyn KeyService> =
        Arc::new(KmsKeyService::init(cfg.kms_endpoint_url.as_deref()).await);

    // -----------------------------------------------------------------------
    // 4. Pipeline and router
    // -----------------------------------------------------------------------
    let state = AppState::new(TokenIssuer::new(keysvc, &cfg));
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
