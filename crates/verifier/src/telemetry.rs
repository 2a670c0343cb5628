//! Telemetry initialisation: structured JSON logs, optional OTLP export.
//!
//! # Telemetry invariants
//!
//! - **No card data or key material** must appear in any span attribute or
//!   log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// Always installs a JSON-formatted log layer. When `otlp_endpoint` is set,
/// spans are additionally exported via OTLP/gRPC.
///
/// # Errors
///
/// Returns an error if the OTLP pipeline cannot be installed or a
/// subscriber has already been set.
pub fn init(
    service_name: &'static str,
    otlp_endpoint: Option<&str>,
    log_level: &str,
) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json());

    match otlp_endpoint {
        Some(endpoint) => {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint),
                )
                .with_trace_config(
                    opentelemetry_sdk::trace::Config::default()
                        .with_resource(service_resource(service_name)),
                )
                .install_batch(runtime::Tokio)
                .context("failed to install OTLP tracing pipeline")?;

            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()
                .context("failed to initialise tracing subscriber")?;
        }
        None => {
            registry
                .try_init()
                .context("failed to initialise tracing subscriber")?;
        }
    }

    Ok(())
}

fn service_resource(service_name: &'static str) -> Resource {
    Resource::new(vec![
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            service_name,
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            env!("CARGO_PKG_VERSION"),
        ),
    ])
}
