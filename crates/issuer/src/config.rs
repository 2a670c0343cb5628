//! Configuration loading and validation for the issuer service.
//!
//! All values are read from environment variables at startup. The process
//! exits with a clear error message if any required variable is missing or
//! invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated issuer service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Identity placed in the `iss` claim of every token. **Required.**
    pub issuer: String,

    /// Identity placed in the `aud` claim of every token. **Required.**
    pub audience: String,

    /// Key alias of the asymmetric token-signing key. **Required.**
    pub signing_key_alias: String,

    /// Key alias used to envelope-encrypt card data. **Required.**
    pub encryption_key_alias: String,

    /// Key alias used for standalone tokenisation. **Required.**
    pub tokenization_key_alias: String,

    /// Token validity window in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Deadline (seconds) applied around each key-service call.
    #[serde(default = "default_key_service_timeout")]
    pub key_service_timeout_secs: u64,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Optional KMS endpoint override (local stacks, proxied deployments).
    #[serde(default)]
    pub kms_endpoint_url: Option<String>,

    /// Optional OTLP endpoint; JSON logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_token_ttl() -> u64 {
    1800
}
fn default_key_service_timeout() -> u64 {
    10
}
fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be
    /// parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first
    /// failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.issuer, "ISSUER")?;
        ensure_non_empty(&self.audience, "AUDIENCE")?;
        ensure_non_empty(&self.signing_key_alias, "SIGNING_KEY_ALIAS")?;
        ensure_non_empty(&self.encryption_key_alias, "ENCRYPTION_KEY_ALIAS")?;
        ensure_non_empty(&self.tokenization_key_alias, "TOKENIZATION_KEY_ALIAS")?;

        if self.token_ttl_secs == 0 {
            anyhow::bail!("TOKEN_TTL_SECS must be > 0");
        }
        if self.key_service_timeout_secs == 0 {
            anyhow::bail!("KEY_SERVICE_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
