//! Configuration loading and validation for the verifier service.
//!
//! All values are read from environment variables at startup. The process
//! exits with a clear error message if any required variable is missing or
//! invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated verifier service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Issuer identity every accepted token must carry. **Required.**
    pub issuer: String,

    /// Audience identity every accepted token must carry. **Required.**
    pub audience: String,

    /// Key alias used to check token signatures. **Required.**
    pub verification_key_alias: String,

    /// Key alias used to decrypt the embedded card data. **Required.**
    pub decryption_key_alias: String,

    /// Also reject tokens whose issuance time lies in the future.
    #[serde(default)]
    pub enforce_not_before: bool,

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

fn default_key_service_timeout() -> u64 {
    10
}
fn default_listen_port() -> u16 {
    8081
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
        ensure_non_empty(&self.verification_key_alias, "VERIFICATION_KEY_ALIAS")?;
        ensure_non_empty(&self.decryption_key_alias, "DECRYPTION_KEY_ALIAS")?;

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

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            issuer: "pay-issuer".into(),
            audience: "pay-verifier".into(),
            verification_key_alias: "alias/token-sign".into(),
            decryption_key_alias: "alias/card-enc".into(),
            enforce_not_before: false,
            key_service_timeout_secs: default_key_service_timeout(),
            listen_port: default_listen_port(),
            kms_endpoint_url: None,
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_key_service_timeout(), 10);
        assert_eq!(default_listen_port(), 8081);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_audience() {
        let mut cfg = valid();
        cfg.audience = "".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = valid();
        cfg.key_service_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }
}
