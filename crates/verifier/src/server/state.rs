//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::verify::TokenVerifier;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The recovery pipeline; immutable after startup, cheap to clone.
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Create a new [`AppState`] wrapping the recovery pipeline.
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by the in-memory key service, for handler tests.
    ///
    /// Tests that need to mint tokens build their own
    /// `MemoryKeyService::new(b"handler-tests")` — same-seed instances
    /// agree on every key.
    pub fn for_tests() -> Self {
        use vault::keysvc::MemoryKeyService;

        let cfg = crate::config::Config {
            issuer: "pay-issuer".into(),
            audience: "pay-verifier".into(),
            verification_key_alias: "alias/token-sign".into(),
            decryption_key_alias: "alias/card-enc".into(),
            enforce_not_before: false,
            key_service_timeout_secs: 5,
            listen_port: 8081,
            kms_endpoint_url: None,
            otel_exporter_otlp_endpoint: None,
            log_level: "info".into(),
        };
        Self::new(TokenVerifier::new(
            Arc::new(MemoryKeyService::new(b"handler-tests")),
            &cfg,
        ))
    }
}
