//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::issue::TokenIssuer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The issuance pipeline; immutable after startup, cheap to clone.
    pub issuer: Arc<TokenIssuer>,
}

impl AppState {
    /// Create a new [`AppState`] wrapping the issuance pipeline.
    pub fn new(issuer: TokenIssuer) -> Self {
        Self {
            issuer: Arc::new(issuer),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by the in-memory key service, for handler tests.
    pub fn for_tests() -> Self {
        use vault::keysvc::MemoryKeyService;

        let cfg = crate::config::Config {
            issuer: "pay-issuer".into(),
            audience: "pay-verifier".into(),
            signing_key_alias: "alias/token-sign".into(),
            encryption_key_alias: "alias/card-enc".into(),
            tokenization_key_alias: "alias/card-tokenize".into(),
            token_ttl_secs: 1800,
            key_service_timeout_secs: 5,
            listen_port: 8080,
            kms_endpoint_url: None,
            otel_exporter_otlp_endpoint: None,
            log_level: "info".into(),
        };
        Self::new(TokenIssuer::new(
            Arc::new(MemoryKeyService::new(b"handler-tests")),
            &cfg,
        ))
    }
}
