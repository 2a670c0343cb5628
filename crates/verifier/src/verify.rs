//! Token verification and card-data recovery pipeline.
//!
//! Recovery is a strict two-phase operation: every verification check must
//! pass before the embedded ciphertext is sent for decryption. No code path
//! acts on unverified ciphertext.

use std::sync::Arc;
use std::time::Duration;

use common::error::{KeyServiceError, VerificationError};
use thiserror::Error;
use vault::keysvc::KeyService;
use vault::record::SensitiveRecord;
use vault::token::{unix_now, ClaimChecks, TokenCodec};

use crate::config::Config;

/// Errors produced by the recovery pipeline.
#[derive(Debug, Error)]
pub enum RecoverError {
    /// The token failed a verification check (or the key service failed
    /// along the way); decryption of the payload was not completed.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The decrypted plaintext could not be decoded into card fields.
    #[error("recovered plaintext is corrupt")]
    Corrupt,
}

/// Consumes tokens and recovers the protected card fields.
///
/// Holds key aliases and expected identities only — resolved once from
/// [`Config`] at startup and immutable afterwards.
pub struct TokenVerifier {
    keysvc: Arc<dyn KeyService>,
    codec: TokenCodec,
    checks: ClaimChecks,
    decryption_key_alias: String,
    key_service_deadline: Duration,
}

impl TokenVerifier {
    /// Build the pipeline from its key service and configuration.
    pub fn new(keysvc: Arc<dyn KeyService>, cfg: &Config) -> Self {
        Self {
            codec: TokenCodec::new(Arc::clone(&keysvc)),
            keysvc,
            checks: ClaimChecks {
                issuer: cfg.issuer.clone(),
                audience: cfg.audience.clone(),
                verification_key_id: cfg.verification_key_alias.clone(),
                enforce_not_before: cfg.enforce_not_before,
            },
            decryption_key_alias: cfg.decryption_key_alias.clone(),
            key_service_deadline: Duration::from_secs(cfg.key_service_timeout_secs),
        }
    }

    /// Verify `token` and recover the protected card fields.
    ///
    /// The caller receives exclusive ownership of the record; nothing is
    /// retained, logged, or cached here.
    pub async fn recover(&self, token: &str) -> Result<SensitiveRecord, RecoverError> {
        let claims = match tokio::time::timeout(
            self.key_service_deadline,
            self.codec.verify(token, &self.checks, unix_now()),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(VerificationError::KeyService(KeyServiceError::timeout()).into())
            }
        };

        // Verification passed; only now may the ciphertext be decrypted.
        let ciphertext = claims.ciphertext()?;
        let plaintext = match tokio::time::timeout(
            self.key_service_deadline,
            self.keysvc.decrypt(&self.decryption_key_alias, &ciphertext),
        )
        .await
        {
            Ok(result) => result.map_err(VerificationError::from)?,
            Err(_) => {
                return Err(VerificationError::KeyService(KeyServiceError::timeout()).into())
            }
        };

        SensitiveRecord::from_plaintext(&plaintext).map_err(|_| RecoverError::Corrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use common::error::CAUSE_TIMEOUT;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vault::keysvc::MemoryKeyService;
    use vault::token::{Claims, TokenParts};

    const SEED: &[u8] = b"verify-tests";

    fn test_config() -> Config {
        Config {
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
        }
    }

    /// Sign a token over `record` the way the issuer does, with `issued_at`
    /// controlled by the test.
    async fn make_token(keysvc: &Arc<MemoryKeyService>, issued_at: i64, ttl: i64) -> String {
        let record = SensitiveRecord::new("4111111111111111", "123", "12/30");
        let ciphertext = keysvc
            .encrypt("alias/card-enc", &record.to_plaintext())
            .await
            .unwrap();
        let claims = Claims::new("pay-issuer", "pay-verifier", issued_at, ttl, &ciphertext);
        TokenCodec::new(keysvc.clone() as Arc<dyn KeyService>)
            .sign(&claims, "alias/token-sign")
            .await
            .unwrap()
    }

    /// Spy decorator that counts decrypt calls.
    struct DecryptSpy {
        inner: MemoryKeyService,
        decrypts: AtomicUsize,
    }

    impl DecryptSpy {
        fn new(seed: &[u8]) -> Self {
            Self {
                inner: MemoryKeyService::new(seed),
                decrypts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl KeyService for DecryptSpy {
        async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Bytes, KeyServiceError> {
            self.inner.encrypt(key_id, plaintext).await
        }

        async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Bytes, KeyServiceError> {
            self.decrypts.fetch_add(1, Ordering::SeqCst);
            self.inner.decrypt(key_id, ciphertext).await
        }

        async fn sign(&self, key_id: &str, message: &[u8]) -> Result<Bytes, KeyServiceError> {
            self.inner.sign(key_id, message).await
        }

        async fn verify(
            &self,
            key_id: &str,
            message: &[u8],
            signature: &[u8],
        ) -> Result<bool, KeyServiceError> {
            self.inner.verify(key_id, message, signature).await
        }
    }

    /// Key service whose calls never complete; used to exercise deadlines.
    struct StalledKeyService;

    #[async_trait]
    impl KeyService for StalledKeyService {
        async fn encrypt(&self, _: &str, _: &[u8]) -> Result<Bytes, KeyServiceError> {
            std::future::pending().await
        }
        async fn decrypt(&self, _: &str, _: &[u8]) -> Result<Bytes, KeyServiceError> {
            std::future::pending().await
        }
        async fn sign(&self, _: &str, _: &[u8]) -> Result<Bytes, KeyServiceError> {
            std::future::pending().await
        }
        async fn verify(&self, _: &str, _: &[u8], _: &[u8]) -> Result<bool, KeyServiceError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn recovers_the_original_fields() {
        let keysvc = Arc::new(MemoryKeyService::new(SEED));
        let token = make_token(&keysvc, unix_now(), 1800).await;

        let verifier = TokenVerifier::new(keysvc, &test_config());
        let record = verifier.recover(&token).await.unwrap();
        assert_eq!(record.card_number, "4111111111111111");
        assert_eq!(record.cvv, "123");
        assert_eq!(record.expiry_date, "12/30");
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let keysvc = Arc::new(MemoryKeyService::new(SEED));
        let token = make_token(&keysvc, unix_now() - 4000, 1800).await;

        let verifier = TokenVerifier::new(keysvc, &test_config());
        match verifier.recover(&token).await.unwrap_err() {
            RecoverError::Verification(v) => assert_eq!(v, VerificationError::Expired),
            other => panic!("expected Expired, got {other}"),
        }
    }

    #[tokio::test]
    async fn future_token_rejected_only_when_not_before_enforced() {
        let keysvc = Arc::new(MemoryKeyService::new(SEED));
        let token = make_token(&keysvc, unix_now() + 600, 1800).await;

        let lenient = TokenVerifier::new(keysvc.clone(), &test_config());
        assert!(lenient.recover(&token).await.is_ok());

        let mut cfg = test_config();
        cfg.enforce_not_before = true;
        let strict = TokenVerifier::new(keysvc, &cfg);
        match strict.recover(&token).await.unwrap_err() {
            RecoverError::Verification(v) => assert_eq!(v, VerificationError::Expired),
            other => panic!("expected Expired, got {other}"),
        }
    }

    #[tokio::test]
    async fn audience_mismatch_is_rejected() {
        let keysvc = Arc::new(MemoryKeyService::new(SEED));
        let token = make_token(&keysvc, unix_now(), 1800).await;

        let mut cfg = test_config();
        cfg.audience = "someone-else".into();
        let verifier = TokenVerifier::new(keysvc, &cfg);
        match verifier.recover(&token).await.unwrap_err() {
            RecoverError::Verification(v) => assert_eq!(v, VerificationError::InvalidAudience),
            other => panic!("expected InvalidAudience, got {other}"),
        }
    }

    #[tokio::test]
    async fn tampered_token_never_reaches_decryption() {
        let keysvc = Arc::new(DecryptSpy::new(SEED));
        let helper = Arc::new(MemoryKeyService::new(SEED));
        let token = make_token(&helper, unix_now(), 1800).await;

        let mut parts = TokenParts::from_str(&token).unwrap();
        parts.claims[0] ^= 0x01;
        let tampered = parts.to_string_repr();

        let verifier = TokenVerifier::new(keysvc.clone(), &test_config());
        match verifier.recover(&tampered).await.unwrap_err() {
            RecoverError::Verification(v) => assert_eq!(v, VerificationError::BadSignature),
            other => panic!("expected BadSignature, got {other}"),
        }
        assert_eq!(keysvc.decrypts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_plaintext_is_corrupt() {
        let keysvc = Arc::new(MemoryKeyService::new(SEED));
        // A signed token whose payload decrypts to a buffer with no field
        // delimiters.
        let ciphertext = keysvc.encrypt("alias/card-enc", b"junk").await.unwrap();
        let claims = Claims::new("pay-issuer", "pay-verifier", unix_now(), 1800, &ciphertext);
        let token = TokenCodec::new(keysvc.clone() as Arc<dyn KeyService>)
            .sign(&claims, "alias/token-sign")
            .await
            .unwrap();

        let verifier = TokenVerifier::new(keysvc, &test_config());
        assert!(matches!(
            verifier.recover(&token).await.unwrap_err(),
            RecoverError::Corrupt
        ));
    }

    #[tokio::test]
    async fn key_service_deadline_reports_timeout() {
        let helper = Arc::new(MemoryKeyService::new(SEED));
        let token = make_token(&helper, unix_now(), 1800).await;

        let mut cfg = test_config();
        cfg.key_service_timeout_secs = 1;
        let verifier = TokenVerifier::new(Arc::new(StalledKeyService), &cfg);
        match verifier.recover(&token).await.unwrap_err() {
            RecoverError::Verification(VerificationError::KeyService(e)) => {
                assert_eq!(e.cause, CAUSE_TIMEOUT)
            }
            other => panic!("expected key service timeout, got {other}"),
        }
    }
}
