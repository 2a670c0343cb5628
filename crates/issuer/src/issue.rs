//! Token issuance pipeline: validate, envelope-encrypt, build claims, sign.

use std::sync::Arc;
use std::time::Duration;

use common::error::{KeyServiceError, ValidationError};
use common::protocol::{IssueRequest, TokenizeRequest};
use thiserror::Error;
use vault::keysvc::KeyService;
use vault::token::{unix_now, Claims, SignError, TokenCodec};
use vault::validate::{validate_payment_input, validate_tokenize_input};

use crate::config::Config;

/// Errors produced by the issuance pipeline.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The input failed field-level validation; no key-service call was
    /// made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The key service failed (or the deadline around it expired).
    #[error(transparent)]
    KeyService(#[from] KeyServiceError),

    /// An unexpected internal failure; the message is safe to log but not
    /// returned to callers verbatim.
    #[error("internal issuance failure: {0}")]
    Internal(String),
}

/// Turns validated raw card input into signed tokens.
///
/// Holds key aliases and identity strings only — resolved once from
/// [`Config`] at startup and immutable afterwards.
pub struct TokenIssuer {
    keysvc: Arc<dyn KeyService>,
    codec: TokenCodec,
    issuer: String,
    audience: String,
    signing_key_alias: String,
    encryption_key_alias: String,
    tokenization_key_alias: String,
    token_ttl_secs: i64,
    key_service_deadline: Duration,
}

impl TokenIssuer {
    /// Build the pipeline from its key service and configuration.
    pub fn new(keysvc: Arc<dyn KeyService>, cfg: &Config) -> Self {
        Self {
            codec: TokenCodec::new(Arc::clone(&keysvc)),
            keysvc,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            signing_key_alias: cfg.signing_key_alias.clone(),
            encryption_key_alias: cfg.encryption_key_alias.clone(),
            tokenization_key_alias: cfg.tokenization_key_alias.clone(),
            token_ttl_secs: cfg.token_ttl_secs as i64,
            key_service_deadline: Duration::from_secs(cfg.key_service_timeout_secs),
        }
    }

    /// Issue a signed token carrying the encrypted card data as a claim.
    ///
    /// Validation failures return immediately with every field reason; no
    /// cryptographic operation is attempted on invalid input. No partial
    /// token is ever returned.
    pub async fn issue(&self, req: &IssueRequest) -> Result<String, IssueError> {
        let record = validate_payment_input(&req.card_number, &req.cvv, &req.expiry_date)?;
        let plaintext = record.to_plaintext();

        let ciphertext = match tokio::time::timeout(
            self.key_service_deadline,
            self.keysvc.encrypt(&self.encryption_key_alias, &plaintext),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(KeyServiceError::timeout().into()),
        };

        let claims = Claims::new(
            self.issuer.as_str(),
            self.audience.as_str(),
            unix_now(),
            self.token_ttl_secs,
            &ciphertext,
        );

        match tokio::time::timeout(
            self.key_service_deadline,
            self.codec.sign(&claims, &self.signing_key_alias),
        )
        .await
        {
            Ok(Ok(token)) => Ok(token),
            Ok(Err(SignError::KeyService(e))) => Err(e.into()),
            Ok(Err(other)) => Err(IssueError::Internal(other.to_string())),
            Err(_) => Err(KeyServiceError::timeout().into()),
        }
    }

    /// Tokenise the card number alone into an opaque reversible reference.
    ///
    /// This is not a bearer credential: no claims are built and nothing is
    /// signed. The returned string is the hex-encoded ciphertext.
    pub async fn tokenize(&self, req: &TokenizeRequest) -> Result<String, IssueError> {
        validate_tokenize_input(&req.card_number, &req.cvv)?;

        let ciphertext = match tokio::time::timeout(
            self.key_service_deadline,
            self.keysvc
                .encrypt(&self.tokenization_key_alias, req.card_number.as_bytes()),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(KeyServiceError::timeout().into()),
        };

        Ok(hex::encode(&ciphertext))
    }
}
