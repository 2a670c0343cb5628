//! AWS KMS implementation of the [`KeyService`] boundary.
//!
//! Signing uses `RSASSA_PKCS1_V1_5_SHA_256` over the raw message, the KMS
//! equivalent of RS256 tokens. Sign and verify both address the key by
//! alias, so the verifier needs `kms:Verify` permission only — the private
//! key never leaves KMS.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kms::error::SdkError;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::{MessageType, SigningAlgorithmSpec};
use bytes::Bytes;
use common::error::KeyServiceError;
use tracing::warn;

use super::KeyService;

/// Key service backed by AWS KMS.
#[derive(Clone)]
pub struct KmsKeyService {
    client: aws_sdk_kms::Client,
}

impl KmsKeyService {
    /// Initialise the KMS client from the ambient AWS configuration.
    ///
    /// When `endpoint_url` is set, the client is pointed at it instead of
    /// the public KMS endpoint (local stacks, proxied deployments).
    /// Credentials are resolved via the standard AWS credential chain.
    pub async fn init(endpoint_url: Option<&str>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let mut builder = aws_sdk_kms::config::Builder::from(&config);
        if let Some(url) = endpoint_url {
            builder = builder.endpoint_url(url);
        }
        Self {
            client: aws_sdk_kms::Client::from_conf(builder.build()),
        }
    }

    /// Wrap an already-configured SDK client.
    pub fn from_client(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KeyService for KmsKeyService {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Bytes, KeyServiceError> {
        let resp = self
            .client
            .encrypt()
            .key_id(key_id)
            .plaintext(Blob::new(plaintext.to_vec()))
            .send()
            .await
            .map_err(|e| op_error("encrypt", &e))?;

        let blob = resp
            .ciphertext_blob()
            .ok_or_else(|| KeyServiceError::new("encrypt: response contained no ciphertext"))?;
        Ok(Bytes::copy_from_slice(blob.as_ref()))
    }

    async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Bytes, KeyServiceError> {
        let resp = self
            .client
            .decrypt()
            .key_id(key_id)
            .ciphertext_blob(Blob::new(ciphertext.to_vec()))
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_invalid_ciphertext_exception() => {
                    KeyServiceError::malformed_ciphertext()
                }
                _ => op_error("decrypt", &e),
            })?;

        let blob = resp
            .plaintext()
            .ok_or_else(|| KeyServiceError::new("decrypt: response contained no plaintext"))?;
        Ok(Bytes::copy_from_slice(blob.as_ref()))
    }

    async fn sign(&self, key_id: &str, message: &[u8]) -> Result<Bytes, KeyServiceError> {
        let resp = self
            .client
            .sign()
            .key_id(key_id)
            .message(Blob::new(message.to_vec()))
            .message_type(MessageType::Raw)
            .signing_algorithm(SigningAlgorithmSpec::RsassaPkcs1V15Sha256)
            .send()
            .await
            .map_err(|e| op_error("sign", &e))?;

        let blob = resp
            .signature()
            .ok_or_else(|| KeyServiceError::new("sign: response contained no signature"))?;
        Ok(Bytes::copy_from_slice(blob.as_ref()))
    }

    async fn verify(
        &self,
        key_id: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, KeyServiceError> {
        let result = self
            .client
            .verify()
            .key_id(key_id)
            .message(Blob::new(message.to_vec()))
            .message_type(MessageType::Raw)
            .signature(Blob::new(signature.to_vec()))
            .signing_algorithm(SigningAlgorithmSpec::RsassaPkcs1V15Sha256)
            .send()
            .await;

        match result {
            Ok(resp) => Ok(resp.signature_valid()),
            // KMS reports a failed check as an exception; that is a negative
            // verification result, not a service failure.
            Err(e) => match e.as_service_error() {
                Some(se) if se.is_kms_invalid_signature_exception() => Ok(false),
                _ => Err(op_error("verify", &e)),
            },
        }
    }
}

/// Map an SDK error to a [`KeyServiceError`], preferring the service-side
/// error message over the generic transport wrapper.
fn op_error<E: std::fmt::Display>(op: &str, e: &SdkError<E>) -> KeyServiceError {
    let cause = match e.as_service_error() {
        Some(se) => format!("{op}: {se}"),
        None => format!("{op}: {e}"),
    };
    warn!(operation = op, "kms call failed");
    KeyServiceError::new(cause)
}
