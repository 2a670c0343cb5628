//! Boundary to the external key-management service.
//!
//! Components hold key *aliases* only; the key material itself lives in the
//! external service and is never loaded into process memory. The trait is
//! deliberately thin — no retries, no caching — so that retry and deadline
//! policy stays with the caller.

pub mod kms;
pub mod memory;

pub use kms::KmsKeyService;
pub use memory::MemoryKeyService;

use async_trait::async_trait;
use bytes::Bytes;
use common::error::KeyServiceError;

#[cfg(test)]
use mockall::automock;

/// Operations exposed by the external key service, addressed by key alias.
///
/// Every failure is a [`KeyServiceError`] carrying a classification cause;
/// implementations must never place plaintext or key material in the cause.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Encrypt `plaintext` under the identified key.
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Bytes, KeyServiceError>;

    /// Decrypt `ciphertext` under the identified key.
    ///
    /// Fails with `cause = "malformed-ciphertext"` when the input cannot be
    /// interpreted as ciphertext produced by this service.
    async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Bytes, KeyServiceError>;

    /// Produce an asymmetric signature over `message` with the identified
    /// signing key.
    async fn sign(&self, key_id: &str, message: &[u8]) -> Result<Bytes, KeyServiceError>;

    /// Check `signature` over `message` against the identified key.
    ///
    /// Returns `Ok(false)` for a well-formed but invalid signature; an `Err`
    /// means the service itself failed, which callers must keep distinct
    /// from a rejected signature.
    async fn verify(
        &self,
        key_id: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, KeyServiceError>;
}
