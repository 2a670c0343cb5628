//! Deterministic in-process [`KeyService`] for local development and tests.
//!
//! Per-alias keys are derived with HMAC-SHA256 from a seed, encryption uses
//! AES-256-GCM-SIV with a fresh random nonce per call, and signatures are
//! HMAC-SHA256 tags. Two instances built from the same seed agree on every
//! operation, which is what makes issuer/verifier round-trip tests possible
//! without AWS.
//!
//! Not for production: the "service" holds key material in process memory,
//! which is exactly what the real boundary exists to avoid.

use aes_gcm_siv::{
    aead::{Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use async_trait::async_trait;
use bytes::Bytes;
use common::error::KeyServiceError;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::KeyService;

type HmacSha256 = Hmac<Sha256>;

/// Byte length of a derived per-alias key.
const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM-SIV nonce.
const NONCE_LEN: usize = 12;

/// In-memory key service with keys derived from a fixed seed.
#[derive(Clone)]
pub struct MemoryKeyService {
    root: [u8; KEY_LEN],
}

impl MemoryKeyService {
    /// Create a service whose per-alias keys all derive from `seed`.
    pub fn new(seed: &[u8]) -> Self {
        Self {
            root: Sha256::digest(seed).into(),
        }
    }

    fn derive_key(&self, key_id: &str) -> Result<[u8; KEY_LEN], KeyServiceError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.root)
            .map_err(|_| KeyServiceError::new("key derivation failed"))?;
        mac.update(key_id.as_bytes());
        Ok(mac.finalize().into_bytes().into())
    }

    fn cipher(&self, key_id: &str) -> Result<Aes256GcmSiv, KeyServiceError> {
        let key = self.derive_key(key_id)?;
        Aes256GcmSiv::new_from_slice(&key)
            .map_err(|_| KeyServiceError::new("invalid derived key length"))
    }
}

#[async_trait]
impl KeyService for MemoryKeyService {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Bytes, KeyServiceError> {
        let cipher = self.cipher(key_id)?;

        use aes_gcm_siv::aead::rand_core::RngCore;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| KeyServiceError::new("encryption failed"))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(Bytes::from(out))
    }

    async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Bytes, KeyServiceError> {
        if ciphertext.len() <= NONCE_LEN {
            return Err(KeyServiceError::malformed_ciphertext());
        }
        let (nonce_bytes, body) = ciphertext.split_at(NONCE_LEN);

        let cipher = self.cipher(key_id)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), body)
            .map_err(|_| KeyServiceError::malformed_ciphertext())?;
        Ok(Bytes::from(plaintext))
    }

    async fn sign(&self, key_id: &str, message: &[u8]) -> Result<Bytes, KeyServiceError> {
        let key = self.derive_key(key_id)?;
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|_| KeyServiceError::new("key derivation failed"))?;
        mac.update(message);
        Ok(Bytes::copy_from_slice(&mac.finalize().into_bytes()))
    }

    async fn verify(
        &self,
        key_id: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, KeyServiceError> {
        let key = self.derive_key(key_id)?;
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|_| KeyServiceError::new("key derivation failed"))?;
        mac.update(message);
        // Constant-time comparison via the hmac crate.
        Ok(mac.verify_slice(signature).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::CAUSE_MALFORMED_CIPHERTEXT;

    const ENC_KEY: &str = "alias/card-enc";
    const SIGN_KEY: &str = "alias/token-sign";

    #[tokio::test]
    async fn encrypt_decrypt_round_trip() {
        let svc = MemoryKeyService::new(b"seed");
        let ct = svc.encrypt(ENC_KEY, b"4111111111111111").await.unwrap();
        let pt = svc.decrypt(ENC_KEY, &ct).await.unwrap();
        assert_eq!(&pt[..], b"4111111111111111");
    }

    #[tokio::test]
    async fn same_seed_instances_agree() {
        let a = MemoryKeyService::new(b"shared");
        let b = MemoryKeyService::new(b"shared");
        let ct = a.encrypt(ENC_KEY, b"secret").await.unwrap();
        let pt = b.decrypt(ENC_KEY, &ct).await.unwrap();
        assert_eq!(&pt[..], b"secret");
    }

    #[tokio::test]
    async fn wrong_alias_fails_decryption() {
        let svc = MemoryKeyService::new(b"seed");
        let ct = svc.encrypt(ENC_KEY, b"secret").await.unwrap();
        let err = svc.decrypt("alias/other", &ct).await.unwrap_err();
        assert_eq!(err.cause, CAUSE_MALFORMED_CIPHERTEXT);
    }

    #[tokio::test]
    async fn truncated_ciphertext_is_malformed() {
        let svc = MemoryKeyService::new(b"seed");
        let err = svc.decrypt(ENC_KEY, b"short").await.unwrap_err();
        assert_eq!(err.cause, CAUSE_MALFORMED_CIPHERTEXT);
    }

    #[tokio::test]
    async fn sign_verify_round_trip() {
        let svc = MemoryKeyService::new(b"seed");
        let sig = svc.sign(SIGN_KEY, b"claims").await.unwrap();
        assert!(svc.verify(SIGN_KEY, b"claims", &sig).await.unwrap());
    }

    #[tokio::test]
    async fn tampered_signature_does_not_verify() {
        let svc = MemoryKeyService::new(b"seed");
        let sig = svc.sign(SIGN_KEY, b"claims").await.unwrap();
        let mut bad = sig.to_vec();
        bad[0] ^= 0xFF;
        assert!(!svc.verify(SIGN_KEY, b"claims", &bad).await.unwrap());
    }

    #[tokio::test]
    async fn different_aliases_produce_different_signatures() {
        let svc = MemoryKeyService::new(b"seed");
        let a = svc.sign(SIGN_KEY, b"claims").await.unwrap();
        let b = svc.sign("alias/other", b"claims").await.unwrap();
        assert_ne!(a, b);
    }
}
