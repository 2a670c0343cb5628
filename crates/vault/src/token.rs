//! Signed-claims token codec.
//!
//! # Token format
//!
//! ```text
//! v1.<base64url-no-pad(claims JSON)>.<base64url-no-pad(signature)>
//! ```
//!
//! The signature covers the exact claims bytes carried in the token: the
//! serialisation that was signed is the serialisation that is verified,
//! with no re-encoding in between. The `v1` prefix enables future algorithm
//! or layout migration without cross-version ambiguity.
//!
//! Verification checks run in a fixed order and short-circuit: structure,
//! signature, issuer, audience, validity window. The claims bytes are
//! attacker-controlled input until the signature has been confirmed, so
//! they are not parsed — let alone trusted — before that point.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::error::{KeyServiceError, VerificationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keysvc::KeyService;

/// Prefix that appears at the start of every token.
pub const VERSION_PREFIX: &str = "v1";

/// Current unix time in whole seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// The signed claim set carried by a token.
///
/// Serialised with fixed field order (`iss`, `aud`, `iat`, `exp`, `data`),
/// which makes the byte encoding deterministic for a given claim set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity of the issuing component.
    #[serde(rename = "iss")]
    pub issuer: String,

    /// Identity of the intended verifier.
    #[serde(rename = "aud")]
    pub audience: String,

    /// Issuance time, unix seconds.
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Expiry time, unix seconds. Always later than `issued_at`.
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Base64url-encoded ciphertext of the protected record — never the
    /// plaintext.
    pub data: String,
}

impl Claims {
    /// Build a claim set for `ciphertext` valid from `issued_at` for
    /// `ttl_secs` seconds.
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        issued_at: i64,
        ttl_secs: i64,
        ciphertext: &[u8],
    ) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            issued_at,
            expires_at: issued_at + ttl_secs,
            data: URL_SAFE_NO_PAD.encode(ciphertext),
        }
    }

    /// Decode the ciphertext claim back to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::Malformed`] if the claim is not valid
    /// base64url.
    pub fn ciphertext(&self) -> Result<Vec<u8>, VerificationError> {
        URL_SAFE_NO_PAD
            .decode(&self.data)
            .map_err(|_| VerificationError::Malformed)
    }
}

/// Decoded transport segments of a token: the exact signed claims bytes and
/// the detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParts {
    /// Serialised claims, byte-for-byte as signed.
    pub claims: Vec<u8>,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

impl TokenParts {
    /// Encode to the canonical transport string.
    pub fn to_string_repr(&self) -> String {
        format!(
            "{}.{}.{}",
            VERSION_PREFIX,
            URL_SAFE_NO_PAD.encode(&self.claims),
            URL_SAFE_NO_PAD.encode(&self.signature),
        )
    }

    /// Parse a transport string back into its segments.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::Malformed`] if the string does not match
    /// the expected `v1.<claims>.<signature>` structure.
    pub fn from_str(s: &str) -> Result<Self, VerificationError> {
        let parts: Vec<&str> = s.splitn(3, '.').collect();
        if parts.len() != 3 || parts[0] != VERSION_PREFIX {
            return Err(VerificationError::Malformed);
        }
        let claims = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| VerificationError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| VerificationError::Malformed)?;
        if claims.is_empty() || signature.is_empty() {
            return Err(VerificationError::Malformed);
        }
        Ok(Self { claims, signature })
    }
}

/// Errors produced when signing a claim set.
#[derive(Debug, Error)]
pub enum SignError {
    /// The claims validity window is empty or inverted.
    #[error("claims expiry must be later than issuance")]
    EmptyValidityWindow,

    /// Claims serialisation failed.
    #[error("claims serialisation failed")]
    Serialize(#[source] serde_json::Error),

    /// The key service failed to produce a signature.
    #[error(transparent)]
    KeyService(#[from] KeyServiceError),
}

/// Expected identities and options applied during verification.
#[derive(Debug, Clone)]
pub struct ClaimChecks {
    /// Issuer identity the token must carry.
    pub issuer: String,
    /// Audience identity the token must carry.
    pub audience: String,
    /// Key alias used to check the signature.
    pub verification_key_id: String,
    /// Also reject tokens whose `issued_at` lies in the future.
    pub enforce_not_before: bool,
}

/// Signs and verifies claim sets through the key service.
#[derive(Clone)]
pub struct TokenCodec {
    keysvc: Arc<dyn KeyService>,
}

impl TokenCodec {
    /// Create a codec backed by `keysvc`.
    pub fn new(keysvc: Arc<dyn KeyService>) -> Self {
        Self { keysvc }
    }

    /// Sign `claims` with the identified key and emit the transport string.
    ///
    /// Two calls with identical claims and key produce tokens that verify
    /// identically.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::EmptyValidityWindow`] for claims whose expiry is
    /// not later than their issuance — such claims are never signed.
    pub async fn sign(&self, claims: &Claims, signing_key_id: &str) -> Result<String, SignError> {
        if claims.expires_at <= claims.issued_at {
            return Err(SignError::EmptyValidityWindow);
        }
        let claims_bytes = serde_json::to_vec(claims).map_err(SignError::Serialize)?;
        let signature = self.keysvc.sign(signing_key_id, &claims_bytes).await?;
        Ok(TokenParts {
            claims: claims_bytes,
            signature: signature.to_vec(),
        }
        .to_string_repr())
    }

    /// Verify `token` against `checks` at time `now` and return its claims.
    ///
    /// No decryption happens here; recovering the protected record is a
    /// separate, explicit step taken only after this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns the [`VerificationError`] kind of the first failed check. A
    /// key-service failure surfaces as [`VerificationError::KeyService`],
    /// never as [`VerificationError::BadSignature`].
    pub async fn verify(
        &self,
        token: &str,
        checks: &ClaimChecks,
        now: i64,
    ) -> Result<Claims, VerificationError> {
        let parts = TokenParts::from_str(token)?;

        let valid = self
            .keysvc
            .verify(&checks.verification_key_id, &parts.claims, &parts.signature)
            .await?;
        if !valid {
            return Err(VerificationError::BadSignature);
        }

        // Signature confirmed; the claims bytes may now be parsed.
        let claims: Claims =
            serde_json::from_slice(&parts.claims).map_err(|_| VerificationError::Malformed)?;

        if claims.issuer != checks.issuer {
            return Err(VerificationError::InvalidIssuer);
        }
        if claims.audience != checks.audience {
            return Err(VerificationError::InvalidAudience);
        }
        if now >= claims.expires_at {
            return Err(VerificationError::Expired);
        }
        if checks.enforce_not_before && now < claims.issued_at {
            return Err(VerificationError::Expired);
        }
        Ok(claims)
    }
}
