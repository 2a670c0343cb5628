//! Error taxonomy shared across crates.
//!
//! Three distinct failure families, deliberately kept apart so callers can
//! never conflate "the input was bad" (recoverable), "the token failed a
//! cryptographic check" (terminal for that request) and "the key service
//! hiccupped" (operational, retryable by an outer layer — never here).

use thiserror::Error;

/// Cause string reported when a caller-imposed deadline around a key-service
/// call expires.
pub const CAUSE_TIMEOUT: &str = "timeout";

/// Cause string reported when ciphertext cannot be interpreted as output of
/// the key service.
pub const CAUSE_MALFORMED_CIPHERTEXT: &str = "malformed-ciphertext";

/// Field-level validation failure.
///
/// Produced before any cryptographic operation is attempted; carries one
/// reason string per offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payment data validation failed")]
pub struct ValidationError {
    /// One human-readable reason per invalid field.
    pub errors: Vec<String>,
}

impl ValidationError {
    /// Construct a [`ValidationError`] from field-level reasons.
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }
}

/// Failure reported by the external key service (or by the deadline wrapped
/// around a call to it).
///
/// The `cause` is a classification string safe to expose to callers — it
/// never contains plaintext or key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("key service error: {cause}")]
pub struct KeyServiceError {
    /// Short classification of the failure (e.g. `"timeout"`).
    pub cause: String,
}

impl KeyServiceError {
    /// Construct a [`KeyServiceError`] from a cause string.
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    /// A caller-imposed deadline around a key-service call expired.
    pub fn timeout() -> Self {
        Self::new(CAUSE_TIMEOUT)
    }

    /// The input could not be interpreted as ciphertext produced by this
    /// service.
    pub fn malformed_ciphertext() -> Self {
        Self::new(CAUSE_MALFORMED_CIPHERTEXT)
    }
}

/// Token verification failure.
///
/// Exactly one kind per failure; the kind is the only information exposed,
/// so a rejected token leaks nothing beyond which check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The token does not decode into a claims segment and a signature
    /// segment.
    #[error("token is malformed")]
    Malformed,

    /// The signature does not verify over the claims bytes.
    #[error("token signature is invalid")]
    BadSignature,

    /// The signed issuer claim does not match the expected issuer.
    #[error("token issuer is not trusted")]
    InvalidIssuer,

    /// The signed audience claim does not match the expected audience.
    #[error("token audience mismatch")]
    InvalidAudience,

    /// The current time falls outside the token's validity window.
    #[error("token is outside its validity window")]
    Expired,

    /// The key service failed while checking the signature — distinct from
    /// [`VerificationError::BadSignature`] so an outage is never reported
    /// as a forgery.
    #[error(transparent)]
    KeyService(#[from] KeyServiceError),
}

impl VerificationError {
    /// Machine-readable kind string used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::Malformed => "malformed",
            VerificationError::BadSignature => "bad_signature",
            VerificationError::InvalidIssuer => "invalid_issuer",
            VerificationError::InvalidAudience => "invalid_audience",
            VerificationError::Expired => "expired",
            VerificationError::KeyService(_) => "key_service_error",
        }
    }

    /// Returns the HTTP status code that should be sent for this error:
    /// - [`VerificationError::Malformed`] → 400
    /// - claim/signature failures → 401
    /// - [`VerificationError::KeyService`] → 502
    pub fn http_status(&self) -> u16 {
        match self {
            VerificationError::Malformed => 400,
            VerificationError::KeyService(_) => 502,
            _ => 401,
        }
    }
}
