//! Request and response types exchanged with the issuer and verifier
//! services.
//!
//! These types are serialised as JSON over the public HTTP APIs. Types that
//! carry card data implement a redacting [`std::fmt::Debug`] so they can
//! never leak through a log line or panic message.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Issuer endpoints
// ---------------------------------------------------------------------------

/// Request body for `POST /issue`.
#[derive(Clone, Serialize, Deserialize)]
pub struct IssueRequest {
    /// Card number, 16 ASCII digits.
    pub card_number: String,
    /// Card verification value, 3 ASCII digits.
    pub cvv: String,
    /// Expiry date, e.g. `"12/30"`. Presence is validated, format is not.
    pub expiry_date: String,
}

impl std::fmt::Debug for IssueRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IssueRequest([REDACTED])")
    }
}

/// Successful response body for `POST /issue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueResponse {
    /// Signed bearer token carrying the encrypted card data as a claim.
    pub token: String,
}

/// Request body for `POST /tokenize`.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenizeRequest {
    /// Card number, 16 ASCII digits.
    pub card_number: String,
    /// Card verification value, 3 ASCII digits.
    pub cvv: String,
}

impl std::fmt::Debug for TokenizeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenizeRequest([REDACTED])")
    }
}

/// Successful response body for `POST /tokenize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizeResponse {
    /// Opaque reversible reference to the card number (hex ciphertext).
    pub token: String,
}

// ---------------------------------------------------------------------------
// Verifier endpoints
// ---------------------------------------------------------------------------

/// Request body for `POST /verify` and `POST /process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Bearer token previously emitted by the issuer.
    pub token: String,
}

/// Successful response body for `POST /verify` — the recovered card fields.
#[derive(Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub card_number: String,
    pub cvv: String,
    pub expiry_date: String,
}

impl std::fmt::Debug for VerifyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VerifyResponse([REDACTED])")
    }
}

/// Successful response body for `POST /process`.
///
/// Contains no card data — only the settlement outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// Settlement outcome, `"success"` on the mocked path.
    pub status: String,
    /// Unique id for this settlement attempt.
    pub receipt_id: String,
    /// Human-readable outcome description.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"validation_failed"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
    /// Field-level reasons, present only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            errors: None,
        }
    }

    /// Construct a validation-failure response carrying field-level reasons.
    pub fn validation(errors: Vec<String>) -> Self {
        Self {
            code: "validation_failed".into(),
            message: "payment data validation failed".into(),
            errors: Some(errors),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status, `"ok"` when the service is serving.
    pub status: String,
    /// Service name, e.g. `"card-token-issuer"`.
    pub service: String,
    /// Crate version of the running binary.
    pub version: String,
}
