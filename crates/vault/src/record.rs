//! Transient in-memory representation of the protected card fields and its
//! plaintext buffer codec.
//!
//! # Plaintext format
//!
//! ```text
//! <card_number> 0x1F <cvv> 0x1F <expiry_date>
//! ```
//!
//! The ASCII unit separator cannot occur in the digits-only card number or
//! CVV, and the expiry date is the final segment, so decoding is lossless
//! for every valid record.

use thiserror::Error;

/// Delimiter between the three plaintext fields.
pub const FIELD_DELIMITER: char = '\u{1f}';

/// The plaintext card fields.
///
/// Exists only transiently: created from caller input on issuance and from
/// decrypted bytes on verification, then handed off and dropped. Never
/// persisted, and `Debug` output is redacted so the fields cannot leak
/// through logs or panic messages.
#[derive(Clone, PartialEq, Eq)]
pub struct SensitiveRecord {
    /// Card number, 16 ASCII digits.
    pub card_number: String,
    /// Card verification value, 3 ASCII digits.
    pub cvv: String,
    /// Expiry date; presence is validated, format is not.
    pub expiry_date: String,
}

impl std::fmt::Debug for SensitiveRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SensitiveRecord([REDACTED])")
    }
}

/// Errors produced by the plaintext buffer codec.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The decrypted buffer is not valid UTF-8.
    #[error("plaintext buffer is not valid UTF-8")]
    NotUtf8,

    /// The decrypted buffer does not split into three fields.
    #[error("plaintext buffer does not contain three fields")]
    WrongFieldCount,
}

impl SensitiveRecord {
    /// Construct a record from its three fields.
    pub fn new(
        card_number: impl Into<String>,
        cvv: impl Into<String>,
        expiry_date: impl Into<String>,
    ) -> Self {
        Self {
            card_number: card_number.into(),
            cvv: cvv.into(),
            expiry_date: expiry_date.into(),
        }
    }

    /// Encode the three fields into a single delimited plaintext buffer.
    pub fn to_plaintext(&self) -> Vec<u8> {
        let mut buf = String::with_capacity(
            self.card_number.len() + self.cvv.len() + self.expiry_date.len() + 2,
        );
        buf.push_str(&self.card_number);
        buf.push(FIELD_DELIMITER);
        buf.push_str(&self.cvv);
        buf.push(FIELD_DELIMITER);
        buf.push_str(&self.expiry_date);
        buf.into_bytes()
    }

    /// Decode a plaintext buffer produced by [`SensitiveRecord::to_plaintext`].
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the buffer is not UTF-8 or does not split
    /// into exactly three fields.
    pub fn from_plaintext(bytes: &[u8]) -> Result<Self, RecordError> {
        let s = std::str::from_utf8(bytes).map_err(|_| RecordError::NotUtf8)?;
        let mut fields = s.splitn(3, FIELD_DELIMITER);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(card_number), Some(cvv), Some(expiry_date)) => {
                Ok(Self::new(card_number, cvv, expiry_date))
            }
            _ => Err(RecordError::WrongFieldCount),
        }
    }
}
