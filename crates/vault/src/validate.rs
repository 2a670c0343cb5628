//! Field-level validation of raw card input.
//!
//! Validation always runs before any cryptographic operation; invalid input
//! must never reach the key service.

use common::error::ValidationError;

use crate::record::SensitiveRecord;

/// Reason reported for a card number that is not exactly 16 ASCII digits.
pub const INVALID_CARD_NUMBER: &str = "Invalid card number format";

/// Reason reported for a CVV that is not exactly 3 ASCII digits.
pub const INVALID_CVV: &str = "Invalid CVV format";

/// Reason reported for an absent or empty expiry date.
pub const MISSING_EXPIRY: &str = "Missing expiry date";

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Validate input for token issuance.
///
/// Checks the card number (exactly 16 digits), the CVV (exactly 3 digits)
/// and expiry presence, collecting one reason per invalid field so the
/// caller can correct everything in a single round trip.
pub fn validate_payment_input(
    card_number: &str,
    cvv: &str,
    expiry_date: &str,
) -> Result<SensitiveRecord, ValidationError> {
    let mut errors = Vec::new();
    if !is_digits(card_number, 16) {
        errors.push(INVALID_CARD_NUMBER.to_owned());
    }
    if !is_digits(cvv, 3) {
        errors.push(INVALID_CVV.to_owned());
    }
    if expiry_date.trim().is_empty() {
        errors.push(MISSING_EXPIRY.to_owned());
    }
    if !errors.is_empty() {
        return Err(ValidationError::new(errors));
    }
    Ok(SensitiveRecord::new(card_number, cvv, expiry_date))
}

/// Validate input for standalone tokenisation: card number and CVV format
/// only — no expiry, since the tokenised reference covers the card number
/// alone.
pub fn validate_tokenize_input(card_number: &str, cvv: &str) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    if !is_digits(card_number, 16) {
        errors.push(INVALID_CARD_NUMBER.to_owned());
    }
    if !is_digits(cvv, 3) {
        errors.push(INVALID_CVV.to_owned());
    }
    if !errors.is_empty() {
        return Err(ValidationError::new(errors));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_input() {
        let record = validate_payment_input("4111111111111111", "123", "12/30").unwrap();
        assert_eq!(record.card_number, "4111111111111111");
        assert_eq!(record.cvv, "123");
        assert_eq!(record.expiry_date, "12/30");
    }

    #[test]
    fn rejects_all_three_fields_at_once() {
        let err = validate_payment_input("123", "12", "").unwrap_err();
        assert_eq!(
            err.errors,
            vec![
                INVALID_CARD_NUMBER.to_owned(),
                INVALID_CVV.to_owned(),
                MISSING_EXPIRY.to_owned(),
            ]
        );
    }

    #[test]
    fn rejects_non_digit_card_number() {
        let err = validate_payment_input("4111-1111-1111-11", "123", "12/30").unwrap_err();
        assert_eq!(err.errors, vec![INVALID_CARD_NUMBER.to_owned()]);
    }

    #[test]
    fn rejects_seventeen_digit_card_number() {
        let err = validate_payment_input("41111111111111112", "123", "12/30").unwrap_err();
        assert_eq!(err.errors, vec![INVALID_CARD_NUMBER.to_owned()]);
    }

    #[test]
    fn rejects_whitespace_expiry() {
        let err = validate_payment_input("4111111111111111", "123", "  ").unwrap_err();
        assert_eq!(err.errors, vec![MISSING_EXPIRY.to_owned()]);
    }

    #[test]
    fn tokenize_input_ignores_expiry() {
        assert!(validate_tokenize_input("4111111111111111", "123").is_ok());
    }

    #[test]
    fn tokenize_input_rejects_bad_cvv() {
        let err = validate_tokenize_input("4111111111111111", "12a").unwrap_err();
        assert_eq!(err.errors, vec![INVALID_CVV.to_owned()]);
    }
}
