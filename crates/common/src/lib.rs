//! Shared wire protocol and error taxonomy for the `card-token-svc` crates.

pub mod error;
pub mod protocol;

pub use error::{KeyServiceError, ValidationError, VerificationError};
