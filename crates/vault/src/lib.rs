//! Domain core of `card-token-svc`.
//!
//! Four pieces, each free of HTTP concerns:
//! - [`keysvc`] — the boundary to the external key-management service
//!   (encrypt/decrypt/sign/verify by key alias; key bytes never enter
//!   process memory).
//! - [`token`] — the signed-claims token codec.
//! - [`record`] — the transient card-data record and its plaintext codec.
//! - [`validate`] — field-level input validation, always performed before
//!   any cryptographic call.

pub mod keysvc;
pub mod record;
pub mod token;
pub mod validate;

pub use keysvc::KeyService;
pub use record::SensitiveRecord;
pub use token::{ClaimChecks, Claims, TokenCodec};
