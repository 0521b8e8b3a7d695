//! TASKVAULT Protect — protected-field value types, field-level
//! AES-256-GCM encryption, deterministic lookup hashing, and redaction
//! masking.
//!
//! Everything in this crate is request-scoped and synchronous. The only
//! path that produces plaintext from an at-rest value is
//! [`ProtectedField::reveal`] (and the serialization-time
//! [`ProtectedField::wire_value`] for reveal-pending values); callers
//! must discard the result after use.

pub mod cipher;
pub mod error;
pub mod field;
pub mod lookup;
pub mod redact;

pub use cipher::FieldCipher;
pub use error::ProtectError;
pub use field::ProtectedField;
pub use lookup::lookup_hash;
pub use redact::mask;
