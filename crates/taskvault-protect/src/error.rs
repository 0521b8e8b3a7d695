//! Protection-layer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtectError {
    /// Encryption or decryption failed. On decrypt this means a key
    /// mismatch or corrupt ciphertext — a fatal configuration error,
    /// never something to paper over by returning ciphertext.
    #[error("cipher failure: {0}")]
    Cipher(String),

    /// A protected value was used in a form its state does not allow
    /// (e.g. serializing a raw plaintext field).
    #[error("invalid protected-value state: {0}")]
    InvalidState(String),
}
