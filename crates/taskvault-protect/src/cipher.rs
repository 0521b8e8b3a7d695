//! Field-level AES-256-GCM encryption with a single active key.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::ProtectError;

/// Symmetric cipher service for protected fields.
///
/// Holds the single active 256-bit key. Key management (rotation,
/// escrow) is out of scope — the key is injected at construction.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; 32],
}

impl FieldCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Encrypt plaintext bytes.
    ///
    /// Returns `base64(nonce || ciphertext || tag)` with a random
    /// 12-byte nonce per call.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, ProtectError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| ProtectError::Cipher(format!("AES-GCM encrypt: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt).
    ///
    /// Failure means a key mismatch or corrupt ciphertext.
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, ProtectError> {
        let combined = STANDARD
            .decode(encoded)
            .map_err(|e| ProtectError::Cipher(format!("base64 decode: {e}")))?;

        if combined.len() < 13 {
            return Err(ProtectError::Cipher("ciphertext too short".into()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| ProtectError::Cipher(format!("AES-GCM decrypt: {e}")))
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = FieldCipher::new([42u8; 32]);
        let encrypted = cipher.encrypt(b"alice@example.com").unwrap();
        let decrypted = cipher.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, b"alice@example.com");
    }

    #[test]
    fn wrong_key_fails_decrypt() {
        let cipher1 = FieldCipher::new([42u8; 32]);
        let cipher2 = FieldCipher::new([99u8; 32]);
        let encrypted = cipher1.encrypt(b"secret").unwrap();
        assert!(cipher2.decrypt(&encrypted).is_err());
    }

    #[test]
    fn nonce_is_random_per_call() {
        let cipher = FieldCipher::new([7u8; 32]);
        let a = cipher.encrypt(b"same input").unwrap();
        let b = cipher.encrypt(b"same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn truncated_input_fails() {
        let cipher = FieldCipher::new([7u8; 32]);
        assert!(cipher.decrypt("AAAA").is_err());
    }

    #[test]
    fn debug_never_prints_key() {
        let cipher = FieldCipher::new([1u8; 32]);
        let printed = format!("{cipher:?}");
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains('1'));
    }
}
