//! The protected-field value type.
//!
//! A PII value exists in exactly one of three forms: raw plaintext held
//! transiently on a write path, the encrypted at-rest form with its
//! displayable redaction, or a reveal-pending marker that tells the
//! serialization layer to decrypt straight into the response stream.
//! Decrypted plaintext is never stored back on the value.

use serde::ser::Error as SerError;
use serde::{Serialize, Serializer};
use zeroize::Zeroizing;

use crate::cipher::FieldCipher;
use crate::error::ProtectError;
use crate::lookup::lookup_hash;
use crate::redact::mask;

/// A personally-identifiable value in one of its three forms.
#[derive(Clone)]
pub enum ProtectedField {
    /// Plaintext, alive only during a write path. Never persisted and
    /// never serialized.
    Raw(String),
    /// At-rest form. `redacted` is displayable without decryption;
    /// `hash` is present only for fields that need equality lookup.
    Encrypted {
        ciphertext: String,
        redacted: String,
        hash: Option<String>,
    },
    /// Serialization-time marker: decrypt now, emit the plaintext into
    /// the response stream, never materialize it on the object.
    RevealPending { ciphertext: String },
}

impl ProtectedField {
    /// Encrypt a raw value into its at-rest form.
    ///
    /// Computes the redacted display form and, when `lookup` is set,
    /// the deterministic equality-lookup hash.
    pub fn protect(cipher: &FieldCipher, raw: &str, lookup: bool) -> Result<Self, ProtectError> {
        let ciphertext = cipher.encrypt(raw.as_bytes())?;
        Ok(Self::Encrypted {
            ciphertext,
            redacted: mask(raw),
            hash: lookup.then(|| lookup_hash(raw)),
        })
    }

    /// The displayable redacted form. Never touches the cipher.
    ///
    /// `None` for states that carry no redaction (raw, reveal-pending).
    pub fn redacted(&self) -> Option<&str> {
        match self {
            Self::Encrypted { redacted, .. } => Some(redacted),
            Self::Raw(_) | Self::RevealPending { .. } => None,
        }
    }

    /// The equality-lookup hash, if this field is lookup-eligible.
    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::Encrypted { hash, .. } => hash.as_deref(),
            Self::Raw(_) | Self::RevealPending { .. } => None,
        }
    }

    /// The stored ciphertext, if this field is in an encrypted state.
    pub fn ciphertext(&self) -> Option<&str> {
        match self {
            Self::Encrypted { ciphertext, .. } | Self::RevealPending { ciphertext } => {
                Some(ciphertext)
            }
            Self::Raw(_) => None,
        }
    }

    /// Convert the at-rest form into the reveal-pending marker.
    ///
    /// The redaction and hash are dropped on purpose: a reveal-pending
    /// value has exactly one legitimate destination, the response
    /// stream.
    pub fn mark_reveal(self) -> Result<Self, ProtectError> {
        match self {
            Self::Encrypted { ciphertext, .. } => Ok(Self::RevealPending { ciphertext }),
            Self::RevealPending { .. } => Ok(self),
            Self::Raw(_) => Err(ProtectError::InvalidState(
                "raw value cannot be marked for reveal".into(),
            )),
        }
    }

    /// Decrypt and return the plaintext. The only plaintext-producing
    /// path besides serialization of a reveal-pending value.
    ///
    /// The result zeroizes on drop; callers must not store it.
    pub fn reveal(&self, cipher: &FieldCipher) -> Result<Zeroizing<String>, ProtectError> {
        match self {
            Self::Encrypted { ciphertext, .. } | Self::RevealPending { ciphertext } => {
                let bytes = Zeroizing::new(cipher.decrypt(ciphertext)?);
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| ProtectError::Cipher(format!("decrypted non-UTF-8: {e}")))?;
                Ok(Zeroizing::new(text.to_string()))
            }
            Self::Raw(value) => Ok(Zeroizing::new(value.clone())),
        }
    }

    /// The value to write onto the wire, dispatched by state.
    ///
    /// Encrypted emits the redaction; reveal-pending decrypts into the
    /// output; raw refuses — it must never reach serialization.
    pub fn wire_value(&self, cipher: &FieldCipher) -> Result<String, ProtectError> {
        match self {
            Self::Encrypted { redacted, .. } => Ok(redacted.clone()),
            Self::RevealPending { .. } => Ok(self.reveal(cipher)?.to_string()),
            Self::Raw(_) => Err(ProtectError::InvalidState(
                "raw value must never be serialized".into(),
            )),
        }
    }
}

/// Plain serde serialization emits only the redacted form. States that
/// need the cipher (reveal-pending) or must never appear (raw) error
/// out; the reveal path goes through [`ProtectedField::wire_value`].
impl Serialize for ProtectedField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Encrypted { redacted, .. } => serializer.serialize_str(redacted),
            Self::RevealPending { .. } => Err(S::Error::custom(
                "reveal-pending value requires cipher-aware serialization",
            )),
            Self::Raw(_) => Err(S::Error::custom("raw protected value is not serializable")),
        }
    }
}

impl std::fmt::Debug for ProtectedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw(_) => f.write_str("ProtectedField::Raw([REDACTED])"),
            Self::Encrypted { redacted, hash, .. } => f
                .debug_struct("ProtectedField::Encrypted")
                .field("redacted", redacted)
                .field("lookup", &hash.is_some())
                .finish(),
            Self::RevealPending { .. } => f.write_str("ProtectedField::RevealPending(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        FieldCipher::new([3u8; 32])
    }

    #[test]
    fn protect_reveal_roundtrip() {
        let c = cipher();
        let field = ProtectedField::protect(&c, "alice@example.com", true).unwrap();
        assert_eq!(field.reveal(&c).unwrap().as_str(), "alice@example.com");
    }

    #[test]
    fn redaction_is_cipher_free_and_masked() {
        let c = cipher();
        let field = ProtectedField::protect(&c, "alice@example.com", false).unwrap();
        let redacted = field.redacted().unwrap();
        assert_eq!(redacted, "a***@e***.com");
        assert_ne!(redacted, "alice@example.com");
    }

    #[test]
    fn lookup_hash_only_when_requested() {
        let c = cipher();
        let with = ProtectedField::protect(&c, "alice@example.com", true).unwrap();
        let without = ProtectedField::protect(&c, "Display Name", false).unwrap();
        assert!(with.hash().is_some());
        assert!(without.hash().is_none());
        assert_eq!(
            with.hash().unwrap(),
            crate::lookup::lookup_hash("alice@example.com")
        );
    }

    #[test]
    fn wrong_key_reveal_is_an_error() {
        let field = ProtectedField::protect(&cipher(), "secret", false).unwrap();
        let other = FieldCipher::new([9u8; 32]);
        assert!(field.reveal(&other).is_err());
    }

    #[test]
    fn mark_reveal_decrypts_on_wire() {
        let c = cipher();
        let field = ProtectedField::protect(&c, "note text", false).unwrap();
        let pending = field.mark_reveal().unwrap();
        assert_eq!(pending.wire_value(&c).unwrap(), "note text");
    }

    #[test]
    fn encrypted_serializes_as_redaction() {
        let c = cipher();
        let field = ProtectedField::protect(&c, "john@doe.com", true).unwrap();
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, "\"j***@d***.com\"");
    }

    #[test]
    fn raw_and_pending_refuse_plain_serialization() {
        let c = cipher();
        let raw = ProtectedField::Raw("plaintext".into());
        assert!(serde_json::to_string(&raw).is_err());

        let pending = ProtectedField::protect(&c, "x@y.com", false)
            .unwrap()
            .mark_reveal()
            .unwrap();
        assert!(serde_json::to_string(&pending).is_err());
    }

    #[test]
    fn debug_never_shows_plaintext() {
        let c = cipher();
        let raw = ProtectedField::Raw("alice@example.com".into());
        assert!(!format!("{raw:?}").contains("alice"));

        let field = ProtectedField::protect(&c, "alice@example.com", true).unwrap();
        let printed = format!("{field:?}");
        assert!(printed.contains("a***@e***.com"));
        assert!(!printed.contains("alice@example.com"));
    }
}
