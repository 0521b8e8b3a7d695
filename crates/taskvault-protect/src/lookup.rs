//! Deterministic lookup hashing for equality search on encrypted fields.

use sha2::{Digest, Sha256};

/// One-way, normalized hash of a sensitive value, hex-encoded.
///
/// Input is trimmed and case-folded first, so lookups are
/// whitespace- and case-insensitive. The hash is deliberately unsalted:
/// the same input must always yield the same digest or an index over it
/// is useless. That makes equal values linkable across rows — an
/// accepted trade-off for indexable lookup. This is NOT a password
/// hash; secrets go through Argon2id.
pub fn lookup_hash(value: &str) -> String {
    let normalized = value.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(lookup_hash("alice@example.com"), lookup_hash("alice@example.com"));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(lookup_hash("Alice@Example.COM"), lookup_hash("alice@example.com"));
        assert_eq!(lookup_hash("  alice@example.com  "), lookup_hash("alice@example.com"));
    }

    #[test]
    fn distinct_inputs_distinct_digests() {
        assert_ne!(lookup_hash("alice@example.com"), lookup_hash("bob@example.com"));
    }

    #[test]
    fn digest_is_hex_sha256() {
        let digest = lookup_hash("anything");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
