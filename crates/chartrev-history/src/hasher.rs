// hasher.rs — SHA-256 hashing helpers for content entries.
//
// All hashes in chartrev are SHA-256, lowercase hex. Content hashes let a
// reader compare file versions without diffing; line hashes link the history
// chain.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a UTF-8 string, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_str("replicaCount: 2"), hash_str("replicaCount: 2"));
        assert_ne!(hash_str("replicaCount: 2"), hash_str("replicaCount: 3"));
    }

    #[test]
    fn hash_known_value() {
        // SHA-256("") is a fixed, well-known digest.
        assert_eq!(
            hash_str(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash_is_lowercase_hex() {
        let hash = hash_bytes(b"chart");
        assert_eq!(hash.len(), 64);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }
}
