//! Salted password digests.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Fresh random salt for a new account.
pub fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Hex-encoded SHA-256 of `salt || password`.
pub fn digest(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a candidate password against a stored digest.
pub fn matches(candidate: &str, salt: &str, expected_digest: &str) -> bool {
    let computed = digest(candidate, salt);
    // Compare every byte so the running time does not depend on the mismatch position.
    computed.len() == expected_digest.len()
        && computed
            .bytes()
            .zip(expected_digest.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_depends_on_salt() {
        assert_ne!(digest("secret", "a"), digest("secret", "b"));
        assert_eq!(digest("secret", "a").len(), 64);
    }

    #[test]
    fn matches_only_the_right_password() {
        let salt = new_salt();
        let stored = digest("owl123", &salt);
        assert!(matches("owl123", &salt, &stored));
        assert!(!matches("owl124", &salt, &stored));
        assert!(!matches("owl123", "other", &stored));
    }
}
