//! Proving Key Commitment
//!
//! The generator never stores the operator's VRF public key directly; it only
//! trusts a hash of it. A proof carries its own public key, and that key is
//! accepted only if it hashes to the configured commitment.

use crate::core::hash::{hash_with_domain, KEY_HASH_DOMAIN};
use crate::core::types::KeyHash;

/// Length of an encoded VRF public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Compute the commitment for a raw public key.
pub fn hash_of_key(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> KeyHash {
    KeyHash(hash_with_domain(KEY_HASH_DOMAIN, public_key))
}

impl KeyHash {
    /// Check whether `public_key` hashes to this commitment.
    pub fn commits_to(&self, public_key: &[u8; PUBLIC_KEY_LENGTH]) -> bool {
        hash_of_key(public_key) == *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_determinism() {
        let pk = [7u8; 32];
        assert_eq!(hash_of_key(&pk), hash_of_key(&pk));
        assert!(hash_of_key(&pk).commits_to(&pk));
    }

    #[test]
    fn test_wrong_key_fails() {
        let commitment = hash_of_key(&[7u8; 32]);
        let mut other = [7u8; 32];
        other[0] = 0xFF;
        assert!(!commitment.commits_to(&other));
    }
}
