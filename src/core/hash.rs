//! Domain-Separated Hashing
//!
//! Every digest the generator produces goes through SHA-256 with an explicit
//! domain tag, so that a key commitment can never collide with a request id
//! or an RNG seed derived from the same bytes.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type Hash32 = [u8; 32];

/// Domain for VRF public key commitments.
pub const KEY_HASH_DOMAIN: &[u8] = b"SEEDGEN_KEY_HASH_V1";

/// Domain for oracle request identifiers.
pub const REQUEST_ID_DOMAIN: &[u8] = b"SEEDGEN_REQUEST_ID_V1";

/// Domain for expanding a seed into RNG state.
pub const RNG_SEED_DOMAIN: &[u8] = b"SEEDGEN_RNG_V1";

/// Incremental hasher with a domain separator.
///
/// Order of updates is part of the digest.
pub struct DomainHasher {
    hasher: Sha256,
}

impl DomainHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u64 value (big-endian, matching seed encoding).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_be_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Hash32 {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Hash32 {
    let mut hasher = DomainHasher::new(domain);
    hasher.update_bytes(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = DomainHasher::new(b"test");
            h.update_u64(1);
            h.update_u64(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = DomainHasher::new(b"test");
            h.update_u64(2);
            h.update_u64(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let data = [1u8, 2, 3, 4];

        let hash1 = hash_with_domain(KEY_HASH_DOMAIN, &data);
        let hash2 = hash_with_domain(REQUEST_ID_DOMAIN, &data);

        assert_ne!(hash1, hash2);
        assert_eq!(hash1, hash_with_domain(KEY_HASH_DOMAIN, &data));
    }
}
