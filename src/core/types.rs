//! Primitive identifiers shared by every layer of the generator.
//!
//! All fixed-width values are stored as raw big-endian byte arrays so that
//! ordering, hashing and hex rendering agree on every platform.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of one generation cycle. Starts at 0 and only grows.
pub type Sequence = u64;

macro_rules! hex_display {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

/// A 256-bit unsigned seed value (big-endian).
///
/// Used both for oracle-supplied input seeds and for VRF-derived secret seeds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Seed(pub [u8; 32]);

impl Seed {
    /// Build a seed from a small integer (low 8 bytes, big-endian).
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Raw big-endian bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

hex_display!(Seed);

/// Commitment (hash) of a VRF public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct KeyHash(pub [u8; 32]);

hex_display!(KeyHash);

/// Identifier handed out by the oracle for one randomness request.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub [u8; 32]);

hex_display!(RequestId);

/// Account or collaborator handle (20 bytes). All zeros is the null handle.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null handle.
    pub const ZERO: Address = Address([0; 20]);

    /// Convenience constructor filling every byte with `b`.
    pub const fn repeat(b: u8) -> Self {
        Address([b; 20])
    }

    /// True for the null handle.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 20]
    }

    /// Parse a `0x`-prefixed (or bare) 40 character hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut out = [0u8; 20];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut out)?;
        Ok(Address(out))
    }
}

hex_display!(Address);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_from_u64_ordering() {
        assert!(Seed::from_u64(1) < Seed::from_u64(2));
        assert!(Seed::from_u64(u64::MAX) < Seed([0xFF; 32]));
        assert_eq!(Seed::from_u64(153).0[31], 153);
    }

    #[test]
    fn test_address_hex() {
        let addr = Address::repeat(0xAB);
        let parsed = Address::from_hex(&addr.to_string()).unwrap();
        assert_eq!(parsed, addr);
        assert!(Address::from_hex("0x1234").is_err());
        assert!(Address::ZERO.is_zero());
        assert!(!addr.is_zero());
    }
}
