//! Core primitives.
//!
//! Identifiers, domain-separated hashing and the deterministic RNG used to
//! expand revealed seeds.

pub mod types;
pub mod hash;
pub mod rng;

// Re-export core types
pub use types::{Address, KeyHash, RequestId, Seed, Sequence};
pub use rng::DeterministicRng;
pub use hash::hash_with_domain;
