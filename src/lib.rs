//! # Seed Generator Server
//!
//! Chained, externally verifiable random seed generator. Each sequence is
//! backed by a two-stage protocol: an oracle supplies an unpredictable input
//! seed, then the holder of a committed VRF key reveals the secret seed with a
//! proof anyone can check.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SEEDGEN SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                               │
//! │  ├── types.rs    - Seed, KeyHash, RequestId, Address        │
//! │  ├── hash.rs     - Domain-separated SHA-256                 │
//! │  └── rng.rs      - Xorshift128+ seed expansion              │
//! │                                                              │
//! │  proof/          - Verifiable randomness                    │
//! │  ├── commitment.rs - Public key commitment                  │
//! │  └── verify.rs   - Schnorr-VRF prove / verify               │
//! │                                                              │
//! │  generator/      - Request / fulfill / reveal state machine │
//! │  oracle/         - Oracle gateway and local oracle network  │
//! │  service.rs      - Async shared service and callback pump   │
//! │  config.rs       - Env / JSON configuration                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flow
//!
//! `next()` → oracle request → (later) `fulfill()` records the input seed →
//! `reveal(proof)` verifies the proof against the input seed and the key
//! commitment, records the secret seed and advances the sequence.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod generator;
pub mod oracle;
pub mod proof;
pub mod service;

// Re-export commonly used types
pub use crate::core::types::{Address, KeyHash, RequestId, Seed, Sequence};
pub use crate::core::rng::DeterministicRng;
pub use config::GeneratorConfig;
pub use error::{ConfigError, OracleError, SeedError, SeedResult};
pub use generator::{GeneratorParams, RandomSeedGenerator, SeedEvent, Sequences};
pub use oracle::{LocalOracle, OracleCallback, OracleClient, OracleGateway, RandomnessOracle};
pub use proof::{VrfKeypair, VrfProof};
pub use service::SeedService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
