//! Proof System
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs   - Public key commitment (key hash)         │
//! │  verify.rs       - Schnorr-VRF prove / verify / output      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod verify;

// Re-export key types
pub use commitment::hash_of_key;
pub use verify::{verify, output_from_proof, VerificationError, VrfKeypair, VrfProof};
