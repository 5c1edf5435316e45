//! VRF Proof Verification
//!
//! Turns an oracle-supplied input seed into a secret seed that only the holder
//! of the proving key can compute, yet anyone can check.
//!
//! The VRF is schnorrkel's Schnorr-VRF over Ristretto255. A [`VrfProof`]
//! carries the public key, the input seed it was made for, the VRF
//! pre-output and the DLEQ proof, so the derived output depends on the proof
//! bytes alone.

use schnorrkel::keys::{ExpansionMode, Keypair, MiniSecretKey, PublicKey};
use schnorrkel::signing_context;
use schnorrkel::vrf::{VRFInOut, VRFPreOut, VRFProof};
use schnorrkel::SignatureError;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::types::{KeyHash, Seed};
use crate::proof::commitment::{hash_of_key, PUBLIC_KEY_LENGTH};

/// Signing context binding VRF inputs to this generator.
pub const VRF_SIGNING_CONTEXT: &[u8] = b"seedgen.vrf.input";

/// Context used when extracting output bytes from a verified VRF in/out pair.
pub const VRF_OUTPUT_CONTEXT: &[u8] = b"seedgen.vrf.output";

/// Length of the encoded DLEQ proof.
pub const VRF_PROOF_LENGTH: usize = schnorrkel::vrf::VRF_PROOF_LENGTH;

/// A VRF proof over one input seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfProof {
    /// Public key of the prover.
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
    /// Input seed the proof was computed over.
    pub seed: Seed,
    /// VRF pre-output (compressed Ristretto point).
    pub preoutput: [u8; 32],
    /// DLEQ proof bytes (`VRF_PROOF_LENGTH` long).
    pub proof: Vec<u8>,
}

impl VrfProof {
    /// Encode for transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>, VerificationError> {
        bincode::serialize(self).map_err(|e| VerificationError::Malformed(e.to_string()))
    }

    /// Decode from transport bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VerificationError> {
        bincode::deserialize(bytes).map_err(|e| VerificationError::Malformed(e.to_string()))
    }
}

/// Reasons a proof is rejected.
///
/// Callers that expose results publicly should collapse these into a single
/// rejection; the detail is for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Embedded public key does not hash to the trusted commitment.
    #[error("public key does not match key hash")]
    KeyMismatch,
    /// Proof was made for a different input seed.
    #[error("proof seed {got} does not match expected {expected}")]
    SeedMismatch {
        /// Seed the verifier expected.
        expected: Seed,
        /// Seed embedded in the proof.
        got: Seed,
    },
    /// A component failed to decode.
    #[error("malformed proof: {0}")]
    Malformed(String),
    /// The DLEQ check failed.
    #[error("VRF proof does not verify")]
    InvalidProof,
}

/// Verify `proof` against the key commitment and the expected message, and
/// return the derived output seed.
pub fn verify(key_hash: &KeyHash, message: &Seed, proof: &VrfProof) -> Result<Seed, VerificationError> {
    if !key_hash.commits_to(&proof.public_key) {
        return Err(VerificationError::KeyMismatch);
    }

    if proof.seed != *message {
        return Err(VerificationError::SeedMismatch {
            expected: *message,
            got: proof.seed,
        });
    }

    output_from_proof(proof)
}

/// Check the VRF proof in isolation and derive its output.
///
/// Does not consult any key commitment; [`verify`] layers that on top.
pub fn output_from_proof(proof: &VrfProof) -> Result<Seed, VerificationError> {
    let public = PublicKey::from_bytes(&proof.public_key).map_err(malformed("public key"))?;
    let preoutput = VRFPreOut::from_bytes(&proof.preoutput).map_err(malformed("pre-output"))?;
    if proof.proof.len() != VRF_PROOF_LENGTH {
        return Err(VerificationError::Malformed(format!(
            "proof length {} (expected {})",
            proof.proof.len(),
            VRF_PROOF_LENGTH
        )));
    }
    let dleq = VRFProof::from_bytes(&proof.proof).map_err(malformed("proof"))?;

    let context = signing_context(VRF_SIGNING_CONTEXT);
    let (inout, _) = public
        .vrf_verify(context.bytes(proof.seed.as_bytes()), &preoutput, &dleq)
        .map_err(|_| VerificationError::InvalidProof)?;

    Ok(output_of(&inout))
}

fn output_of(inout: &VRFInOut) -> Seed {
    Seed(inout.make_bytes::<[u8; 32]>(VRF_OUTPUT_CONTEXT))
}

fn malformed(what: &'static str) -> impl Fn(SignatureError) -> VerificationError {
    move |err| VerificationError::Malformed(format!("invalid {what}: {err}"))
}

/// Prover-side keypair held by the operator.
pub struct VrfKeypair {
    inner: Keypair,
}

impl VrfKeypair {
    /// Derive a keypair from 32 bytes of secret material.
    pub fn from_seed(secret: [u8; 32]) -> Result<Self, VerificationError> {
        let mini = MiniSecretKey::from_bytes(&secret).map_err(malformed("secret key"))?;
        Ok(Self {
            inner: mini.expand_to_keypair(ExpansionMode::Ed25519),
        })
    }

    /// Sample a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            inner: MiniSecretKey::generate().expand_to_keypair(ExpansionMode::Ed25519),
        }
    }

    /// Encoded public key.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.inner.public.to_bytes()
    }

    /// Commitment to publish as the generator's key hash.
    pub fn key_hash(&self) -> KeyHash {
        hash_of_key(&self.public_key())
    }

    /// Produce a proof over `seed`.
    pub fn prove(&self, seed: &Seed) -> VrfProof {
        let context = signing_context(VRF_SIGNING_CONTEXT);
        let (inout, proof, _) = self.inner.vrf_sign(context.bytes(seed.as_bytes()));

        VrfProof {
            public_key: self.public_key(),
            seed: *seed,
            preoutput: inout.to_preout().to_bytes(),
            proof: proof.to_bytes().to_vec(),
        }
    }
}
