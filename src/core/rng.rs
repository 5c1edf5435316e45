//! Deterministic Random Number Generator
//!
//! Expands a 256-bit seed into a reproducible stream using Xorshift128+.
//! Consumers of revealed secret seeds (loot rolls, matchmaking) use this to
//! turn one verified seed into as many draws as they need, and anyone holding
//! the same seed can replay the exact draws.

use serde::{Serialize, Deserialize};

use super::hash::{DomainHasher, RNG_SEED_DOMAIN};
use super::types::Seed;

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use seedgen::core::rng::DeterministicRng;
/// use seedgen::core::types::Seed;
///
/// let seed = Seed::from_u64(7);
/// let mut a = DeterministicRng::from_secret_seed(&seed);
/// let mut b = DeterministicRng::from_secret_seed(&seed);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create RNG from a full 256-bit seed.
    ///
    /// The seed is compressed through SHA-256 so that every input bit
    /// influences the initial state.
    pub fn from_secret_seed(seed: &Seed) -> Self {
        let mut hasher = DomainHasher::new(RNG_SEED_DOMAIN);
        hasher.update_bytes(seed.as_bytes());
        let digest = hasher.finalize();

        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        lo.copy_from_slice(&digest[0..8]);
        hi.copy_from_slice(&digest[8..16]);

        let state = [u64::from_le_bytes(lo), u64::from_le_bytes(hi)];
        if state == [0, 0] {
            return Self { state: [1, 1] };
        }
        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a full 256-bit seed value.
    pub fn next_seed(&mut self) -> Seed {
        let mut bytes = [0u8; 32];
        for chunk in bytes.chunks_mut(8) {
            chunk.copy_from_slice(&self.next_u64().to_be_bytes());
        }
        Seed(bytes)
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_below(max as u64) as u32
    }

    /// Generate a random integer in range [0, max) over the full u64 range.
    ///
    /// Plain modulo: slightly biased when `max` does not divide 2^64.
    #[inline]
    pub fn next_below(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        self.next_u64() % max
    }

    /// Shuffle a slice in place using Fisher-Yates algorithm.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.next_below((i + 1) as u64) as usize;
            slice.swap(i, j);
        }
    }

    /// Select a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let idx = self.next_below(slice.len() as u64) as usize;
            Some(&slice[idx])
        }
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

/// SplitMix64 for seed initialization.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
