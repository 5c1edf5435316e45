//! Seed Store
//!
//! Two parallel append-only arrays indexed by sequence, plus an index from
//! input seed to the first secret revealed for it. Each slot is written at
//! most once.

use std::collections::BTreeMap;

use crate::core::types::{Seed, Sequence};
use crate::error::{SeedError, SeedResult};

/// Per-sequence seed history.
#[derive(Debug, Default)]
pub struct SeedStore {
    input_seeds: Vec<Option<Seed>>,
    secret_seeds: Vec<Option<Seed>>,
    secret_by_input: BTreeMap<Seed, Seed>,
}

impl SeedStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate empty slots up to and including `sequence`.
    pub fn allocate(&mut self, sequence: Sequence) {
        let needed = sequence as usize + 1;
        if self.input_seeds.len() < needed {
            self.input_seeds.resize(needed, None);
            self.secret_seeds.resize(needed, None);
        }
    }

    /// Record the oracle value for `sequence`.
    pub fn record_input(&mut self, sequence: Sequence, seed: Seed) -> SeedResult<()> {
        self.allocate(sequence);
        let slot = &mut self.input_seeds[sequence as usize];
        if slot.is_some() {
            return Err(SeedError::SeedAlreadyRecorded(sequence));
        }
        *slot = Some(seed);
        Ok(())
    }

    /// Record the revealed value for `sequence`. The input seed must exist.
    ///
    /// An input value the oracle delivers twice keeps the secret of its first
    /// reveal.
    pub fn record_secret(&mut self, sequence: Sequence, seed: Seed) -> SeedResult<()> {
        let input = self
            .input_at(sequence)
            .ok_or(SeedError::NoInputSeed(sequence))?;
        let slot = &mut self.secret_seeds[sequence as usize];
        if slot.is_some() {
            return Err(SeedError::SeedAlreadyRecorded(sequence));
        }
        *slot = Some(seed);
        self.secret_by_input.entry(input).or_insert(seed);
        Ok(())
    }

    /// Input seed at `sequence`, if delivered.
    pub fn input_at(&self, sequence: Sequence) -> Option<Seed> {
        self.input_seeds.get(sequence as usize).copied().flatten()
    }

    /// Secret seed at `sequence`, if revealed.
    pub fn secret_at(&self, sequence: Sequence) -> Option<Seed> {
        self.secret_seeds.get(sequence as usize).copied().flatten()
    }

    /// Secret revealed for the input value `input`.
    pub fn secret_of(&self, input: &Seed) -> Option<Seed> {
        self.secret_by_input.get(input).copied()
    }
}
