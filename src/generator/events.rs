//! Generator Events
//!
//! Notifications emitted by state transitions, drained by the host and fanned
//! out to subscribers.

use serde::{Serialize, Deserialize};

use crate::core::types::{Address, KeyHash, RequestId, Seed, Sequence};

/// Something observable happened to the generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedEvent {
    /// A randomness request was sent for `sequence`.
    RandomSeedRequested {
        sequence: Sequence,
        request_id: RequestId,
    },

    /// The oracle delivered the input seed for `sequence`.
    RandomSeedGenerated {
        sequence: Sequence,
        input_seed: Seed,
    },

    /// A valid proof revealed the secret seed for `sequence`.
    RandomSeedRevealed {
        sequence: Sequence,
        secret_seed: Seed,
    },

    /// The trusted proving key was rotated.
    KeyHashChanged {
        old: KeyHash,
        new: KeyHash,
    },

    /// The oracle provider was rotated.
    OracleProviderChanged {
        old: Address,
        new: Address,
    },

    /// An outstanding request was abandoned by a provider rotation; the
    /// sequence will be requested again.
    RequestAbandoned {
        sequence: Sequence,
        request_id: RequestId,
    },

    /// Generation paused.
    Paused {
        by: Address,
    },

    /// Generation resumed.
    Unpaused {
        by: Address,
    },
}

impl SeedEvent {
    /// Sequence the event refers to, if any.
    pub fn sequence(&self) -> Option<Sequence> {
        match self {
            SeedEvent::RandomSeedRequested { sequence, .. }
            | SeedEvent::RandomSeedGenerated { sequence, .. }
            | SeedEvent::RandomSeedRevealed { sequence, .. }
            | SeedEvent::RequestAbandoned { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            SeedEvent::RandomSeedRequested { .. } => "RandomSeedRequested",
            SeedEvent::RandomSeedGenerated { .. } => "RandomSeedGenerated",
            SeedEvent::RandomSeedRevealed { .. } => "RandomSeedRevealed",
            SeedEvent::KeyHashChanged { .. } => "KeyHashChanged",
            SeedEvent::OracleProviderChanged { .. } => "OracleProviderChanged",
            SeedEvent::RequestAbandoned { .. } => "RequestAbandoned",
            SeedEvent::Paused { .. } => "Paused",
            SeedEvent::Unpaused { .. } => "Unpaused",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_sequence() {
        let e = SeedEvent::RandomSeedRevealed { sequence: 3, secret_seed: Seed::from_u64(1) };
        assert_eq!(e.sequence(), Some(3));
        assert_eq!(e.name(), "RandomSeedRevealed");

        let p = SeedEvent::Paused { by: Address::repeat(1) };
        assert_eq!(p.sequence(), None);
    }

    #[test]
    fn test_event_json() {
        let e = SeedEvent::RandomSeedGenerated { sequence: 0, input_seed: Seed::from_u64(153) };
        let json = serde_json::to_string(&e).unwrap();
        let back: SeedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
