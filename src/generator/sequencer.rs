//! Sequencer
//!
//! The request / fulfill / reveal state machine.
//!
//! ```text
//!   next()          fulfill(id, value)        reveal(proof)
//!  ───────▶ pending ──────────────────▶ input ──────────────▶ secret
//!   nextRequest++                             nextReveal++
//! ```
//!
//! At most one request is in flight, reveals consume sequences strictly in
//! order, and at most `max_depth` sequences may be requested but unrevealed.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::types::{Address, KeyHash, RequestId, Seed, Sequence};
use crate::error::{SeedError, SeedResult};
use crate::generator::access::AccessControl;
use crate::generator::events::SeedEvent;
use crate::generator::store::SeedStore;
use crate::oracle::{OracleGateway, RandomnessOracle};
use crate::proof::verify::{verify, VrfProof};

/// Construction parameters.
#[derive(Clone, Debug)]
pub struct GeneratorParams {
    /// Owner account (admin surface, also allowed to call `next`).
    pub owner: Address,
    /// Additional executor, or [`Address::ZERO`] for none.
    pub executor: Address,
    /// Identity the generator uses when requesting randomness.
    pub consumer: Address,
    /// Commitment to the operator's VRF public key.
    pub key_hash: KeyHash,
    /// Maximum generated-but-unrevealed sequences.
    pub max_depth: u64,
}

/// The single outstanding oracle request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    /// Id the oracle will echo back.
    pub request_id: RequestId,
    /// Sequence the answer belongs to.
    pub target_sequence: Sequence,
}

/// Snapshot of the counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    /// Sequences for which a request has been issued.
    pub next_request: Sequence,
    /// Sequences fully revealed.
    pub next_reveal: Sequence,
    /// Backpressure bound.
    pub max_depth: u64,
}

/// Chained, VRF-verified random seed generator.
pub struct RandomSeedGenerator<O> {
    pub(crate) access: AccessControl,
    pub(crate) gateway: OracleGateway<O>,
    pub(crate) key_hash: KeyHash,
    max_depth: u64,
    pub(crate) paused: bool,
    next_request: Sequence,
    next_reveal: Sequence,
    pub(crate) pending: Option<PendingRequest>,
    /// Sequence whose request was abandoned by a provider rotation.
    pub(crate) orphaned: Option<Sequence>,
    store: SeedStore,
    events: Vec<SeedEvent>,
}

impl<O: RandomnessOracle> RandomSeedGenerator<O> {
    /// Create a generator talking to `oracle`.
    pub fn new(params: GeneratorParams, oracle: O) -> SeedResult<Self> {
        if params.max_depth == 0 {
            return Err(SeedError::InvalidMaxDepth);
        }
        let gateway = OracleGateway::new(oracle, params.consumer)?;

        info!(
            "Seed generator created: oracle={} key_hash={} max_depth={}",
            gateway.handle(),
            params.key_hash,
            params.max_depth
        );

        Ok(Self {
            access: AccessControl::new(params.owner, params.executor),
            gateway,
            key_hash: params.key_hash,
            max_depth: params.max_depth,
            paused: false,
            next_request: 0,
            next_reveal: 0,
            pending: None,
            orphaned: None,
            store: SeedStore::new(),
            events: Vec::new(),
        })
    }

    /// Request the input seed for the next sequence.
    pub fn next(&mut self, caller: &Address) -> SeedResult<RequestId> {
        self.access.require_executor(caller)?;
        if self.paused {
            return Err(SeedError::Paused);
        }
        if self.pending.is_some() {
            return Err(SeedError::RequestNotFulfilled);
        }

        // A sequence abandoned by a provider rotation is re-requested first.
        // It is already counted in next_request, so depth is unaffected.
        if let Some(sequence) = self.orphaned {
            let request_id = self.gateway.send_request()?;
            self.orphaned = None;
            self.pending = Some(PendingRequest { request_id, target_sequence: sequence });
            info!("Re-requested seed for sequence {} (request {})", sequence, request_id);
            self.emit(SeedEvent::RandomSeedRequested { sequence, request_id });
            return Ok(request_id);
        }

        let outstanding = self.next_request - self.next_reveal;
        if outstanding >= self.max_depth {
            return Err(SeedError::TooManyPendingReveals {
                pending: outstanding,
                max_depth: self.max_depth,
            });
        }

        let request_id = self.gateway.send_request()?;
        let sequence = self.next_request;
        self.store.allocate(sequence);
        self.pending = Some(PendingRequest { request_id, target_sequence: sequence });
        self.next_request += 1;

        info!("Requested seed for sequence {} (request {})", sequence, request_id);
        self.emit(SeedEvent::RandomSeedRequested { sequence, request_id });
        Ok(request_id)
    }

    /// Oracle callback delivering the input seed for the pending request.
    pub fn fulfill(&mut self, caller: &Address, request_id: RequestId, random_value: Seed) -> SeedResult<Sequence> {
        self.gateway.authenticate(caller)?;
        let pending = match self.pending {
            Some(p) if p.request_id == request_id => p,
            _ => return Err(SeedError::InvalidRequest),
        };

        let sequence = pending.target_sequence;
        self.store.record_input(sequence, random_value)?;
        self.pending = None;

        info!("Seed generated for sequence {}: {}", sequence, random_value);
        self.emit(SeedEvent::RandomSeedGenerated { sequence, input_seed: random_value });
        Ok(sequence)
    }

    /// Reveal the secret seed of the oldest unrevealed sequence.
    ///
    /// Open to anyone: the proof is the authorization.
    pub fn reveal(&mut self, proof: &VrfProof) -> SeedResult<Seed> {
        if self.paused {
            return Err(SeedError::Paused);
        }

        let sequence = self.next_reveal;
        let input = self
            .store
            .input_at(sequence)
            .ok_or(SeedError::NoInputSeed(sequence))?;
        let secret = self.check_proof(&input, proof)?;

        self.store.record_secret(sequence, secret)?;
        self.next_reveal += 1;

        info!("Seed revealed for sequence {}: {}", sequence, secret);
        self.emit(SeedEvent::RandomSeedRevealed { sequence, secret_seed: secret });
        Ok(secret)
    }

    /// [`reveal`](Self::reveal) with a transport-encoded proof.
    pub fn reveal_encoded(&mut self, bytes: &[u8]) -> SeedResult<Seed> {
        let proof = VrfProof::from_bytes(bytes).map_err(|err| {
            debug!("Rejected undecodable proof: {}", err);
            SeedError::WrongProvingKey
        })?;
        self.reveal(&proof)
    }

    /// Compute the secret seed `proof` would reveal for `sequence`, without
    /// changing state.
    pub fn verify_and_compute_seed(&self, sequence: Sequence, proof: &VrfProof) -> SeedResult<Seed> {
        let input = self
            .store
            .input_at(sequence)
            .ok_or(SeedError::NoInputSeed(sequence))?;
        self.check_proof(&input, proof)
    }

    fn check_proof(&self, input: &Seed, proof: &VrfProof) -> SeedResult<Seed> {
        verify(&self.key_hash, input, proof).map_err(|err| {
            debug!("Rejected proof for input {}: {}", input, err);
            SeedError::WrongProvingKey
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Counter snapshot.
    pub fn sequences(&self) -> Sequences {
        Sequences {
            next_request: self.next_request,
            next_reveal: self.next_reveal,
            max_depth: self.max_depth,
        }
    }

    /// Id of the outstanding request, if any.
    pub fn pending_request(&self) -> Option<RequestId> {
        self.pending.map(|p| p.request_id)
    }

    /// Input seed delivered for `sequence`.
    pub fn input_seed_at(&self, sequence: Sequence) -> SeedResult<Seed> {
        self.store.input_at(sequence).ok_or(SeedError::InputSeedNotReady)
    }

    /// Secret seed revealed for `sequence`.
    pub fn secret_seed_at(&self, sequence: Sequence) -> SeedResult<Seed> {
        if self.store.input_at(sequence).is_none() {
            return Err(SeedError::InputSeedNotReady);
        }
        self.store.secret_at(sequence).ok_or(SeedError::SecretSeedNotReady)
    }

    /// Secret seed revealed for the sequence whose input seed is `input`.
    pub fn secret_seed_of(&self, input: &Seed) -> SeedResult<Seed> {
        self.store.secret_of(input).ok_or(SeedError::SecretSeedNotReady)
    }

    /// Trusted key commitment.
    pub fn key_hash(&self) -> KeyHash {
        self.key_hash
    }

    /// Configured oracle handle.
    pub fn oracle_handle(&self) -> Address {
        self.gateway.handle()
    }

    /// Whether generation is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current owner.
    pub fn owner(&self) -> Option<Address> {
        self.access.owner()
    }

    /// Take all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<SeedEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: SeedEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::testing::{Harness, ALICE, CONSUMER, OWNER};
    use crate::oracle::LocalOracle;
    use crate::proof::verify::VrfKeypair;
    use proptest::prelude::*;

    #[test]
    fn test_zero_max_depth_rejected() {
        let err = Harness::try_new(0).err();
        assert_eq!(err, Some(SeedError::InvalidMaxDepth));
    }

    #[test]
    fn test_happy_path() {
        let mut h = Harness::new(1);

        let request_id = h.gen.next(&OWNER).unwrap();
        assert_eq!(h.gen.pending_request(), Some(request_id));
        assert_eq!(h.fulfill_all(), 1);
        assert_eq!(h.gen.pending_request(), None);

        let input = h.gen.input_seed_at(0).unwrap();
        let proof = h.key.prove(&input);
        let secret = h.gen.reveal(&proof).unwrap();

        let events = h.gen.drain_events();
        assert_eq!(
            events,
            vec![
                SeedEvent::RandomSeedRequested { sequence: 0, request_id },
                SeedEvent::RandomSeedGenerated { sequence: 0, input_seed: input },
                SeedEvent::RandomSeedRevealed { sequence: 0, secret_seed: secret },
            ]
        );
        assert_eq!(h.gen.secret_seed_at(0).unwrap(), secret);
        assert_eq!(h.gen.secret_seed_of(&input).unwrap(), secret);
    }

    #[test]
    fn test_multiple_cycles() {
        let mut h = Harness::new(1);
        for i in 0..4u64 {
            h.gen.next(&OWNER).unwrap();
            h.fulfill_all();
            let proof = h.prove_current();
            let expected = h.gen.verify_and_compute_seed(i, &proof).unwrap();
            assert_eq!(h.gen.reveal(&proof).unwrap(), expected);
            assert_eq!(
                h.gen.sequences(),
                Sequences { next_request: i + 1, next_reveal: i + 1, max_depth: 1 }
            );
        }
    }

    #[test]
    fn test_backpressure() {
        let mut h = Harness::new(1);
        h.gen.next(&OWNER).unwrap();
        assert_eq!(h.gen.next(&OWNER), Err(SeedError::RequestNotFulfilled));

        h.fulfill_all();
        assert_eq!(
            h.gen.next(&OWNER),
            Err(SeedError::TooManyPendingReveals { pending: 1, max_depth: 1 })
        );
    }

    #[test]
    fn test_depth_allows_pipelining() {
        let mut h = Harness::new(3);
        for _ in 0..3 {
            h.gen.next(&OWNER).unwrap();
            h.fulfill_all();
        }
        assert!(matches!(h.gen.next(&OWNER), Err(SeedError::TooManyPendingReveals { .. })));

        let proof = h.prove_current();
        h.gen.reveal(&proof).unwrap();
        assert!(h.gen.next(&OWNER).is_ok());
    }

    #[test]
    fn test_next_requires_executor() {
        let mut h = Harness::new(1);
        assert_eq!(h.gen.next(&ALICE), Err(SeedError::ExecutorForbidden(ALICE)));

        h.gen.grant_executor(&OWNER, ALICE).unwrap();
        assert!(h.gen.next(&ALICE).is_ok());
    }

    #[test]
    fn test_reveal_without_input_seed() {
        let mut h = Harness::new(1);
        let proof = h.key.prove(&Seed::from_u64(153));
        assert_eq!(h.gen.reveal(&proof), Err(SeedError::NoInputSeed(0)));
        assert_eq!(h.gen.verify_and_compute_seed(0, &proof), Err(SeedError::NoInputSeed(0)));

        // Requested but not fulfilled is no different.
        h.gen.next(&OWNER).unwrap();
        assert_eq!(h.gen.reveal(&proof), Err(SeedError::NoInputSeed(0)));
    }

    #[test]
    fn test_wrong_key_leaves_state_unchanged() {
        let mut h = Harness::new(1);
        h.gen.next(&OWNER).unwrap();
        h.fulfill_all();
        h.gen.drain_events();

        let input = h.gen.input_seed_at(0).unwrap();
        let rogue = VrfKeypair::from_seed([0xEE; 32]).unwrap();
        let proof = rogue.prove(&input);

        assert_eq!(h.gen.reveal(&proof), Err(SeedError::WrongProvingKey));
        assert_eq!(h.gen.verify_and_compute_seed(0, &proof), Err(SeedError::WrongProvingKey));
        assert_eq!(h.gen.sequences().next_reveal, 0);
        assert_eq!(h.gen.secret_seed_at(0), Err(SeedError::SecretSeedNotReady));
        assert!(h.gen.drain_events().is_empty());
    }

    #[test]
    fn test_reveal_encoded() {
        let mut h = Harness::new(1);
        h.gen.next(&OWNER).unwrap();
        h.fulfill_all();

        assert_eq!(h.gen.reveal_encoded(&[1, 2, 3]), Err(SeedError::WrongProvingKey));

        let bytes = h.prove_current().to_bytes().unwrap();
        assert!(h.gen.reveal_encoded(&bytes).is_ok());
    }

    #[test]
    fn test_verify_before_and_after_reveal() {
        let mut h = Harness::new(1);
        h.gen.next(&OWNER).unwrap();
        h.fulfill_all();

        let proof = h.prove_current();
        let before = h.gen.verify_and_compute_seed(0, &proof).unwrap();
        let revealed = h.gen.reveal(&proof).unwrap();
        let after = h.gen.verify_and_compute_seed(0, &proof).unwrap();

        assert_eq!(before, revealed);
        assert_eq!(after, revealed);
    }

    #[test]
    fn test_reveals_in_order() {
        let mut h = Harness::new(2);
        h.gen.next(&OWNER).unwrap();
        h.fulfill_all();
        h.gen.next(&OWNER).unwrap();
        h.fulfill_all();

        // Proof for sequence 1 cannot jump the queue.
        let input1 = h.gen.input_seed_at(1).unwrap();
        let proof1 = h.key.prove(&input1);
        assert_eq!(h.gen.reveal(&proof1), Err(SeedError::WrongProvingKey));
        assert!(h.gen.verify_and_compute_seed(1, &proof1).is_ok());
        assert_eq!(h.gen.sequences().next_reveal, 0);

        let proof0 = h.prove_current();
        h.gen.reveal(&proof0).unwrap();
        h.gen.reveal(&proof1).unwrap();
        assert_eq!(h.gen.sequences().next_reveal, 2);
    }

    #[test]
    fn test_seed_queries() {
        let mut h = Harness::new(1);
        h.gen.next(&OWNER).unwrap();
        assert_eq!(h.gen.input_seed_at(0), Err(SeedError::InputSeedNotReady));
        assert_eq!(h.gen.secret_seed_at(0), Err(SeedError::InputSeedNotReady));
        assert_eq!(h.gen.input_seed_at(5), Err(SeedError::InputSeedNotReady));

        h.fulfill_all();
        let input = h.gen.input_seed_at(0).unwrap();
        assert_eq!(h.gen.secret_seed_at(0), Err(SeedError::SecretSeedNotReady));
        assert_eq!(h.gen.secret_seed_of(&input), Err(SeedError::SecretSeedNotReady));
        assert_eq!(h.gen.secret_seed_of(&Seed::from_u64(1)), Err(SeedError::SecretSeedNotReady));
    }

    #[test]
    fn test_repeated_oracle_value_keeps_revealed_secret() {
        let mut h = Harness::new(1);
        let oracle = h.gen.oracle_handle();
        let value = Seed::from_u64(777);

        let first = h.gen.next(&OWNER).unwrap();
        h.gen.fulfill(&oracle, first, value).unwrap();
        let secret = h.gen.reveal(&h.key.prove(&value)).unwrap();
        assert_eq!(h.gen.secret_seed_of(&value), Ok(secret));

        // The oracle hands out the same value again.
        let second = h.gen.next(&OWNER).unwrap();
        assert_eq!(h.gen.fulfill(&oracle, second, value), Ok(1));
        assert_eq!(h.gen.secret_seed_of(&value), Ok(secret));
        assert_eq!(h.gen.secret_seed_at(1), Err(SeedError::SecretSeedNotReady));

        h.gen.reveal(&h.key.prove(&value)).unwrap();
        assert_eq!(h.gen.secret_seed_of(&value), Ok(secret));
        assert_eq!(h.gen.secret_seed_at(1), Ok(secret));
    }

    #[test]
    fn test_fulfill_validation() {
        let mut h = Harness::new(1);
        let request_id = h.gen.next(&OWNER).unwrap();
        let oracle = h.gen.oracle_handle();

        assert_eq!(
            h.gen.fulfill(&ALICE, request_id, Seed::from_u64(1)),
            Err(SeedError::InvalidRequest)
        );
        assert_eq!(
            h.gen.fulfill(&oracle, RequestId([1; 32]), Seed::from_u64(1)),
            Err(SeedError::InvalidRequest)
        );

        assert_eq!(h.gen.fulfill(&oracle, request_id, Seed::from_u64(1)), Ok(0));
        // Replay of the same callback.
        assert_eq!(
            h.gen.fulfill(&oracle, request_id, Seed::from_u64(2)),
            Err(SeedError::InvalidRequest)
        );
        assert_eq!(h.gen.input_seed_at(0), Ok(Seed::from_u64(1)));
    }

    #[test]
    fn test_expired_request_stalls() {
        let mut h = Harness::new(1);
        let request_id = h.gen.next(&OWNER).unwrap();

        h.oracle.accept(0);
        assert!(h.oracle.deliver(301).is_empty());

        assert_eq!(h.gen.pending_request(), Some(request_id));
        assert_eq!(h.gen.next(&OWNER), Err(SeedError::RequestNotFulfilled));
        assert!(h.gen.drain_events().iter().all(|e| e.name() != "RandomSeedGenerated"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Next,
        Fulfill,
        Reveal,
        RevealRogue,
        PauseRotateUnpause,
        StaleFulfill,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Next),
            3 => Just(Op::Fulfill),
            2 => Just(Op::Reveal),
            1 => Just(Op::RevealRogue),
            1 => Just(Op::PauseRotateUnpause),
            1 => Just(Op::StaleFulfill),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_counters_respect_invariants(
            max_depth in 1u64..4,
            ops in prop::collection::vec(op_strategy(), 1..24),
        ) {
            let mut h = Harness::new(max_depth);
            let rogue = VrfKeypair::from_seed([0xEE; 32]).unwrap();
            let mut last = h.gen.sequences();
            // (oracle handle, request id) pairs abandoned by rotations.
            let mut stale: Vec<(Address, RequestId)> = Vec::new();
            let mut rotations = 0u8;

            for op in ops {
                match op {
                    Op::Next => { let _ = h.gen.next(&OWNER); }
                    Op::Fulfill => { h.fulfill_all(); }
                    Op::Reveal => {
                        let s = h.gen.sequences().next_reveal;
                        if let Ok(input) = h.gen.input_seed_at(s) {
                            let proof = h.key.prove(&input);
                            prop_assert!(h.gen.reveal(&proof).is_ok());
                        }
                    }
                    Op::RevealRogue => {
                        let s = h.gen.sequences().next_reveal;
                        if let Ok(input) = h.gen.input_seed_at(s) {
                            prop_assert_eq!(h.gen.reveal(&rogue.prove(&input)), Err(SeedError::WrongProvingKey));
                        }
                    }
                    Op::PauseRotateUnpause => {
                        rotations += 1;
                        let old_handle = h.gen.oracle_handle();
                        if let Some(id) = h.gen.pending_request() {
                            stale.push((old_handle, id));
                        }

                        let (client, mut oracle) = LocalOracle::channel(Address::repeat(0x40 + rotations), rotations as u64);
                        oracle.add_requester(CONSUMER, 300);
                        prop_assert!(h.gen.pause(&OWNER).is_ok());
                        prop_assert!(h.gen.change_oracle_provider(&OWNER, client).is_ok());
                        prop_assert!(h.gen.unpause(&OWNER).is_ok());
                        prop_assert_eq!(h.gen.pending_request(), None);
                        h.oracle = oracle;
                    }
                    Op::StaleFulfill => {
                        let current = h.gen.oracle_handle();
                        for &(handle, id) in &stale {
                            prop_assert_eq!(h.gen.fulfill(&handle, id, Seed::from_u64(1)), Err(SeedError::InvalidRequest));
                            prop_assert_eq!(h.gen.fulfill(&current, id, Seed::from_u64(1)), Err(SeedError::InvalidRequest));
                        }
                    }
                }

                let now = h.gen.sequences();
                prop_assert!(now.next_reveal <= now.next_request);
                prop_assert!(now.next_request >= last.next_request);
                prop_assert!(now.next_reveal >= last.next_reveal);
                prop_assert!(now.next_request - now.next_reveal <= max_depth);
                prop_assert!(!h.gen.is_paused());
                // Every revealed sequence has both seeds.
                for s in 0..now.next_reveal {
                    prop_assert!(h.gen.input_seed_at(s).is_ok());
                    prop_assert!(h.gen.secret_seed_at(s).is_ok());
                }
                last = now;
            }
        }
    }
}
