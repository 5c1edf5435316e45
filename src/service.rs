//! Async Seed Service
//!
//! Shares one [`RandomSeedGenerator`] between tasks and turns oracle
//! callbacks arriving over a channel into `fulfill` calls. Every state
//! transition is serialized by the generator lock; emitted events are fanned
//! out to subscribers after the lock is released.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{info, instrument, warn};

use crate::core::types::{Address, KeyHash, RequestId, Seed, Sequence};
use crate::error::SeedResult;
use crate::generator::{RandomSeedGenerator, SeedEvent, Sequences};
use crate::oracle::{OracleCallback, RandomnessOracle};
use crate::proof::verify::VrfProof;

/// Capacity of the event fan-out channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Shared handle to a generator.
pub struct SeedService<O> {
    generator: Arc<RwLock<RandomSeedGenerator<O>>>,
    events: broadcast::Sender<SeedEvent>,
}

impl<O> Clone for SeedService<O> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            events: self.events.clone(),
        }
    }
}

impl<O: RandomnessOracle> SeedService<O> {
    /// Wrap a generator.
    pub fn new(generator: RandomSeedGenerator<O>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            generator: Arc::new(RwLock::new(generator)),
            events,
        }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SeedEvent> {
        self.events.subscribe()
    }

    async fn mutate<T, F>(&self, op: F) -> SeedResult<T>
    where
        F: FnOnce(&mut RandomSeedGenerator<O>) -> SeedResult<T>,
    {
        let (result, events) = {
            let mut generator = self.generator.write().await;
            let result = op(&mut generator);
            (result, generator.drain_events())
        };

        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        result
    }

    /// See [`RandomSeedGenerator::next`].
    #[instrument(skip(self))]
    pub async fn next(&self, caller: Address) -> SeedResult<RequestId> {
        self.mutate(|g| g.next(&caller)).await
    }

    /// Apply one oracle callback.
    #[instrument(skip(self))]
    pub async fn fulfill(&self, callback: OracleCallback) -> SeedResult<Sequence> {
        self.mutate(|g| g.fulfill(&callback.caller, callback.request_id, callback.random_value))
            .await
    }

    /// See [`RandomSeedGenerator::reveal`].
    #[instrument(skip(self, proof))]
    pub async fn reveal(&self, proof: &VrfProof) -> SeedResult<Seed> {
        self.mutate(|g| g.reveal(proof)).await
    }

    /// See [`RandomSeedGenerator::reveal_encoded`].
    #[instrument(skip(self, bytes))]
    pub async fn reveal_encoded(&self, bytes: &[u8]) -> SeedResult<Seed> {
        self.mutate(|g| g.reveal_encoded(bytes)).await
    }

    /// See [`RandomSeedGenerator::set_key_hash`].
    pub async fn set_key_hash(&self, caller: Address, key_hash: KeyHash) -> SeedResult<()> {
        self.mutate(|g| g.set_key_hash(&caller, key_hash)).await
    }

    /// See [`RandomSeedGenerator::change_oracle_provider`].
    pub async fn change_oracle_provider(&self, caller: Address, oracle: O) -> SeedResult<O> {
        self.mutate(|g| g.change_oracle_provider(&caller, oracle)).await
    }

    /// See [`RandomSeedGenerator::pause`].
    pub async fn pause(&self, caller: Address) -> SeedResult<()> {
        self.mutate(|g| g.pause(&caller)).await
    }

    /// See [`RandomSeedGenerator::unpause`].
    pub async fn unpause(&self, caller: Address) -> SeedResult<()> {
        self.mutate(|g| g.unpause(&caller)).await
    }

    /// See [`RandomSeedGenerator::verify_and_compute_seed`].
    pub async fn verify_and_compute_seed(&self, sequence: Sequence, proof: &VrfProof) -> SeedResult<Seed> {
        self.generator.read().await.verify_and_compute_seed(sequence, proof)
    }

    /// Counter snapshot.
    pub async fn sequences(&self) -> Sequences {
        self.generator.read().await.sequences()
    }

    /// Outstanding request id.
    pub async fn pending_request(&self) -> Option<RequestId> {
        self.generator.read().await.pending_request()
    }

    /// Input seed at `sequence`.
    pub async fn input_seed_at(&self, sequence: Sequence) -> SeedResult<Seed> {
        self.generator.read().await.input_seed_at(sequence)
    }

    /// Secret seed at `sequence`.
    pub async fn secret_seed_at(&self, sequence: Sequence) -> SeedResult<Seed> {
        self.generator.read().await.secret_seed_at(sequence)
    }

    /// Secret seed for an input seed value.
    pub async fn secret_seed_of(&self, input: Seed) -> SeedResult<Seed> {
        self.generator.read().await.secret_seed_of(&input)
    }

    /// Apply callbacks from `callbacks` until shutdown or until every sender
    /// is gone. Rejected callbacks are logged and dropped.
    pub async fn pump_callbacks(
        &self,
        mut callbacks: mpsc::Receiver<OracleCallback>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                received = callbacks.recv() => {
                    let Some(callback) = received else {
                        info!("Oracle callback channel closed");
                        return;
                    };
                    if let Err(e) = self.fulfill(callback).await {
                        warn!(
                            "Rejected oracle callback {} from {}: {}",
                            callback.request_id, callback.caller, e
                        );
                    }
                }
                _ = shutdown.recv() => {
                    info!("Callback pump shutting down");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    use crate::error::SeedError;
    use crate::generator::GeneratorParams;
    use crate::oracle::{LocalOracle, OracleClient};
    use crate::proof::verify::VrfKeypair;

    const OWNER: Address = Address::repeat(0x01);
    const CONSUMER: Address = Address::repeat(0x0C);
    const ORACLE: Address = Address::repeat(0x0A);

    struct Running {
        service: SeedService<OracleClient>,
        key: VrfKeypair,
        shutdown: broadcast::Sender<()>,
    }

    fn start(max_depth: u64) -> Running {
        let key = VrfKeypair::from_seed([0x42; 32]).unwrap();
        let (client, mut oracle) = LocalOracle::channel(ORACLE, 99);
        oracle.add_requester(CONSUMER, 300);

        let generator = RandomSeedGenerator::new(
            GeneratorParams {
                owner: OWNER,
                executor: Address::ZERO,
                consumer: CONSUMER,
                key_hash: key.key_hash(),
                max_depth,
            },
            client,
        )
        .unwrap();
        let service = SeedService::new(generator);

        let (shutdown, _) = broadcast::channel(1);
        let (cb_tx, cb_rx) = mpsc::channel(16);
        tokio::spawn(oracle.run(cb_tx, Duration::from_millis(5), shutdown.subscribe()));

        let pump = service.clone();
        let pump_shutdown = shutdown.subscribe();
        tokio::spawn(async move { pump.pump_callbacks(cb_rx, pump_shutdown).await });

        Running { service, key, shutdown }
    }

    async fn wait_generated(events: &mut broadcast::Receiver<SeedEvent>) -> (Sequence, Seed) {
        loop {
            let event = timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("timed out waiting for seed")
                .unwrap();
            if let SeedEvent::RandomSeedGenerated { sequence, input_seed } = event {
                return (sequence, input_seed);
            }
        }
    }

    #[tokio::test]
    async fn test_end_to_end_cycles() {
        let running = start(1);
        let mut events = running.service.subscribe();

        for i in 0..3u64 {
            running.service.next(OWNER).await.unwrap();
            let (sequence, input) = wait_generated(&mut events).await;
            assert_eq!(sequence, i);

            let proof = running.key.prove(&input);
            let expected = running.service.verify_and_compute_seed(i, &proof).await.unwrap();
            let secret = running.service.reveal(&proof).await.unwrap();
            assert_eq!(secret, expected);
            assert_eq!(running.service.secret_seed_at(i).await.unwrap(), secret);
            assert_eq!(running.service.secret_seed_of(input).await.unwrap(), secret);
        }

        let seqs = running.service.sequences().await;
        assert_eq!((seqs.next_request, seqs.next_reveal), (3, 3));
        let _ = running.shutdown.send(());
    }

    #[tokio::test]
    async fn test_backpressure_through_service() {
        let running = start(1);
        let mut events = running.service.subscribe();

        running.service.next(OWNER).await.unwrap();
        wait_generated(&mut events).await;

        assert!(matches!(
            running.service.next(OWNER).await,
            Err(SeedError::TooManyPendingReveals { .. })
        ));
        assert_eq!(running.service.pending_request().await, None);
        let _ = running.shutdown.send(());
    }

    #[tokio::test]
    async fn test_encoded_reveal_and_events() {
        let running = start(1);
        let mut events = running.service.subscribe();

        let request_id = running.service.next(OWNER).await.unwrap();
        let first = events.recv().await.unwrap();
        assert_eq!(first, SeedEvent::RandomSeedRequested { sequence: 0, request_id });

        let (_, input) = wait_generated(&mut events).await;
        let bytes = running.key.prove(&input).to_bytes().unwrap();
        let secret = running.service.reveal_encoded(&bytes).await.unwrap();

        let revealed = events.recv().await.unwrap();
        assert_eq!(revealed, SeedEvent::RandomSeedRevealed { sequence: 0, secret_seed: secret });
        let _ = running.shutdown.send(());
    }

    #[tokio::test]
    async fn test_pump_drops_forged_callbacks() {
        let running = start(1);
        let (tx, rx) = mpsc::channel(4);
        let (_stop, stop_rx) = broadcast::channel(1);

        let service = running.service.clone();
        let pump = tokio::spawn(async move { service.pump_callbacks(rx, stop_rx).await });

        tx.send(OracleCallback {
            caller: Address::repeat(0xEE),
            request_id: RequestId([1; 32]),
            random_value: Seed::from_u64(1),
        })
        .await
        .unwrap();
        drop(tx);
        pump.await.unwrap();

        assert_eq!(running.service.input_seed_at(0).await, Err(SeedError::InputSeedNotReady));
        let _ = running.shutdown.send(());
    }
}
