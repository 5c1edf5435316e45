//! Local Oracle Network
//!
//! In-process stand-in for an external randomness oracle. The generator holds
//! an [`OracleClient`] that pushes requests over an mpsc channel; the
//! [`LocalOracle`] end accepts them, waits, and delivers random values as
//! [`OracleCallback`]s.
//!
//! Each registered requester has a maximum pending time. A request still
//! queued past that window is dropped and never answered, exactly like a
//! real oracle whose fulfilment window elapsed.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::core::hash::{DomainHasher, REQUEST_ID_DOMAIN};
use crate::core::rng::DeterministicRng;
use crate::core::types::{Address, RequestId};
use crate::error::OracleError;
use crate::oracle::{OracleCallback, RandomnessOracle};

/// Request as seen by the oracle network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OracleRequest {
    /// Id echoed back in the callback.
    pub request_id: RequestId,
    /// Who asked.
    pub consumer: Address,
}

/// Generator-side handle to a [`LocalOracle`].
pub struct OracleClient {
    handle: Address,
    nonce: u64,
    tx: mpsc::UnboundedSender<OracleRequest>,
}

impl RandomnessOracle for OracleClient {
    fn handle(&self) -> Address {
        self.handle
    }

    fn request_random_value(&mut self, consumer: Address) -> Result<RequestId, OracleError> {
        let nonce = self.nonce + 1;

        let mut hasher = DomainHasher::new(REQUEST_ID_DOMAIN);
        hasher.update_bytes(&self.handle.0);
        hasher.update_bytes(&consumer.0);
        hasher.update_u64(nonce);
        let request_id = RequestId(hasher.finalize());

        self.tx
            .send(OracleRequest { request_id, consumer })
            .map_err(|_| OracleError::Disconnected)?;
        self.nonce = nonce;

        Ok(request_id)
    }
}

#[derive(Debug)]
struct QueuedRequest {
    request: OracleRequest,
    received_at: i64,
}

/// The oracle side of the channel.
pub struct LocalOracle {
    handle: Address,
    rx: mpsc::UnboundedReceiver<OracleRequest>,
    /// consumer -> max pending seconds
    requesters: BTreeMap<Address, u64>,
    queue: Vec<QueuedRequest>,
    rng: DeterministicRng,
}

impl LocalOracle {
    /// Create a connected client/oracle pair.
    pub fn channel(handle: Address, rng_seed: u64) -> (OracleClient, LocalOracle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = OracleClient { handle, nonce: 0, tx };
        let oracle = LocalOracle {
            handle,
            rx,
            requesters: BTreeMap::new(),
            queue: Vec::new(),
            rng: DeterministicRng::new(rng_seed),
        };
        (client, oracle)
    }

    /// Oracle identity.
    pub fn handle(&self) -> Address {
        self.handle
    }

    /// Allow `consumer` to request values, each answered within `max_pending_secs`.
    pub fn add_requester(&mut self, consumer: Address, max_pending_secs: u64) {
        self.requesters.insert(consumer, max_pending_secs);
    }

    /// Number of accepted, unanswered requests.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Pull newly submitted requests off the channel, stamping them with `now`.
    ///
    /// Requests from unregistered consumers are discarded.
    pub fn accept(&mut self, now: i64) -> usize {
        let mut accepted = 0;
        while let Ok(request) = self.rx.try_recv() {
            if !self.requesters.contains_key(&request.consumer) {
                warn!("Oracle {} ignoring request from unregistered consumer {}", self.handle, request.consumer);
                continue;
            }
            debug!("Oracle {} accepted request {}", self.handle, request.request_id);
            self.queue.push(QueuedRequest { request, received_at: now });
            accepted += 1;
        }
        accepted
    }

    /// Answer every queued request still inside its pending window.
    ///
    /// Expired requests are dropped without a callback.
    pub fn deliver(&mut self, now: i64) -> Vec<OracleCallback> {
        let mut callbacks = Vec::with_capacity(self.queue.len());

        for queued in std::mem::take(&mut self.queue) {
            let max_pending = self
                .requesters
                .get(&queued.request.consumer)
                .copied()
                .unwrap_or(0);
            // A clock step backwards counts as no time elapsed.
            let age = now.saturating_sub(queued.received_at).max(0);

            if age as u64 > max_pending {
                warn!(
                    "Oracle {} dropping expired request {} (age {}s > {}s)",
                    self.handle, queued.request.request_id, age, max_pending
                );
                continue;
            }

            callbacks.push(OracleCallback {
                caller: self.handle,
                request_id: queued.request.request_id,
                random_value: self.rng.next_seed(),
            });
        }

        callbacks
    }

    /// One delivery round: answer what earlier rounds accepted, then accept
    /// new submissions for the next round.
    ///
    /// A request is therefore always answered at least one round after it was
    /// stamped, and its age is measured between two distinct rounds.
    pub fn tick(&mut self, now: i64) -> Vec<OracleCallback> {
        let callbacks = self.deliver(now);
        self.accept(now);
        callbacks
    }

    /// Delivery loop: every `period`, run one [`tick`](Self::tick) and forward
    /// callbacks to `callbacks`. Exits on shutdown or when the receiver of
    /// `callbacks` is gone.
    pub async fn run(
        mut self,
        callbacks: mpsc::Sender<OracleCallback>,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = interval(period);
        info!("Local oracle {} running (period {:?})", self.handle, period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = chrono::Utc::now().timestamp();
                    for callback in self.tick(now) {
                        if callbacks.send(callback).await.is_err() {
                            info!("Callback receiver closed, oracle {} stopping", self.handle);
                            return;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Local oracle {} shutting down", self.handle);
                    return;
                }
            }
        }
    }
}
