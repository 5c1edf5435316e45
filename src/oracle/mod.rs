//! Oracle Gateway
//!
//! Thin adapter between the generator and the external randomness oracle.
//! Requests go out fire-and-forget; the oracle answers later by calling
//! back into the generator, and the gateway authenticates those callbacks.
//!
//! ```text
//!   generator ──request_random_value──▶ oracle collaborator
//!       ▲                                     │
//!       └──────── OracleCallback (later) ─────┘
//! ```

pub mod local;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::types::{Address, RequestId, Seed};
use crate::error::{OracleError, SeedError, SeedResult};

pub use local::{LocalOracle, OracleClient, OracleRequest};

/// Submission side of an external randomness oracle.
pub trait RandomnessOracle: Send + Sync {
    /// Identity the oracle uses when calling back.
    fn handle(&self) -> Address;

    /// Queue a request for one random value on behalf of `consumer`.
    ///
    /// Returns immediately with the id the oracle will echo in its callback.
    fn request_random_value(&mut self, consumer: Address) -> Result<RequestId, OracleError>;
}

/// A delivered random value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleCallback {
    /// Identity of the party delivering the callback.
    pub caller: Address,
    /// Request being answered.
    pub request_id: RequestId,
    /// The random value.
    pub random_value: Seed,
}

/// Adapter owning the configured oracle client.
pub struct OracleGateway<O> {
    oracle: O,
    consumer: Address,
}

impl<O: RandomnessOracle> OracleGateway<O> {
    /// Wrap `oracle`; requests are made on behalf of `consumer`.
    pub fn new(oracle: O, consumer: Address) -> SeedResult<Self> {
        if oracle.handle().is_zero() {
            return Err(SeedError::InvalidOracleHandle);
        }
        Ok(Self { oracle, consumer })
    }

    /// Handle of the configured oracle.
    pub fn handle(&self) -> Address {
        self.oracle.handle()
    }

    /// Submit one request.
    pub fn send_request(&mut self) -> SeedResult<RequestId> {
        let id = self.oracle.request_random_value(self.consumer)?;
        debug!("Requested random value {} from oracle {}", id, self.oracle.handle());
        Ok(id)
    }

    /// Reject callbacks that do not come from the configured oracle.
    pub fn authenticate(&self, caller: &Address) -> SeedResult<()> {
        if *caller != self.oracle.handle() {
            return Err(SeedError::InvalidRequest);
        }
        Ok(())
    }

    /// Swap in a new oracle client, returning the old one.
    pub fn replace(&mut self, oracle: O) -> SeedResult<O> {
        if oracle.handle().is_zero() {
            return Err(SeedError::InvalidOracleHandle);
        }
        Ok(std::mem::replace(&mut self.oracle, oracle))
    }
}
