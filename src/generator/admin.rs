//! Admin Surface
//!
//! Owner-gated configuration: key rotation, oracle rotation, pause control
//! and the executor allow-list.

use tracing::{info, warn};

use crate::core::types::{Address, KeyHash};
use crate::error::{SeedError, SeedResult};
use crate::generator::access::Role;
use crate::generator::events::SeedEvent;
use crate::generator::sequencer::RandomSeedGenerator;
use crate::oracle::RandomnessOracle;

impl<O: RandomnessOracle> RandomSeedGenerator<O> {
    /// Rotate the trusted proving key. Applies to future reveals only.
    pub fn set_key_hash(&mut self, caller: &Address, new: KeyHash) -> SeedResult<()> {
        self.access.require_owner(caller)?;
        let old = std::mem::replace(&mut self.key_hash, new);
        info!("Key hash changed {} -> {}", old, new);
        self.emit(SeedEvent::KeyHashChanged { old, new });
        Ok(())
    }

    /// Rotate the oracle provider. Requires the paused state.
    ///
    /// An outstanding request is abandoned: its callback can no longer
    /// authenticate, and the next `next()` requests the same sequence again.
    /// Returns the previous oracle client.
    pub fn change_oracle_provider(&mut self, caller: &Address, oracle: O) -> SeedResult<O> {
        self.access.require_owner(caller)?;
        if !self.paused {
            return Err(SeedError::NotPaused);
        }

        let old = self.gateway.replace(oracle)?;
        let new = self.gateway.handle();

        if let Some(pending) = self.pending.take() {
            warn!(
                "Abandoning request {} for sequence {} after oracle rotation",
                pending.request_id, pending.target_sequence
            );
            self.orphaned = Some(pending.target_sequence);
            self.emit(SeedEvent::RequestAbandoned {
                sequence: pending.target_sequence,
                request_id: pending.request_id,
            });
        }

        info!("Oracle provider changed {} -> {}", old.handle(), new);
        self.emit(SeedEvent::OracleProviderChanged { old: old.handle(), new });
        Ok(old)
    }

    /// Stop `next` and `reveal`.
    pub fn pause(&mut self, caller: &Address) -> SeedResult<()> {
        self.access.require_owner(caller)?;
        if self.paused {
            return Err(SeedError::Paused);
        }
        self.paused = true;
        info!("Generator paused by {}", caller);
        self.emit(SeedEvent::Paused { by: *caller });
        Ok(())
    }

    /// Resume `next` and `reveal`.
    pub fn unpause(&mut self, caller: &Address) -> SeedResult<()> {
        self.access.require_owner(caller)?;
        if !self.paused {
            return Err(SeedError::NotPaused);
        }
        self.paused = false;
        info!("Generator unpaused by {}", caller);
        self.emit(SeedEvent::Unpaused { by: *caller });
        Ok(())
    }

    /// Allow `account` to call `next`.
    pub fn grant_executor(&mut self, caller: &Address, account: Address) -> SeedResult<()> {
        self.access.require_owner(caller)?;
        self.access.grant(account, Role::Executor);
        info!("Executor granted to {}", account);
        Ok(())
    }

    /// Withdraw the executor capability from `account`.
    pub fn revoke_executor(&mut self, caller: &Address, account: &Address) -> SeedResult<bool> {
        self.access.require_owner(caller)?;
        let removed = self.access.revoke(account, Role::Executor);
        if removed {
            info!("Executor revoked from {}", account);
        }
        Ok(removed)
    }
}
