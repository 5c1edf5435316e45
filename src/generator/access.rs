//! Access Control
//!
//! Explicit role map checked at each restricted entry point.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::Address;
use crate::error::{SeedError, SeedResult};

/// Capability held by an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Configuration and pause control. Also satisfies executor checks.
    Owner,
    /// May drive generation (`next`).
    Executor,
}

/// Role assignments.
#[derive(Debug, Clone)]
pub struct AccessControl {
    roles: BTreeMap<Address, BTreeSet<Role>>,
}

impl AccessControl {
    /// `owner` gets [`Role::Owner`]; a non-null `executor` gets [`Role::Executor`].
    pub fn new(owner: Address, executor: Address) -> Self {
        let mut access = Self { roles: BTreeMap::new() };
        access.grant(owner, Role::Owner);
        if !executor.is_zero() {
            access.grant(executor, Role::Executor);
        }
        access
    }

    /// True if `account` holds `role` directly.
    pub fn has_role(&self, account: &Address, role: Role) -> bool {
        self.roles.get(account).is_some_and(|r| r.contains(&role))
    }

    /// Owner check.
    pub fn require_owner(&self, caller: &Address) -> SeedResult<()> {
        if self.has_role(caller, Role::Owner) {
            Ok(())
        } else {
            Err(SeedError::OwnerForbidden(*caller))
        }
    }

    /// Executor check; owners pass as well.
    pub fn require_executor(&self, caller: &Address) -> SeedResult<()> {
        if self.has_role(caller, Role::Executor) || self.has_role(caller, Role::Owner) {
            Ok(())
        } else {
            Err(SeedError::ExecutorForbidden(*caller))
        }
    }

    /// Current owner.
    pub fn owner(&self) -> Option<Address> {
        self.roles
            .iter()
            .find(|(_, roles)| roles.contains(&Role::Owner))
            .map(|(addr, _)| *addr)
    }

    /// Assign `role` to `account`.
    pub fn grant(&mut self, account: Address, role: Role) {
        self.roles.entry(account).or_default().insert(role);
    }

    /// Remove `role` from `account`. Returns whether it was held.
    pub fn revoke(&mut self, account: &Address, role: Role) -> bool {
        let Some(roles) = self.roles.get_mut(account) else {
            return false;
        };
        let removed = roles.remove(&role);
        if roles.is_empty() {
            self.roles.remove(account);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address::repeat(1);
    const EXEC: Address = Address::repeat(2);
    const ALICE: Address = Address::repeat(3);

    #[test]
    fn test_owner_is_executor() {
        let access = AccessControl::new(OWNER, Address::ZERO);
        assert!(access.require_owner(&OWNER).is_ok());
        assert!(access.require_executor(&OWNER).is_ok());
        assert_eq!(access.require_executor(&ALICE), Err(SeedError::ExecutorForbidden(ALICE)));
        assert_eq!(access.owner(), Some(OWNER));
    }

    #[test]
    fn test_executor_not_owner() {
        let access = AccessControl::new(OWNER, EXEC);
        assert!(access.require_executor(&EXEC).is_ok());
        assert_eq!(access.require_owner(&EXEC), Err(SeedError::OwnerForbidden(EXEC)));
    }

    #[test]
    fn test_grant_revoke() {
        let mut access = AccessControl::new(OWNER, Address::ZERO);
        access.grant(ALICE, Role::Executor);
        assert!(access.require_executor(&ALICE).is_ok());
        assert!(access.revoke(&ALICE, Role::Executor));
        assert!(!access.revoke(&ALICE, Role::Executor));
        assert!(access.require_executor(&ALICE).is_err());
    }
}
