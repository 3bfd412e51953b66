//! # Roles & Access Control
//!
//! Privileged vault operations are gated by two orthogonal roles:
//!
//! - [`Role::Admin`] -- fee, penalty window, treasury, reward reconciliation;
//! - [`Role::Pauser`] -- the three pause switches.
//!
//! Holding one says nothing about the other. The vault only ever asks a
//! [`RoleChecker`] "does this account hold this role?"; who grants roles and
//! how is the checker's business. [`AccessControl`] is the in-memory
//! implementation used by tests and the simulator.

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::address::Address;

/// Capability required by a gated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Parameter setters and reward reconciliation.
    Admin,
    /// Pause toggles.
    Pauser,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Pauser => write!(f, "Pauser"),
        }
    }
}

/// Answers role-membership questions. Injected into the vault.
pub trait RoleChecker: Send + Sync {
    /// `true` if `account` currently holds `role`.
    fn has_role(&self, account: &Address, role: Role) -> bool;
}

/// Errors from role administration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Only admins may grant or revoke roles.
    #[error("{0} is not allowed to administer roles")]
    NotRoleAdmin(Address),

    /// The zero address cannot hold roles.
    #[error("cannot grant a role to the zero address")]
    ZeroAddress,
}

/// In-memory role registry.
///
/// The constructing account receives both roles. Admins may grant and revoke
/// either role, including revoking their own.
#[derive(Debug, Default)]
pub struct AccessControl {
    members: RwLock<HashMap<Role, HashSet<Address>>>,
}

impl AccessControl {
    /// Creates a registry where `owner` holds every role.
    pub fn new(owner: Address) -> Self {
        let mut members: HashMap<Role, HashSet<Address>> = HashMap::new();
        if !owner.is_zero() {
            members.entry(Role::Admin).or_default().insert(owner);
            members.entry(Role::Pauser).or_default().insert(owner);
        }
        Self {
            members: RwLock::new(members),
        }
    }

    /// Grants `role` to `account`. Returns `false` if it was already held.
    pub fn grant_role(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<bool, AccessError> {
        self.ensure_admin(caller)?;
        if account.is_zero() {
            return Err(AccessError::ZeroAddress);
        }
        let inserted = self.members.write().entry(role).or_default().insert(account);
        if inserted {
            info!(%account, %role, granted_by = %caller, "role granted");
        }
        Ok(inserted)
    }

    /// Revokes `role` from `account`. Returns `false` if it was not held.
    pub fn revoke_role(
        &self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<bool, AccessError> {
        self.ensure_admin(caller)?;
        let removed = self
            .members
            .write()
            .get_mut(&role)
            .map(|set| set.remove(account))
            .unwrap_or(false);
        if removed {
            info!(%account, %role, revoked_by = %caller, "role revoked");
        }
        Ok(removed)
    }

    fn ensure_admin(&self, caller: &Address) -> Result<(), AccessError> {
        if self.has_role(caller, Role::Admin) {
            Ok(())
        } else {
            Err(AccessError::NotRoleAdmin(*caller))
        }
    }
}

impl RoleChecker for AccessControl {
    fn has_role(&self, account: &Address, role: Role) -> bool {
        self.members
            .read()
            .get(&role)
            .map(|set| set.contains(account))
            .unwrap_or(false)
    }
}
