//! # Shared Vault Handle
//!
//! [`SharedVault`] is the entry point for callers on multiple threads and for
//! ledgers that may call back into the vault.
//!
//! The vault sits behind a `parking_lot::ReentrantMutex<RefCell<Vault>>`:
//!
//! - a caller on another thread blocks on the mutex until the in-flight
//!   operation returns, so operations never interleave;
//! - a caller on the *same* thread (a ledger hook re-entering mid-operation)
//!   acquires the reentrant mutex but finds the `RefCell` already borrowed,
//!   and gets [`VaultError::Reentrancy`] immediately. Read-only queries are
//!   rejected the same way while a mutation is in flight.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::warn;
use vault_protocol::Address;

use crate::error::VaultError;
use crate::events::VaultEvent;
use crate::vault::{Vault, VaultSnapshot, Withdrawal};

/// Cloneable, thread-safe handle to a single [`Vault`].
#[derive(Clone)]
pub struct SharedVault {
    inner: Arc<ReentrantMutex<RefCell<Vault>>>,
}

impl SharedVault {
    /// Takes ownership of `vault`.
    pub fn new(vault: Vault) -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(vault))),
        }
    }

    /// Runs `op` with exclusive access to the vault.
    pub fn with_mut<T>(
        &self,
        op: impl FnOnce(&mut Vault) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let guard = self.inner.lock();
        let mut vault = guard.try_borrow_mut().map_err(|_| {
            warn!("reentrant mutation rejected");
            VaultError::Reentrancy
        })?;
        op(&mut *vault)
    }

    /// Runs `query` with shared access to the vault.
    pub fn with<T>(&self, query: impl FnOnce(&Vault) -> T) -> Result<T, VaultError> {
        let guard = self.inner.lock();
        let vault = guard.try_borrow().map_err(|_| {
            warn!("reentrant query rejected");
            VaultError::Reentrancy
        })?;
        Ok(query(&*vault))
    }

    /// See [`Vault::deposit`].
    pub fn deposit(&self, caller: &Address, amount: u128) -> Result<u128, VaultError> {
        self.with_mut(|v| v.deposit(caller, amount))
    }

    /// See [`Vault::withdraw`].
    pub fn withdraw(&self, caller: &Address, shares: u128) -> Result<Withdrawal, VaultError> {
        self.with_mut(|v| v.withdraw(caller, shares))
    }

    /// See [`Vault::reward`].
    pub fn reward(&self, caller: &Address, amount: u128) -> Result<(), VaultError> {
        self.with_mut(|v| v.reward(caller, amount))
    }

    /// See [`Vault::set_penalty_fee`].
    pub fn set_penalty_fee(&self, caller: &Address, bps: u32) -> Result<(), VaultError> {
        self.with_mut(|v| v.set_penalty_fee(caller, bps))
    }

    /// See [`Vault::set_penalty_deadline`].
    pub fn set_penalty_deadline(&self, caller: &Address, secs: u64) -> Result<(), VaultError> {
        self.with_mut(|v| v.set_penalty_deadline(caller, secs))
    }

    /// See [`Vault::set_treasury_address`].
    pub fn set_treasury_address(&self, caller: &Address, treasury: Address) -> Result<(), VaultError> {
        self.with_mut(|v| v.set_treasury_address(caller, treasury))
    }

    /// See [`Vault::set_deposit_pause`].
    pub fn set_deposit_pause(&self, caller: &Address, paused: bool) -> Result<(), VaultError> {
        self.with_mut(|v| v.set_deposit_pause(caller, paused))
    }

    /// See [`Vault::set_withdraw_pause`].
    pub fn set_withdraw_pause(&self, caller: &Address, paused: bool) -> Result<(), VaultError> {
        self.with_mut(|v| v.set_withdraw_pause(caller, paused))
    }

    /// See [`Vault::set_penalty_pause`].
    pub fn set_penalty_pause(&self, caller: &Address, paused: bool) -> Result<(), VaultError> {
        self.with_mut(|v| v.set_penalty_pause(caller, paused))
    }

    /// See [`Vault::reset_rewards`].
    pub fn reset_rewards(&self, caller: &Address, sweep_to: Address) -> Result<u128, VaultError> {
        self.with_mut(|v| v.reset_rewards(caller, sweep_to))
    }

    /// See [`Vault::rate`].
    pub fn rate(&self) -> Result<u128, VaultError> {
        self.with(|v| v.rate())?
    }

    /// See [`Vault::amount_at_rate`].
    pub fn amount_at_rate(&self, shares: u128) -> Result<u128, VaultError> {
        self.with(|v| v.amount_at_rate(shares))?
    }

    /// See [`Vault::total_locked_asset`].
    pub fn total_locked_asset(&self) -> Result<u128, VaultError> {
        self.with(|v| v.total_locked_asset())
    }

    /// See [`Vault::total_shares`].
    pub fn total_shares(&self) -> Result<u128, VaultError> {
        self.with(|v| v.total_shares())
    }

    /// See [`Vault::user_deadline_of`].
    pub fn user_deadline_of(&self, account: &Address) -> Result<u64, VaultError> {
        self.with(|v| v.user_deadline_of(account))
    }

    /// See [`Vault::has_user_deadline_passed`].
    pub fn has_user_deadline_passed(&self, account: &Address) -> Result<bool, VaultError> {
        self.with(|v| v.has_user_deadline_passed(account))
    }

    /// See [`Vault::snapshot`].
    pub fn snapshot(&self) -> Result<VaultSnapshot, VaultError> {
        self.with(|v| v.snapshot())
    }

    /// See [`Vault::drain_events`].
    pub fn drain_events(&self) -> Result<Vec<VaultEvent>, VaultError> {
        self.with_mut(|v| Ok(v.drain_events()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryToken;
    use crate::vault::Collaborators;
    use vault_protocol::config::VaultParams;
    use vault_protocol::{AccessControl, ManualClock};

    fn shared() -> (SharedVault, Arc<MemoryToken>) {
        let owner = Address::from_label("owner");
        let vault_addr = Address::from_label("vault");
        let asset = Arc::new(MemoryToken::with_symbol(
            Address::from_label("asset"),
            owner,
            "ASSET",
        ));
        let shares = Arc::new(MemoryToken::with_symbol(
            Address::from_label("shares"),
            owner,
            "SHARE",
        ));
        shares.grant_minter(&owner, vault_addr).unwrap();
        let vault = Vault::new(
            VaultParams::with_defaults(vault_addr, Address::from_label("treasury")),
            Collaborators {
                asset: asset.clone(),
                shares,
                roles: Arc::new(AccessControl::new(owner)),
                clock: Arc::new(ManualClock::new(0)),
            },
        )
        .unwrap();
        (SharedVault::new(vault), asset)
    }

    #[test]
    fn nested_access_on_same_thread_is_rejected() {
        let (vault, _) = shared();
        let inner = vault.clone();
        let result = vault.with_mut(|_| inner.total_shares());
        assert_eq!(result, Err(VaultError::Reentrancy));
    }

    #[test]
    fn concurrent_deposits_serialize() {
        let (vault, asset) = shared();
        let owner = Address::from_label("owner");
        let vault_addr = Address::from_label("vault");
        let users: Vec<Address> = (0..8)
            .map(|i| Address::from_label(&format!("user-{i}")))
            .collect();
        for user in &users {
            asset.mint(&owner, user, 1_000).unwrap();
            asset.approve(user, &vault_addr, 1_000);
        }

        let handles: Vec<_> = users
            .iter()
            .map(|user| {
                let vault = vault.clone();
                let user = *user;
                std::thread::spawn(move || vault.deposit(&user, 1_000))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(vault.total_locked_asset().unwrap(), 8_000);
        assert_eq!(vault.total_shares().unwrap(), 8_000);
        assert_eq!(vault.drain_events().unwrap().len(), 8);
    }
}
