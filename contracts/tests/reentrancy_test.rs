//! Reentrancy tests.
//!
//! A hostile asset ledger calls back into the vault from inside its transfer
//! hooks. Every callback must be rejected while the outer operation
//! completes normally, and the outer operation's effects must already be
//! visible to anything that runs after it.

mod common;

use std::sync::Arc;

use parking_lot::Mutex;
use vault_contracts::{Collaborators, MemoryToken, SharedVault, Vault, VaultError};
use vault_protocol::config::VaultParams;
use vault_protocol::{
    AccessControl, Address, AssetLedger, ManualClock, TokenError,
};

use common::{admin, treasury, user, vault_addr};

/// What the hook does when it fires.
#[derive(Clone, Copy)]
enum Attack {
    Withdraw,
    Deposit,
    Query,
}

/// Asset ledger that re-enters the vault whenever `attacker` is involved in
/// a transfer.
struct HostileAsset {
    inner: MemoryToken,
    attacker: Address,
    attack: Attack,
    target: Mutex<Option<SharedVault>>,
    observed: Mutex<Vec<Result<u128, VaultError>>>,
}

impl HostileAsset {
    fn fire(&self) {
        let target = self.target.lock().clone();
        if let Some(vault) = target {
            let result = match self.attack {
                Attack::Withdraw => vault.withdraw(&self.attacker, 1).map(|w| w.asset_out),
                Attack::Deposit => vault.deposit(&self.attacker, 1),
                Attack::Query => vault.total_locked_asset(),
            };
            self.observed.lock().push(result);
        }
    }
}

impl AssetLedger for HostileAsset {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.inner.balance_of(account)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        self.inner.transfer(from, to, amount)?;
        if *to == self.attacker {
            self.fire();
        }
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.inner.transfer_from(spender, owner, to, amount)?;
        if *owner == self.attacker {
            self.fire();
        }
        Ok(())
    }
}

fn hostile_vault(attack: Attack) -> (SharedVault, Arc<HostileAsset>) {
    let attacker = user("attacker");
    let asset = Arc::new(HostileAsset {
        inner: MemoryToken::with_symbol(Address::from_label("asset-ledger"), admin(), "ASSET"),
        attacker,
        attack,
        target: Mutex::new(None),
        observed: Mutex::new(Vec::new()),
    });
    let shares = Arc::new(MemoryToken::with_symbol(
        Address::from_label("share-ledger"),
        admin(),
        "SHARE",
    ));
    shares.grant_minter(&admin(), vault_addr()).unwrap();

    let vault = Vault::new(
        VaultParams::with_defaults(vault_addr(), treasury()),
        Collaborators {
            asset: asset.clone(),
            shares,
            roles: Arc::new(AccessControl::new(admin())),
            clock: Arc::new(ManualClock::new(0)),
        },
    )
    .unwrap();
    let shared = SharedVault::new(vault);

    asset.inner.mint(&admin(), &attacker, 1_000).unwrap();
    asset.inner.approve(&attacker, &vault_addr(), u128::MAX);
    (shared, asset)
}

fn arm(asset: &HostileAsset, vault: &SharedVault) {
    *asset.target.lock() = Some(vault.clone());
}

#[test]
fn withdraw_callback_cannot_withdraw_again() {
    let (vault, asset) = hostile_vault(Attack::Withdraw);
    let attacker = asset.attacker;
    vault.deposit(&attacker, 1_000).unwrap();
    vault.set_penalty_pause(&admin(), true).unwrap();

    arm(&asset, &vault);
    let w = vault.withdraw(&attacker, 500).unwrap();
    assert_eq!(w.net, 500);

    assert_eq!(*asset.observed.lock(), vec![Err(VaultError::Reentrancy)]);
    assert_eq!(vault.total_shares().unwrap(), 500);
    assert_eq!(vault.total_locked_asset().unwrap(), 500);
    assert_eq!(asset.balance_of(&attacker), 500);
}

#[test]
fn deposit_callback_cannot_deposit_again() {
    let (vault, asset) = hostile_vault(Attack::Deposit);
    let attacker = asset.attacker;
    arm(&asset, &vault);

    assert_eq!(vault.deposit(&attacker, 400).unwrap(), 400);
    assert_eq!(*asset.observed.lock(), vec![Err(VaultError::Reentrancy)]);
    assert_eq!(vault.total_locked_asset().unwrap(), 400);
    assert_eq!(vault.drain_events().unwrap().len(), 1);
}

#[test]
fn queries_are_rejected_mid_operation() {
    let (vault, asset) = hostile_vault(Attack::Query);
    let attacker = asset.attacker;
    arm(&asset, &vault);

    vault.deposit(&attacker, 100).unwrap();
    assert_eq!(*asset.observed.lock(), vec![Err(VaultError::Reentrancy)]);
    // Outside the operation the same query succeeds.
    assert_eq!(vault.total_locked_asset().unwrap(), 100);
}

#[test]
fn other_threads_wait_instead_of_failing() {
    let (vault, asset) = hostile_vault(Attack::Query);
    let attacker = asset.attacker;
    vault.deposit(&attacker, 100).unwrap();

    let reader = {
        let vault = vault.clone();
        std::thread::spawn(move || vault.total_locked_asset())
    };
    let held = vault.with_mut(|v| {
        std::thread::sleep(std::time::Duration::from_millis(20));
        Ok(v.total_locked_asset())
    });
    assert_eq!(held, Ok(100));
    assert_eq!(reader.join().unwrap(), Ok(100));
}
