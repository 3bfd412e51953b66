//! Shared fixture for the integration tests: a vault wired to in-memory
//! ledgers, an access registry and a manual clock.

#![allow(dead_code)]

use std::sync::Arc;

use vault_contracts::{Collaborators, MemoryToken, SharedVault, Vault};
use vault_protocol::config::VaultParams;
use vault_protocol::{AccessControl, Address, ManualClock};

/// One whole asset unit (18 decimals).
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Clock start for every harness.
pub const GENESIS: u64 = 1_700_000_000;

pub fn admin() -> Address {
    Address::from_label("admin")
}

pub fn treasury() -> Address {
    Address::from_label("treasury")
}

pub fn vault_addr() -> Address {
    Address::from_label("vault")
}

pub fn user(name: &str) -> Address {
    Address::from_label(name)
}

pub struct Harness {
    pub vault: SharedVault,
    pub asset: Arc<MemoryToken>,
    pub shares: Arc<MemoryToken>,
    pub roles: Arc<AccessControl>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Default fee (60 bps) and window (14 days).
    pub fn new() -> Self {
        Self::with_params(|_| {})
    }

    /// Applies `tweak` to the default parameters before construction.
    pub fn with_params(tweak: impl FnOnce(&mut VaultParams)) -> Self {
        let asset = Arc::new(MemoryToken::with_symbol(
            Address::from_label("asset-ledger"),
            admin(),
            "ASSET",
        ));
        let shares = Arc::new(MemoryToken::with_symbol(
            Address::from_label("share-ledger"),
            admin(),
            "SHARE",
        ));
        shares.grant_minter(&admin(), vault_addr()).unwrap();
        let roles = Arc::new(AccessControl::new(admin()));
        let clock = Arc::new(ManualClock::new(GENESIS));

        let mut params = VaultParams::with_defaults(vault_addr(), treasury());
        tweak(&mut params);

        let vault = Vault::new(
            params,
            Collaborators {
                asset: asset.clone(),
                shares: shares.clone(),
                roles: roles.clone(),
                clock: clock.clone(),
            },
        )
        .unwrap();

        Self {
            vault: SharedVault::new(vault),
            asset,
            shares,
            roles,
            clock,
        }
    }

    /// Mints `amount` of asset to `account` and approves the vault for all of it.
    pub fn fund(&self, account: &Address, amount: u128) {
        self.asset.mint(&admin(), account, amount).unwrap();
        self.asset.approve(account, &vault_addr(), u128::MAX);
    }

    pub fn asset_of(&self, account: &Address) -> u128 {
        self.asset.balance_of(account)
    }

    pub fn shares_of(&self, account: &Address) -> u128 {
        self.shares.balance_of(account)
    }
}
