//! # Vault Core
//!
//! Owns the pool totals, the penalty book and the settings, and orchestrates
//! deposit, withdraw and reward against the external ledgers.
//!
//! ## Operation Order
//!
//! Every mutating operation runs in three phases:
//!
//! 1. **Checks**: amount, pause switches, caller identity, and for withdrawals
//!    a balance preflight on both ledgers.
//! 2. **Effects**: pool totals and the penalty book are committed.
//! 3. **Interactions**: asset pulls/pushes and share mint/burn.
//!
//! Effects land before any ledger call, so a ledger that calls back into the
//! vault observes the post-operation totals. If an interaction fails, the
//! vault puts back its checkpoint, undoes the interactions that already went
//! through where it can, and returns the error. Events are journaled only
//! after every interaction succeeded.
//!
//! Withdrawals pay the redeemer before the treasury. A failed payout is fully
//! reversed (shares re-minted, pool restored). A failed fee transfer after
//! the payout keeps the withdrawal and leaves the fee in custody as surplus.
//!
//! `Vault` itself takes `&mut self` and knows nothing about threads. Wrap it
//! in a [`SharedVault`](crate::guard::SharedVault) to serialize callers and
//! reject reentrant calls.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use vault_protocol::config::VaultParams;
use vault_protocol::rate::penalty_fee;
use vault_protocol::{
    Address, AssetLedger, Clock, MathError, Pool, RoleChecker, ShareLedger,
};

use crate::error::{ConfigField, VaultError};
use crate::events::VaultEvent;
use crate::penalty::PenaltyBook;
use crate::settings::{check_address, VaultSettings};

/// The external systems a vault talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Underlying asset.
    pub asset: Arc<dyn AssetLedger>,
    /// Share token. The vault's custody account must hold its mint grant.
    pub shares: Arc<dyn ShareLedger>,
    /// Role membership for admin operations.
    pub roles: Arc<dyn RoleChecker>,
    /// Source of "now" for penalty deadlines.
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("asset", &self.asset.address())
            .field("shares", &self.shares.address())
            .finish_non_exhaustive()
    }
}

/// Serializable copy of everything the vault owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// Custody account.
    pub vault_address: Address,
    /// Pool totals.
    pub pool: Pool,
    /// Current parameters.
    pub settings: VaultSettings,
    /// Per-depositor deadlines.
    pub penalties: PenaltyBook,
}

/// Outcome of a successful withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Shares burned.
    pub shares_in: u128,
    /// Gross asset value of the burned shares.
    pub asset_out: u128,
    /// Penalty withheld from the redeemer. Zero outside the penalty window.
    pub fee: u128,
    /// Portion paid to the redeemer: `asset_out - fee`.
    pub net: u128,
}

/// A share-based custody vault.
pub struct Vault {
    address: Address,
    pool: Pool,
    pub(crate) settings: VaultSettings,
    penalties: PenaltyBook,
    pub(crate) collaborators: Collaborators,
    events: Vec<VaultEvent>,
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("address", &self.address)
            .field("pool", &self.pool)
            .field("settings", &self.settings)
            .field("depositors", &self.penalties.len())
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl Vault {
    /// Builds a vault with an empty pool and every pause switch off.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidConfig`] when the custody account, either ledger,
    /// or the treasury is the zero address, or the fee is above the cap.
    pub fn new(params: VaultParams, collaborators: Collaborators) -> Result<Self, VaultError> {
        Self::check_identities(&params.vault_address, &collaborators)?;
        let settings = VaultSettings::from_params(&params)?;
        info!(
            vault = %params.vault_address,
            asset = %collaborators.asset.address(),
            shares = %collaborators.shares.address(),
            treasury = %settings.treasury,
            fee_bps = settings.penalty_fee_bps,
            window_secs = settings.penalty_deadline_secs,
            "vault created"
        );
        Ok(Self {
            address: params.vault_address,
            pool: Pool::empty(),
            settings,
            penalties: PenaltyBook::new(),
            collaborators,
            events: Vec::new(),
        })
    }

    /// Rebuilds a vault from a snapshot. Settings are re-validated; the event
    /// journal starts empty.
    pub fn restore(snapshot: VaultSnapshot, collaborators: Collaborators) -> Result<Self, VaultError> {
        Self::check_identities(&snapshot.vault_address, &collaborators)?;
        snapshot.settings.validate()?;
        debug!(
            vault = %snapshot.vault_address,
            locked = snapshot.pool.total_locked_asset,
            shares = snapshot.pool.total_shares,
            "vault restored from snapshot"
        );
        Ok(Self {
            address: snapshot.vault_address,
            pool: snapshot.pool,
            settings: snapshot.settings,
            penalties: snapshot.penalties,
            collaborators,
            events: Vec::new(),
        })
    }

    fn check_identities(vault: &Address, collaborators: &Collaborators) -> Result<(), VaultError> {
        check_address(vault, ConfigField::VaultAddress)?;
        check_address(&collaborators.asset.address(), ConfigField::AssetLedger)?;
        check_address(&collaborators.shares.address(), ConfigField::ShareLedger)?;
        Ok(())
    }

    /// Copies the owned state.
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            vault_address: self.address,
            pool: self.pool,
            settings: self.settings.clone(),
            penalties: self.penalties.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Mutating operations
    // -----------------------------------------------------------------------

    /// Pulls `amount` of asset from `caller` and mints shares priced on the
    /// pre-deposit totals. Restarts the caller's penalty window.
    ///
    /// Requires an asset allowance from `caller` to the vault's custody
    /// account of at least `amount`. Returns the shares minted.
    pub fn deposit(&mut self, caller: &Address, amount: u128) -> Result<u128, VaultError> {
        if amount == 0 {
            return Err(VaultError::AmountZero);
        }
        if self.settings.deposit_paused {
            return Err(VaultError::DepositPaused);
        }

        let minted = self.pool.shares_for_deposit(amount)?;
        if minted == 0 {
            return Err(VaultError::DepositTooSmall { amount });
        }
        let next = self.pool.after_deposit(amount, minted)?;
        let deadline = self
            .now()
            .checked_add(self.settings.penalty_deadline_secs)
            .ok_or(MathError::Overflow)?;

        let prior_pool = std::mem::replace(&mut self.pool, next);
        let prior_deadline = self.penalties.arm(*caller, deadline);

        let asset = Arc::clone(&self.collaborators.asset);
        let shares = Arc::clone(&self.collaborators.shares);

        if let Err(e) = asset.transfer_from(&self.address, caller, &self.address, amount) {
            self.pool = prior_pool;
            self.penalties.restore(*caller, prior_deadline);
            return Err(e.into());
        }
        if let Err(e) = shares.mint(&self.address, caller, minted) {
            if let Err(refund) = asset.transfer(&self.address, caller, amount) {
                error!(%caller, amount, error = %refund, "deposit refund failed after mint error");
            }
            self.pool = prior_pool;
            self.penalties.restore(*caller, prior_deadline);
            return Err(e.into());
        }

        info!(%caller, amount, shares = minted, deadline, "deposit committed");
        self.events.push(VaultEvent::Deposit {
            account: *caller,
            asset_in: amount,
            shares_out: minted,
        });
        Ok(minted)
    }

    /// Burns `shares` from `caller` and pays out their asset value at the
    /// pre-burn rate, less the penalty fee inside the caller's window.
    pub fn withdraw(&mut self, caller: &Address, shares: u128) -> Result<Withdrawal, VaultError> {
        if shares == 0 {
            return Err(VaultError::AmountZero);
        }
        if self.settings.withdraw_paused {
            return Err(VaultError::WithdrawPaused);
        }

        let asset = Arc::clone(&self.collaborators.asset);
        let share_ledger = Arc::clone(&self.collaborators.shares);

        let held = share_ledger.balance_of(caller);
        if held < shares {
            return Err(VaultError::InsufficientShares {
                held,
                requested: shares,
            });
        }
        let asset_out = self.pool.amount_at_rate(shares)?;
        let custody = asset.balance_of(&self.address);
        if custody < asset_out {
            return Err(VaultError::InsufficientCustody {
                available: custody,
                required: asset_out,
            });
        }

        let next = self.pool.after_withdraw(shares, asset_out)?;
        let penalized =
            self.penalties
                .applies(caller, self.now(), self.settings.penalty_fee_paused);
        let fee = if penalized {
            penalty_fee(asset_out, self.settings.penalty_fee_bps)?
        } else {
            0
        };
        let net = asset_out - fee;
        let treasury = self.settings.treasury;

        let prior_pool = std::mem::replace(&mut self.pool, next);

        if let Err(e) = share_ledger.burn(&self.address, caller, shares) {
            self.pool = prior_pool;
            return Err(e.into());
        }
        // Net first: while it is unpaid the burn can still be reversed.
        if net > 0 {
            if let Err(e) = asset.transfer(&self.address, caller, net) {
                self.unburn(caller, shares, prior_pool);
                return Err(e.into());
            }
        }
        let mut fee_paid = fee > 0;
        if fee_paid {
            if let Err(e) = asset.transfer(&self.address, &treasury, fee) {
                // The caller is already paid. The fee stays in custody as
                // unaccounted surplus for `reset_rewards` to sweep.
                error!(%caller, fee, %treasury, error = %e, "penalty transfer failed, fee left in custody");
                fee_paid = false;
            }
        }

        info!(%caller, shares, asset_out, fee, net, "withdraw committed");
        self.events.push(VaultEvent::Withdraw {
            account: *caller,
            shares_in: shares,
            asset_out,
        });
        if fee_paid {
            self.events.push(VaultEvent::PenaltyCharged {
                account: *caller,
                fee,
                treasury,
            });
        }
        Ok(Withdrawal {
            shares_in: shares,
            asset_out,
            fee,
            net,
        })
    }

    fn unburn(&mut self, caller: &Address, shares: u128, prior_pool: Pool) {
        if let Err(e) = self.collaborators.shares.mint(&self.address, caller, shares) {
            error!(%caller, shares, error = %e, "failed to re-mint burned shares");
        }
        self.pool = prior_pool;
    }

    /// Pulls `amount` from the treasury into the pool without minting shares,
    /// raising the rate for every holder.
    pub fn reward(&mut self, caller: &Address, amount: u128) -> Result<(), VaultError> {
        if *caller != self.settings.treasury {
            return Err(VaultError::NotTreasury { caller: *caller });
        }
        if amount == 0 {
            return Err(VaultError::AmountZero);
        }

        let next = self.pool.after_reward(amount)?;
        let prior_pool = std::mem::replace(&mut self.pool, next);

        let asset = Arc::clone(&self.collaborators.asset);
        if let Err(e) = asset.transfer_from(&self.address, caller, &self.address, amount) {
            self.pool = prior_pool;
            return Err(e.into());
        }

        info!(treasury = %caller, amount, locked = self.pool.total_locked_asset, "reward committed");
        self.events.push(VaultEvent::RewardAdded {
            treasury: *caller,
            amount,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Asset per share scaled by `RATE_SCALE`; zero for an empty pool.
    pub fn rate(&self) -> Result<u128, VaultError> {
        Ok(self.pool.rate()?)
    }

    /// Asset value of `shares` at the current rate.
    pub fn amount_at_rate(&self, shares: u128) -> Result<u128, VaultError> {
        Ok(self.pool.amount_at_rate(shares)?)
    }

    /// Asset accounted to the pool. Ignores anything sent to custody outside
    /// deposit and reward.
    pub fn total_locked_asset(&self) -> u128 {
        self.pool.total_locked_asset
    }

    /// Outstanding shares.
    pub fn total_shares(&self) -> u128 {
        self.pool.total_shares
    }

    /// Pool totals.
    pub fn pool(&self) -> Pool {
        self.pool
    }

    /// Penalty deadline of `account`, or 0 if it never deposited.
    pub fn user_deadline_of(&self, account: &Address) -> u64 {
        self.penalties.deadline_of(account).unwrap_or(0)
    }

    /// `true` if `account` has no deadline or it has elapsed.
    pub fn has_user_deadline_passed(&self, account: &Address) -> bool {
        self.penalties.has_passed(account, self.now())
    }

    /// Early-withdrawal fee, bps.
    pub fn penalty_fee_bps(&self) -> u32 {
        self.settings.penalty_fee_bps
    }

    /// Penalty window, seconds.
    pub fn penalty_deadline_secs(&self) -> u64 {
        self.settings.penalty_deadline_secs
    }

    /// Treasury account.
    pub fn treasury(&self) -> Address {
        self.settings.treasury
    }

    /// Deposit pause switch.
    pub fn deposit_paused(&self) -> bool {
        self.settings.deposit_paused
    }

    /// Withdraw pause switch.
    pub fn withdraw_paused(&self) -> bool {
        self.settings.withdraw_paused
    }

    /// Penalty pause switch.
    pub fn penalty_fee_paused(&self) -> bool {
        self.settings.penalty_fee_paused
    }

    /// Current parameters.
    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    /// Address of the asset ledger.
    pub fn asset_address(&self) -> Address {
        self.collaborators.asset.address()
    }

    /// Address of the share ledger.
    pub fn share_address(&self) -> Address {
        self.collaborators.shares.address()
    }

    /// Custody account.
    pub fn vault_address(&self) -> Address {
        self.address
    }

    // -----------------------------------------------------------------------
    // Event journal
    // -----------------------------------------------------------------------

    /// Events not yet drained, oldest first.
    pub fn pending_events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Takes every journaled event, oldest first.
    pub fn drain_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: VaultEvent) {
        self.events.push(event);
    }

    pub(crate) fn now(&self) -> u64 {
        self.collaborators.clock.now()
    }
}
