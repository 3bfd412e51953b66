//! # Admin Gateway
//!
//! Role-gated mutators over the vault settings, plus the reward
//! reconciliation hatch.
//!
//! | Operation                 | Role   | Event                       |
//! |---------------------------|--------|-----------------------------|
//! | `set_penalty_fee`         | Admin  | `PenaltyFeeUpdated`         |
//! | `set_penalty_deadline`    | Admin  | `PenaltyDeadlineUpdated`    |
//! | `set_treasury_address`    | Admin  | `TreasuryAddressUpdated`    |
//! | `set_deposit_pause`       | Pauser | `DepositPaused`             |
//! | `set_withdraw_pause`      | Pauser | `WithdrawPaused`            |
//! | `set_penalty_pause`       | Pauser | `PenaltyPaused`             |
//! | `reset_rewards`           | Admin  | `RewardsReset`              |
//!
//! The role check always runs first, so an unauthorized caller learns
//! nothing about whether its value would have been accepted.

use std::sync::Arc;

use tracing::{info, warn};
use vault_protocol::{Address, Role};

use crate::error::{ConfigField, NotReadyReason, VaultError};
use crate::events::VaultEvent;
use crate::settings::check_address;
use crate::vault::Vault;

impl Vault {
    fn ensure_role(&self, caller: &Address, role: Role, operation: &str) -> Result<(), VaultError> {
        if self.collaborators.roles.has_role(caller, role) {
            return Ok(());
        }
        warn!(%caller, %role, operation, "privileged call rejected");
        Err(VaultError::Unauthorized {
            account: *caller,
            role,
        })
    }

    /// Sets the early-withdrawal fee. Admin only.
    pub fn set_penalty_fee(&mut self, caller: &Address, bps: u32) -> Result<(), VaultError> {
        self.ensure_role(caller, Role::Admin, "set_penalty_fee")?;
        let old = self.settings.set_penalty_fee(bps)?;
        info!(%caller, old, new = bps, "penalty fee updated");
        self.emit(VaultEvent::PenaltyFeeUpdated { old, new: bps });
        Ok(())
    }

    /// Sets the penalty window. Admin only. Deadlines already armed keep
    /// their old value until the depositor deposits again.
    pub fn set_penalty_deadline(&mut self, caller: &Address, secs: u64) -> Result<(), VaultError> {
        self.ensure_role(caller, Role::Admin, "set_penalty_deadline")?;
        let old = self.settings.set_penalty_deadline(secs)?;
        info!(%caller, old, new = secs, "penalty deadline updated");
        self.emit(VaultEvent::PenaltyDeadlineUpdated { old, new: secs });
        Ok(())
    }

    /// Moves the treasury role to `treasury`. Admin only.
    pub fn set_treasury_address(
        &mut self,
        caller: &Address,
        treasury: Address,
    ) -> Result<(), VaultError> {
        self.ensure_role(caller, Role::Admin, "set_treasury_address")?;
        let old = self.settings.set_treasury(treasury)?;
        info!(%caller, %old, new = %treasury, "treasury updated");
        self.emit(VaultEvent::TreasuryAddressUpdated { old, new: treasury });
        Ok(())
    }

    /// Toggles the deposit pause. Pauser only.
    pub fn set_deposit_pause(&mut self, caller: &Address, paused: bool) -> Result<(), VaultError> {
        self.ensure_role(caller, Role::Pauser, "set_deposit_pause")?;
        self.settings.set_deposit_paused(paused)?;
        info!(%caller, paused, "deposit pause toggled");
        self.emit(VaultEvent::DepositPaused { paused });
        Ok(())
    }

    /// Toggles the withdraw pause. Pauser only.
    pub fn set_withdraw_pause(&mut self, caller: &Address, paused: bool) -> Result<(), VaultError> {
        self.ensure_role(caller, Role::Pauser, "set_withdraw_pause")?;
        self.settings.set_withdraw_paused(paused)?;
        info!(%caller, paused, "withdraw pause toggled");
        self.emit(VaultEvent::WithdrawPaused { paused });
        Ok(())
    }

    /// Toggles the penalty pause. Pauser only.
    pub fn set_penalty_pause(&mut self, caller: &Address, paused: bool) -> Result<(), VaultError> {
        self.ensure_role(caller, Role::Pauser, "set_penalty_pause")?;
        self.settings.set_penalty_fee_paused(paused)?;
        info!(%caller, paused, "penalty pause toggled");
        self.emit(VaultEvent::PenaltyPaused { paused });
        Ok(())
    }

    /// Sweeps custody balance that the pool does not account for (direct
    /// transfers, unpaid payouts) to `sweep_to`. Admin only, and only while
    /// both deposits and withdrawals are paused. Pool totals are untouched.
    ///
    /// Returns the amount swept.
    pub fn reset_rewards(&mut self, caller: &Address, sweep_to: Address) -> Result<u128, VaultError> {
        self.ensure_role(caller, Role::Admin, "reset_rewards")?;
        if !self.settings.deposit_paused {
            return Err(VaultError::PenaltyActionNotReady(
                NotReadyReason::DepositNotPaused,
            ));
        }
        if !self.settings.withdraw_paused {
            return Err(VaultError::PenaltyActionNotReady(
                NotReadyReason::WithdrawNotPaused,
            ));
        }
        check_address(&sweep_to, ConfigField::SweepTarget)?;

        let asset = Arc::clone(&self.collaborators.asset);
        let vault = self.vault_address();
        let custody = asset.balance_of(&vault);
        let delta = custody.saturating_sub(self.total_locked_asset());
        if delta == 0 {
            return Err(VaultError::NoRewardDetected);
        }

        asset.transfer(&vault, &sweep_to, delta)?;
        info!(%caller, to = %sweep_to, amount = delta, "unaccounted balance swept");
        self.emit(VaultEvent::RewardsReset {
            to: sweep_to,
            amount: delta,
        });
        Ok(delta)
    }
}
