//! # Vault Settings
//!
//! Mutable parameters: penalty fee, penalty window, treasury, and the three
//! pause switches. The setters here only validate and swap values; role checks
//! and event emission live in [`crate::admin`].
//!
//! Each setter rejects a value equal to the current one. A "successful" call
//! that changes nothing would emit a misleading event.

use serde::{Deserialize, Serialize};
use vault_protocol::config::{VaultParams, MAX_PENALTY_FEE_BPS};
use vault_protocol::Address;

use crate::error::{ConfigError, ConfigField};

/// Current vault parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSettings {
    /// Early-withdrawal fee, bps, at most [`MAX_PENALTY_FEE_BPS`].
    pub penalty_fee_bps: u32,
    /// Penalty window restarted by each deposit, seconds.
    pub penalty_deadline_secs: u64,
    /// Reward source and fee recipient.
    pub treasury: Address,
    /// Rejects deposits while set.
    pub deposit_paused: bool,
    /// Rejects withdrawals while set.
    pub withdraw_paused: bool,
    /// Waives the early-withdrawal fee while set.
    pub penalty_fee_paused: bool,
}

impl VaultSettings {
    /// Builds validated settings from construction parameters. All pause
    /// switches start off.
    pub fn from_params(params: &VaultParams) -> Result<Self, ConfigError> {
        let settings = Self {
            penalty_fee_bps: params.penalty_fee_bps,
            penalty_deadline_secs: params.penalty_deadline_secs,
            treasury: params.treasury,
            deposit_paused: false,
            withdraw_paused: false,
            penalty_fee_paused: false,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Checks invariants that must hold for any live settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fee(self.penalty_fee_bps)?;
        check_address(&self.treasury, ConfigField::Treasury)
    }

    /// Sets the fee, returning the previous one.
    pub fn set_penalty_fee(&mut self, bps: u32) -> Result<u32, ConfigError> {
        check_fee(bps)?;
        replace_distinct(&mut self.penalty_fee_bps, bps, ConfigField::PenaltyFee)
    }

    /// Sets the penalty window, returning the previous one.
    pub fn set_penalty_deadline(&mut self, secs: u64) -> Result<u64, ConfigError> {
        replace_distinct(
            &mut self.penalty_deadline_secs,
            secs,
            ConfigField::PenaltyDeadline,
        )
    }

    /// Sets the treasury, returning the previous one.
    pub fn set_treasury(&mut self, treasury: Address) -> Result<Address, ConfigError> {
        check_address(&treasury, ConfigField::Treasury)?;
        replace_distinct(&mut self.treasury, treasury, ConfigField::Treasury)
    }

    /// Toggles the deposit pause.
    pub fn set_deposit_paused(&mut self, paused: bool) -> Result<(), ConfigError> {
        replace_distinct(&mut self.deposit_paused, paused, ConfigField::DepositPause).map(drop)
    }

    /// Toggles the withdraw pause.
    pub fn set_withdraw_paused(&mut self, paused: bool) -> Result<(), ConfigError> {
        replace_distinct(&mut self.withdraw_paused, paused, ConfigField::WithdrawPause).map(drop)
    }

    /// Toggles the penalty pause.
    pub fn set_penalty_fee_paused(&mut self, paused: bool) -> Result<(), ConfigError> {
        replace_distinct(
            &mut self.penalty_fee_paused,
            paused,
            ConfigField::PenaltyPause,
        )
        .map(drop)
    }
}

pub(crate) fn check_fee(bps: u32) -> Result<(), ConfigError> {
    if bps > MAX_PENALTY_FEE_BPS {
        return Err(ConfigError::FeeAboveCap {
            requested: bps,
            cap: MAX_PENALTY_FEE_BPS,
        });
    }
    Ok(())
}

pub(crate) fn check_address(address: &Address, field: ConfigField) -> Result<(), ConfigError> {
    if address.is_zero() {
        return Err(ConfigError::ZeroAddress { field });
    }
    Ok(())
}

fn replace_distinct<T: PartialEq>(
    slot: &mut T,
    value: T,
    field: ConfigField,
) -> Result<T, ConfigError> {
    if *slot == value {
        return Err(ConfigError::NoOp { field });
    }
    Ok(std::mem::replace(slot, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> VaultSettings {
        let params = VaultParams::with_defaults(
            Address::from_label("vault"),
            Address::from_label("treasury"),
        );
        VaultSettings::from_params(&params).unwrap()
    }

    #[test]
    fn construction_rejects_fee_above_cap() {
        let mut params = VaultParams::with_defaults(
            Address::from_label("vault"),
            Address::from_label("treasury"),
        );
        params.penalty_fee_bps = MAX_PENALTY_FEE_BPS + 1;
        assert_eq!(
            VaultSettings::from_params(&params),
            Err(ConfigError::FeeAboveCap {
                requested: 1_001,
                cap: 1_000
            })
        );
    }

    #[test]
    fn construction_rejects_zero_treasury() {
        let params = VaultParams::with_defaults(Address::from_label("vault"), Address::ZERO);
        assert_eq!(
            VaultSettings::from_params(&params),
            Err(ConfigError::ZeroAddress {
                field: ConfigField::Treasury
            })
        );
    }

    #[test]
    fn pauses_start_off() {
        let s = settings();
        assert!(!s.deposit_paused);
        assert!(!s.withdraw_paused);
        assert!(!s.penalty_fee_paused);
    }

    #[test]
    fn fee_setter_returns_previous_and_rejects_noop() {
        let mut s = settings();
        assert_eq!(s.set_penalty_fee(100), Ok(60));
        assert_eq!(
            s.set_penalty_fee(100),
            Err(ConfigError::NoOp {
                field: ConfigField::PenaltyFee
            })
        );
        assert!(matches!(
            s.set_penalty_fee(1_001),
            Err(ConfigError::FeeAboveCap { .. })
        ));
        assert_eq!(s.set_penalty_fee(1_000), Ok(100));
        assert_eq!(s.set_penalty_fee(0), Ok(1_000));
    }

    #[test]
    fn treasury_setter_validates() {
        let mut s = settings();
        let old = s.treasury;
        assert!(matches!(
            s.set_treasury(Address::ZERO),
            Err(ConfigError::ZeroAddress { .. })
        ));
        assert!(matches!(
            s.set_treasury(old),
            Err(ConfigError::NoOp { .. })
        ));
        let new = Address::from_label("new-treasury");
        assert_eq!(s.set_treasury(new), Ok(old));
        assert_eq!(s.treasury, new);
    }

    #[test]
    fn pause_setters_reject_same_state() {
        let mut s = settings();
        assert!(s.set_deposit_paused(true).is_ok());
        assert!(s.set_deposit_paused(true).is_err());
        assert!(s.set_withdraw_paused(false).is_err());
        assert!(s.set_penalty_fee_paused(true).is_ok());
        assert!(s.penalty_fee_paused);
    }
}
