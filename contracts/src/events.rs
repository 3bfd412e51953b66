//! # Vault Events
//!
//! Every committed state change appends one or more [`VaultEvent`]s to the
//! vault's journal, in the order they happened. Failed operations append
//! nothing. Owners drain the journal with
//! [`Vault::drain_events`](crate::vault::Vault::drain_events).

use serde::{Deserialize, Serialize};
use vault_protocol::Address;

/// A record of a committed vault state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VaultEvent {
    /// Asset deposited, shares minted.
    Deposit {
        /// Depositor.
        account: Address,
        /// Asset pulled into custody.
        asset_in: u128,
        /// Shares minted to the depositor.
        shares_out: u128,
    },

    /// Shares burned, asset paid out. `asset_out` is the gross amount before
    /// any penalty fee.
    Withdraw {
        /// Redeemer.
        account: Address,
        /// Shares burned.
        shares_in: u128,
        /// Gross asset value of the burned shares.
        asset_out: u128,
    },

    /// An early-withdrawal fee was routed to the treasury.
    PenaltyCharged {
        /// Redeemer who paid the fee.
        account: Address,
        /// Fee amount.
        fee: u128,
        /// Treasury that received it.
        treasury: Address,
    },

    /// The treasury injected a reward into the pool.
    RewardAdded {
        /// Treasury account.
        treasury: Address,
        /// Asset added without minting shares.
        amount: u128,
    },

    /// Unaccounted custody balance was swept out.
    RewardsReset {
        /// Recipient of the sweep.
        to: Address,
        /// Amount swept.
        amount: u128,
    },

    /// Early-withdrawal fee changed.
    PenaltyFeeUpdated {
        /// Previous fee, bps.
        old: u32,
        /// New fee, bps.
        new: u32,
    },

    /// Penalty window changed.
    PenaltyDeadlineUpdated {
        /// Previous window, seconds.
        old: u64,
        /// New window, seconds.
        new: u64,
    },

    /// Treasury account changed.
    TreasuryAddressUpdated {
        /// Previous treasury.
        old: Address,
        /// New treasury.
        new: Address,
    },

    /// Deposit pause toggled.
    DepositPaused {
        /// New state.
        paused: bool,
    },

    /// Withdraw pause toggled.
    WithdrawPaused {
        /// New state.
        paused: bool,
    },

    /// Penalty pause toggled.
    PenaltyPaused {
        /// New state.
        paused: bool,
    },
}

impl VaultEvent {
    /// Snake-case event name, matching the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::Deposit { .. } => "deposit",
            VaultEvent::Withdraw { .. } => "withdraw",
            VaultEvent::PenaltyCharged { .. } => "penalty_charged",
            VaultEvent::RewardAdded { .. } => "reward_added",
            VaultEvent::RewardsReset { .. } => "rewards_reset",
            VaultEvent::PenaltyFeeUpdated { .. } => "penalty_fee_updated",
            VaultEvent::PenaltyDeadlineUpdated { .. } => "penalty_deadline_updated",
            VaultEvent::TreasuryAddressUpdated { .. } => "treasury_address_updated",
            VaultEvent::DepositPaused { .. } => "deposit_paused",
            VaultEvent::WithdrawPaused { .. } => "withdraw_paused",
            VaultEvent::PenaltyPaused { .. } => "penalty_paused",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_tag_matches_name() {
        let events = vec![
            VaultEvent::Deposit {
                account: Address::from_label("alice"),
                asset_in: 10,
                shares_out: 10,
            },
            VaultEvent::PenaltyPaused { paused: true },
            VaultEvent::TreasuryAddressUpdated {
                old: Address::from_label("a"),
                new: Address::from_label("b"),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }
}
