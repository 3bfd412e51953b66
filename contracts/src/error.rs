//! # Vault Errors
//!
//! Every failure is synchronous and aborts the operation that raised it with
//! no net change to vault state. Nothing is retried internally; the caller
//! decides what to do with a corrected input.

use std::fmt;

use thiserror::Error;
use vault_protocol::{Address, MathError, RateError, Role, TokenError};

/// Which setting a configuration error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    /// Early-withdrawal fee.
    PenaltyFee,
    /// Penalty window length.
    PenaltyDeadline,
    /// Treasury account.
    Treasury,
    /// Deposit pause switch.
    DepositPause,
    /// Withdraw pause switch.
    WithdrawPause,
    /// Penalty pause switch.
    PenaltyPause,
    /// Vault custody account.
    VaultAddress,
    /// Asset ledger identity.
    AssetLedger,
    /// Share ledger identity.
    ShareLedger,
    /// Destination of a reward sweep.
    SweepTarget,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigField::PenaltyFee => "penalty fee",
            ConfigField::PenaltyDeadline => "penalty deadline",
            ConfigField::Treasury => "treasury address",
            ConfigField::DepositPause => "deposit pause",
            ConfigField::WithdrawPause => "withdraw pause",
            ConfigField::PenaltyPause => "penalty pause",
            ConfigField::VaultAddress => "vault address",
            ConfigField::AssetLedger => "asset ledger address",
            ConfigField::ShareLedger => "share ledger address",
            ConfigField::SweepTarget => "sweep target",
        };
        f.write_str(name)
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The new value equals the current one.
    #[error("{field} unchanged")]
    NoOp {
        /// Setting that would not change.
        field: ConfigField,
    },

    /// A required address was zero.
    #[error("{field} is the zero address")]
    ZeroAddress {
        /// Setting that received the zero address.
        field: ConfigField,
    },

    /// The penalty fee exceeds the protocol cap.
    #[error("penalty fee {requested} bps above {cap} bps cap")]
    FeeAboveCap {
        /// Requested fee.
        requested: u32,
        /// Maximum allowed fee.
        cap: u32,
    },
}

/// Why reward reconciliation refused to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReadyReason {
    /// Deposits are still open.
    DepositNotPaused,
    /// Withdrawals are still open.
    WithdrawNotPaused,
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotReadyReason::DepositNotPaused => write!(f, "deposit not paused"),
            NotReadyReason::WithdrawNotPaused => write!(f, "withdraw not paused"),
        }
    }
}

/// Errors returned by vault operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// Zero-amount deposits, withdrawals, rewards and conversions are rejected.
    #[error("amount zero")]
    AmountZero,

    /// The deposit is too small to mint a single share at the current rate.
    #[error("deposit of {amount} mints no shares")]
    DepositTooSmall {
        /// Rejected deposit amount.
        amount: u128,
    },

    /// Deposits are paused.
    #[error("deposit paused")]
    DepositPaused,

    /// Withdrawals are paused.
    #[error("withdraw paused")]
    WithdrawPaused,

    /// Reward reconciliation preconditions are not met.
    #[error("penalty action not ready: {0}")]
    PenaltyActionNotReady(NotReadyReason),

    /// Custody holds nothing beyond the accounted pool.
    #[error("no reward detected on vault")]
    NoRewardDetected,

    /// Only the treasury may inject rewards.
    #[error("{caller} is not the treasury")]
    NotTreasury {
        /// The rejected caller.
        caller: Address,
    },

    /// The caller lacks the role the operation requires.
    #[error("account {account} is missing role {role}")]
    Unauthorized {
        /// The rejected caller.
        account: Address,
        /// Role that was required.
        role: Role,
    },

    /// A configuration value was rejected.
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The caller holds fewer shares than it tried to redeem.
    #[error("insufficient shares: holds {held}, requested {requested}")]
    InsufficientShares {
        /// Shares held by the caller.
        held: u128,
        /// Shares the caller tried to redeem.
        requested: u128,
    },

    /// Custody cannot cover a payout. Means the ledger and the pool disagree.
    #[error("insufficient custody balance: {available} available, {required} required")]
    InsufficientCustody {
        /// Asset held by the custody account.
        available: u128,
        /// Asset required for the payout.
        required: u128,
    },

    /// A call re-entered the vault while another operation was in flight.
    #[error("reentrant call rejected")]
    Reentrancy,

    /// An external ledger refused a transfer, mint or burn.
    #[error("ledger error: {0}")]
    Token(#[from] TokenError),

    /// Fixed-point arithmetic failed.
    #[error("math error: {0}")]
    Math(#[from] MathError),
}

impl VaultError {
    /// Stable snake_case identifier, used as a metrics label and in reports.
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::AmountZero => "amount_zero",
            VaultError::DepositTooSmall { .. } => "deposit_too_small",
            VaultError::DepositPaused => "deposit_paused",
            VaultError::WithdrawPaused => "withdraw_paused",
            VaultError::PenaltyActionNotReady(_) => "penalty_action_not_ready",
            VaultError::NoRewardDetected => "no_reward_detected",
            VaultError::NotTreasury { .. } => "not_treasury",
            VaultError::Unauthorized { .. } => "unauthorized",
            VaultError::InvalidConfig(_) => "invalid_config",
            VaultError::InsufficientShares { .. } => "insufficient_shares",
            VaultError::InsufficientCustody { .. } => "insufficient_custody",
            VaultError::Reentrancy => "reentrancy",
            VaultError::Token(_) => "token",
            VaultError::Math(_) => "math",
        }
    }
}

impl From<RateError> for VaultError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::AmountZero => VaultError::AmountZero,
            RateError::Math(e) => VaultError::Math(e),
        }
    }
}
