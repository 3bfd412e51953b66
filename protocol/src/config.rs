//! # Protocol Configuration & Constants
//!
//! Every magic number in the vault lives here. If you're hardcoding a
//! fixed-point scale or a basis-point denominator somewhere else, you're doing
//! it wrong.
//!
//! These values define how value is split between depositors, the pool, and
//! the treasury. Changing `RATE_SCALE` after launch silently reprices every
//! outstanding share, so don't.

use serde::{Deserialize, Serialize};

use crate::address::Address;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Full protocol version string, reported by the CLI and embedded in
/// simulator reports.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Fixed-Point Arithmetic
// ---------------------------------------------------------------------------

/// Scale of the exchange rate. A rate of `RATE_SCALE` means one share
/// redeems for exactly one unit of asset.
///
/// Every division against this scale truncates toward zero, which leaves the
/// rounding dust inside the pool instead of paying it out.
pub const RATE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Denominator for basis-point fees. 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u128 = 10_000;

// ---------------------------------------------------------------------------
// Penalty Parameters
// ---------------------------------------------------------------------------

/// Hard cap on the early-withdrawal fee: 1_000 bps = 10%.
pub const MAX_PENALTY_FEE_BPS: u32 = 1_000;

/// Default early-withdrawal fee: 60 bps = 0.6%.
pub const DEFAULT_PENALTY_FEE_BPS: u32 = 60;

/// Default penalty window after each deposit: 14 days.
pub const DEFAULT_PENALTY_DEADLINE_SECS: u64 = 14 * SECONDS_PER_DAY;

/// Seconds in a day. Used for defaults and by the simulator's clock steps.
pub const SECONDS_PER_DAY: u64 = 86_400;

// ---------------------------------------------------------------------------
// Vault Parameters
// ---------------------------------------------------------------------------

/// Construction parameters for a vault.
///
/// Deserialized from the simulator's scenario file, or built directly by
/// embedding applications. Validation happens at vault construction, not
/// here: a `VaultParams` can hold nonsense until somebody tries to use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultParams {
    /// Custody account that holds pooled asset and owns the share mint grant.
    pub vault_address: Address,
    /// Early-withdrawal fee in basis points. Must not exceed
    /// [`MAX_PENALTY_FEE_BPS`].
    pub penalty_fee_bps: u32,
    /// Length of the penalty window, in seconds, restarted by every deposit.
    pub penalty_deadline_secs: u64,
    /// Account allowed to inject rewards and receiving penalty fees.
    pub treasury: Address,
}

impl VaultParams {
    /// Parameters with the protocol defaults for fee and penalty window.
    pub fn with_defaults(vault_address: Address, treasury: Address) -> Self {
        Self {
            vault_address,
            penalty_fee_bps: DEFAULT_PENALTY_FEE_BPS,
            penalty_deadline_secs: DEFAULT_PENALTY_DEADLINE_SECS,
            treasury,
        }
    }
}
