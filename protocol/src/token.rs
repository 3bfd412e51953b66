//! # Ledger Contracts
//!
//! The vault never owns token balances. It talks to two external ledgers
//! through the traits below:
//!
//! - an [`AssetLedger`] for the underlying fungible asset (pull with
//!   allowance, push from custody, balance queries);
//! - a [`ShareLedger`] for the claim token, whose mint/burn capability is
//!   granted solely to the vault's custody account.
//!
//! Both traits take `&self`: ledgers are shared between the vault, the
//! depositors, and the test harness, so implementations use interior
//! mutability. Any ledger call may call back into arbitrary code (think
//! transfer hooks), which is why the vault commits its own state before
//! calling out.

use thiserror::Error;

use crate::address::Address;

/// Errors reported by a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The source account cannot cover the transfer or burn.
    #[error("insufficient balance: {account} has {available}, needs {required}")]
    InsufficientBalance {
        /// Account being debited.
        account: Address,
        /// Its current balance.
        available: u128,
        /// Amount requested.
        required: u128,
    },

    /// The spender has not been approved for enough of the owner's balance.
    #[error("insufficient allowance: {spender} may spend {allowed} of {owner}, needs {required}")]
    InsufficientAllowance {
        /// Owner of the funds.
        owner: Address,
        /// Account attempting to spend.
        spender: Address,
        /// Remaining allowance.
        allowed: u128,
        /// Amount requested.
        required: u128,
    },

    /// The caller does not hold the mint/burn grant.
    #[error("{0} is not an authorized minter")]
    NotMinter(Address),

    /// Transfers to or from the zero address are not allowed.
    #[error("zero address used as transfer endpoint")]
    ZeroAddress,

    /// A balance or supply would overflow `u128`.
    #[error("supply overflow")]
    Overflow,

    /// The ledger refused the operation for its own reasons (hooks, freezes).
    #[error("ledger rejected operation: {0}")]
    Rejected(String),
}

/// The underlying asset: anything with ERC-20-style transfer semantics.
pub trait AssetLedger: Send + Sync {
    /// Identity of the ledger itself. Must be non-zero.
    fn address(&self) -> Address;

    /// Current balance of `account`.
    fn balance_of(&self, account: &Address) -> u128;

    /// Moves `amount` from `from` to `to`, authorized by `from` itself.
    ///
    /// When `from` holds at least `amount` this must succeed; the vault
    /// relies on that after its own balance preflight.
    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError>;

    /// Moves `amount` from `owner` to `to` on behalf of `spender`,
    /// consuming `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError>;
}

/// The share (claim) token: a ledger with a restricted mint/burn capability.
pub trait ShareLedger: Send + Sync {
    /// Identity of the ledger itself. Must be non-zero.
    fn address(&self) -> Address;

    /// Share balance of `account`.
    fn balance_of(&self, account: &Address) -> u128;

    /// Total shares in existence on this ledger.
    fn total_supply(&self) -> u128;

    /// Mints `amount` shares to `to`. Only a granted `minter` may call.
    fn mint(&self, minter: &Address, to: &Address, amount: u128) -> Result<(), TokenError>;

    /// Burns `amount` shares held by `from`. Only a granted `minter` may call.
    fn burn(&self, minter: &Address, from: &Address, amount: u128) -> Result<(), TokenError>;
}
