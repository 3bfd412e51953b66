//! # Rate Engine
//!
//! Pure conversion between asset amounts and share amounts given the current
//! pool totals. No side effects, no clock, no ledgers -- just integer math.
//!
//! ```text
//! rate            = total_locked_asset * SCALE / total_shares     (0 when empty)
//! amount_at_rate  = shares * rate / SCALE
//! shares_minted   = amount * total_shares / total_locked_asset    (1:1 when empty)
//! penalty_fee     = amount * fee_bps / 10_000
//! ```
//!
//! Every division truncates toward zero. The rounding always lands in the
//! pool's favour: a depositor never receives a fractional share too many and
//! a redeemer never receives a fractional asset unit too many. Note that
//! `amount_at_rate` divides twice (once inside `rate`, once by `SCALE`); that
//! double truncation is part of the contract and must not be "optimized" into
//! a single `shares * locked / total_shares`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{BPS_DENOMINATOR, RATE_SCALE};
use crate::math::{self, MathError};

/// Errors from rate conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateError {
    /// Conversions of a zero amount are rejected outright.
    #[error("amount is zero")]
    AmountZero,

    /// Arithmetic failure (overflow, underflow, division by zero).
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Pool totals: everything the rate engine needs to price a share.
///
/// `total_locked_asset` is an internal counter, not the custody account's
/// observable balance. Asset that arrives outside deposit/reward (a direct
/// transfer, a "donation") is invisible here, which is what keeps the rate
/// immune to donation attacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Asset accounted to the pool, in smallest units.
    pub total_locked_asset: u128,
    /// Outstanding shares.
    pub total_shares: u128,
}

impl Pool {
    /// An empty pool.
    pub const fn empty() -> Self {
        Self {
            total_locked_asset: 0,
            total_shares: 0,
        }
    }

    /// `true` when no shares are outstanding, regardless of locked asset.
    pub fn is_empty(&self) -> bool {
        self.total_shares == 0
    }

    /// Asset units per share, scaled by [`RATE_SCALE`]. Zero for an empty pool.
    pub fn rate(&self) -> Result<u128, MathError> {
        if self.is_empty() {
            return Ok(0);
        }
        let rate = math::mul_div(self.total_locked_asset, RATE_SCALE, self.total_shares)?;
        debug!(
            locked = self.total_locked_asset,
            shares = self.total_shares,
            rate,
            "rate computed"
        );
        Ok(rate)
    }

    /// Asset value of `shares` at the current rate.
    ///
    /// # Errors
    ///
    /// [`RateError::AmountZero`] for a zero amount.
    pub fn amount_at_rate(&self, shares: u128) -> Result<u128, RateError> {
        if shares == 0 {
            return Err(RateError::AmountZero);
        }
        let rate = self.rate()?;
        Ok(math::mul_div(shares, rate, RATE_SCALE)?)
    }

    /// Shares to mint for a deposit of `amount`, priced on these (pre-deposit)
    /// totals. The first deposit into an empty pool seeds the rate at 1:1.
    ///
    /// # Errors
    ///
    /// [`RateError::AmountZero`] for a zero amount. A pool with shares but no
    /// locked asset cannot price a deposit and yields
    /// [`MathError::DivisionByZero`].
    pub fn shares_for_deposit(&self, amount: u128) -> Result<u128, RateError> {
        if amount == 0 {
            return Err(RateError::AmountZero);
        }
        if self.is_empty() {
            return Ok(amount);
        }
        Ok(math::mul_div(
            amount,
            self.total_shares,
            self.total_locked_asset,
        )?)
    }

    /// Totals after a deposit of `amount` minting `shares`.
    pub fn after_deposit(&self, amount: u128, shares: u128) -> Result<Pool, MathError> {
        Ok(Pool {
            total_locked_asset: math::checked_add(self.total_locked_asset, amount)?,
            total_shares: math::checked_add(self.total_shares, shares)?,
        })
    }

    /// Totals after burning `shares` and paying out `asset_out`.
    pub fn after_withdraw(&self, shares: u128, asset_out: u128) -> Result<Pool, MathError> {
        Ok(Pool {
            total_locked_asset: math::checked_sub(self.total_locked_asset, asset_out)?,
            total_shares: math::checked_sub(self.total_shares, shares)?,
        })
    }

    /// Totals after a reward of `amount`. Shares are untouched.
    pub fn after_reward(&self, amount: u128) -> Result<Pool, MathError> {
        Ok(Pool {
            total_locked_asset: math::checked_add(self.total_locked_asset, amount)?,
            total_shares: self.total_shares,
        })
    }
}

/// Basis-point fee on `amount`, truncated toward zero.
pub fn penalty_fee(amount: u128, fee_bps: u32) -> Result<u128, MathError> {
    math::mul_div(amount, fee_bps as u128, BPS_DENOMINATOR)
}
