//! # Wide Fixed-Point Arithmetic
//!
//! Amounts are `u128` in the asset's smallest unit, and the exchange rate is
//! scaled by [`RATE_SCALE`](crate::config::RATE_SCALE) = 1e18. Multiplying a
//! large balance by 1e18 overflows `u128` long before balances get
//! interesting, so every `a * b / c` goes through a 256-bit intermediate.
//!
//! Division always truncates toward zero. Callers rely on that to keep
//! rounding dust in the pool.

use primitive_types::U256;
use thiserror::Error;

/// Errors from fixed-point arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    /// Division by zero. Always a caller bug or a corrupted pool.
    #[error("division by zero")]
    DivisionByZero,

    /// The result does not fit in `u128`.
    #[error("arithmetic overflow")]
    Overflow,

    /// A subtraction would go below zero.
    #[error("arithmetic underflow")]
    Underflow,
}

/// Computes `floor(a * b / denominator)` without intermediate overflow.
///
/// # Errors
///
/// [`MathError::DivisionByZero`] if `denominator == 0`,
/// [`MathError::Overflow`] if the quotient exceeds `u128::MAX`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    // u128 * u128 always fits in 256 bits.
    let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
    if quotient > U256::from(u128::MAX) {
        return Err(MathError::Overflow);
    }
    Ok(quotient.as_u128())
}

/// `a + b`, or [`MathError::Overflow`].
pub fn checked_add(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

/// `a - b`, or [`MathError::Underflow`].
pub fn checked_sub(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}
