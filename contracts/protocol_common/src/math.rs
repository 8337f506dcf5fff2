//! Fixed-point helpers.
//!
//! Amounts and the rebase index use 18 decimals. Products of two such values do
//! not fit in `i128`, so the slow path widens to the host's `I256`.

use soroban_sdk::{Env, I256};

use crate::error::Error;

/// 1.0 in 18-decimal fixed point.
pub const SCALE: i128 = 1_000_000_000_000_000_000;

/// Denominator of fee-split percentages.
pub const PERCENT_BASE: i128 = 100;

/// `floor(a * b / denominator)` for non-negative operands.
///
/// # Errors
/// - `InvalidAmount`: Negative operand or non-positive denominator
/// - `ArithmeticOverflow`: Quotient does not fit in `i128`
pub fn mul_div_floor(env: &Env, a: i128, b: i128, denominator: i128) -> Result<i128, Error> {
    if a < 0 || b < 0 || denominator <= 0 {
        return Err(Error::InvalidAmount);
    }

    if let Some(product) = a.checked_mul(b) {
        return Ok(product / denominator);
    }

    I256::from_i128(env, a)
        .mul(&I256::from_i128(env, b))
        .div(&I256::from_i128(env, denominator))
        .to_i128()
        .ok_or(Error::ArithmeticOverflow)
}
