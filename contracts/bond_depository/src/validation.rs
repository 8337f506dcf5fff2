use crate::storage::{FeeTransfer, MarketTerms};
use protocol_common::{mul_div_floor, Error, PERCENT_BASE};
use soroban_sdk::{Env, Vec};

/// Protocol asset bought by `amount` of the quote token
///
/// Formula: payout = floor(amount × base_price / asset_price)
///
/// Example:
/// - amount: 2 ETH (2e18)
/// - base_price: 1,000,000, asset_price: 1,000
/// - payout: 2e18 × 1,000 = 2,000e18
pub fn calculate_payout(
    env: &Env,
    amount: i128,
    base_price: i128,
    asset_price: i128,
) -> Result<i128, Error> {
    mul_div_floor(env, amount, base_price, asset_price)
}

/// Fee owed to one recipient
///
/// Formula: fee = floor(payout × percent / 100)
///
/// Example:
/// - payout: 2,000, percent: 5
/// - fee: 100
pub fn calculate_fee(payout: i128, percent: u32) -> Option<i128> {
    payout
        .checked_mul(percent as i128)?
        .checked_div(PERCENT_BASE)
}

/// Protocol asset the treasury mints for a deposit
///
/// Formula: mint = max(payout, amount × mint_rate)
pub fn calculate_mint(payout: i128, amount: i128, mint_rate: i128) -> Option<i128> {
    let by_rate = amount.checked_mul(mint_rate)?;
    Some(payout.max(by_rate))
}

pub fn sum_percents(transfers: &Vec<FeeTransfer>) -> u32 {
    transfers.iter().map(|t| t.percent).sum()
}

/// # Errors
/// - `InvalidAmount`: Capacity, prices or max payout not positive
/// - `InvalidTimestamp`: `finish_time` not in the future
pub fn check_terms(terms: &MarketTerms, now: u64) -> Result<(), Error> {
    if terms.capacity <= 0
        || terms.base_price <= 0
        || terms.asset_price <= 0
        || terms.max_payout <= 0
    {
        return Err(Error::InvalidAmount);
    }
    if terms.finish_time <= now {
        return Err(Error::InvalidTimestamp);
    }
    Ok(())
}
