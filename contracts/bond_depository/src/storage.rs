use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketTerms {
    /// Protocol asset still for sale
    pub capacity: i128,
    /// Last timestamp at which deposits are accepted
    pub finish_time: u64,
    /// Quote-side price
    pub base_price: i128,
    /// Protocol-asset-side price
    pub asset_price: i128,
    /// Largest payout a single deposit may receive
    pub max_payout: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Market {
    /// Unique market ID, starting at 0
    pub id: u32,
    /// Quote side is the configured base asset
    pub is_eth: bool,
    pub owner: Address,
    pub quote_token: Address,
    /// Price source pool, informational
    pub pool: Address,
    pub fee_tier: u32,
    pub capacity: i128,
    /// Protocol asset paid out so far
    pub sold: i128,
    pub finish_time: u64,
    pub base_price: i128,
    pub asset_price: i128,
    pub max_payout: i128,
    pub active: bool,
    pub created_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeTransfer {
    pub recipient: Address,
    /// Share of each payout, 0-100
    pub percent: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositRecord {
    pub id: u64,
    pub market_id: u32,
    pub depositor: Address,
    /// Quote token paid in
    pub amount: i128,
    /// Gross protocol asset bought
    pub payout: i128,
    /// Portion of the payout sent to fee recipients
    pub fees: i128,
    /// Staking position opened for the net payout, 0 when paid out directly
    pub stake_id: u64,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Asset,
    BaseAsset,
    Staking,
    Treasury,
    Calculator,
    MintRate,
    Transfers,
    Market(u32),
    MarketCount,
    Deposit(u64),
    DepositCount,
}
