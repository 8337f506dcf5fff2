use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug)]
pub struct InitializedEvent {
    pub asset: Address,
    pub base_asset: Address,
    pub staking: Address,
    pub treasury: Address,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct MintRateChangedEvent {
    pub caller: Address,
    pub rate: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct TransferChangedEvent {
    pub index: u32,
    pub recipient: Address,
    pub percent: u32,
    pub total_percents: u32,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct MarketCreatedEvent {
    pub id: u32,
    pub is_eth: bool,
    pub quote_token: Address,
    pub capacity: i128,
    pub finish_time: u64,
    pub base_price: i128,
    pub asset_price: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct MarketClosedEvent {
    pub id: u32,
    pub unsold: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct DepositedEvent {
    pub id: u64,
    pub market_id: u32,
    pub depositor: Address,
    pub amount: i128,
    pub payout: i128,
    pub fees: i128,
    pub stake_id: u64,
}
