use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug)]
pub struct InitializedEvent {
    pub asset: Address,
    pub treasury: Address,
    pub epoch_length: u64,
    pub first_end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RebasedEvent {
    pub epochs: u64,
    pub number: u64,
    pub end_time: u64,
    pub index: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ParameterChangedEvent {
    pub caller: Address,
    pub value: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct StakedEvent {
    pub id: u64,
    pub owner: Address,
    pub amount: i128,
    pub shares: i128,
    pub lock_end: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct UnstakedEvent {
    pub id: u64,
    pub owner: Address,
    pub shares: i128,
    pub amount: i128,
}
