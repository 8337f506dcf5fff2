use protocol_common::SCALE;
use soroban_sdk::{contracttype, Address, Env, Vec};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Epoch {
    /// Seconds per epoch
    pub length: u64,
    /// Epochs elapsed since initialization
    pub number: u64,
    /// Timestamp at which the next rebase becomes due
    pub end_time: u64,
    /// Seconds per lock unit, informational for lock front-ends
    pub unit: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    /// Unique position ID, never reused
    pub id: u64,
    pub owner: Address,
    /// Remaining share units; zero once fully redeemed
    pub shares: i128,
    /// Asset amount booked at creation
    pub deposited: i128,
    /// Asset paid out so far
    pub redeemed: i128,
    /// No redemption before this timestamp
    pub lock_end: u64,
    pub created_at: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Asset,
    Treasury,
    LockRef,
    Epoch,
    Index,
    RebasePerEpoch,
    BasicLockPeriod,
    Bonder(Address),
    Position(u64),
    OwnerPositions(Address),
    PositionCounter,
    TotalShares,
}

pub struct Storage;

impl Storage {
    pub fn index(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::Index)
            .unwrap_or(SCALE)
    }

    pub fn set_index(env: &Env, index: i128) {
        env.storage().instance().set(&DataKey::Index, &index);
    }

    pub fn epoch(env: &Env) -> Option<Epoch> {
        env.storage().instance().get(&DataKey::Epoch)
    }

    pub fn set_epoch(env: &Env, epoch: &Epoch) {
        env.storage().instance().set(&DataKey::Epoch, epoch);
    }

    pub fn total_shares(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::TotalShares)
            .unwrap_or(0)
    }

    pub fn set_total_shares(env: &Env, shares: i128) {
        env.storage().instance().set(&DataKey::TotalShares, &shares);
    }

    // Positions

    pub fn next_position_id(env: &Env) -> u64 {
        let id = env
            .storage()
            .instance()
            .get::<DataKey, u64>(&DataKey::PositionCounter)
            .unwrap_or(0)
            + 1;
        env.storage()
            .instance()
            .set(&DataKey::PositionCounter, &id);
        id
    }

    pub fn position(env: &Env, id: u64) -> Option<Position> {
        env.storage().persistent().get(&DataKey::Position(id))
    }

    pub fn set_position(env: &Env, position: &Position) {
        env.storage()
            .persistent()
            .set(&DataKey::Position(position.id), position);
    }

    pub fn owner_positions(env: &Env, owner: &Address) -> Vec<u64> {
        env.storage()
            .persistent()
            .get(&DataKey::OwnerPositions(owner.clone()))
            .unwrap_or(Vec::new(env))
    }

    pub fn push_owner_position(env: &Env, owner: &Address, id: u64) {
        let mut ids = Self::owner_positions(env, owner);
        ids.push_back(id);
        env.storage()
            .persistent()
            .set(&DataKey::OwnerPositions(owner.clone()), &ids);
    }
}
