#![no_std]

mod events;
mod rebase;
mod storage;

use events::*;
pub use storage::{Epoch, Position};
use storage::{DataKey, Storage};

use protocol_common::{mul_div_floor, AccessControl, Error, Role, SCALE};
use soroban_sdk::{
    contract, contractimpl, log, token, vec, Address, Env, IntoVal, Symbol, Val, Vec,
};

#[contract]
pub struct StakingLedger;

#[contractimpl]
impl StakingLedger {
    // ============================================
    // ROLES
    // ============================================

    /// Make `owner` admin and proxy admin of this ledger
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Roles already bootstrapped
    pub fn bootstrap(env: Env, owner: Address) -> Result<(), Error> {
        AccessControl::new(&env).bootstrap(&owner)
    }

    pub fn add_policy(env: Env, caller: Address, account: Address) -> Result<(), Error> {
        AccessControl::new(&env).grant(&caller, Role::Policy, &account)
    }

    pub fn remove_policy(env: Env, caller: Address, account: Address) -> Result<(), Error> {
        AccessControl::new(&env).revoke(&caller, Role::Policy, &account)
    }

    pub fn add_proxy_admin(env: Env, caller: Address, account: Address) -> Result<(), Error> {
        AccessControl::new(&env).grant(&caller, Role::ProxyAdmin, &account)
    }

    pub fn remove_proxy_admin(env: Env, caller: Address, account: Address) -> Result<(), Error> {
        AccessControl::new(&env).revoke(&caller, Role::ProxyAdmin, &account)
    }

    pub fn add_admin(env: Env, caller: Address, account: Address) -> Result<(), Error> {
        AccessControl::new(&env).grant(&caller, Role::Admin, &account)
    }

    pub fn remove_admin(env: Env, caller: Address, account: Address) -> Result<(), Error> {
        AccessControl::new(&env).revoke(&caller, Role::Admin, &account)
    }

    pub fn is_admin(env: Env, account: Address) -> bool {
        AccessControl::new(&env).is_admin(&account)
    }

    pub fn is_proxy_admin(env: Env, account: Address) -> bool {
        AccessControl::new(&env).is_proxy_admin(&account)
    }

    pub fn is_policy(env: Env, account: Address) -> bool {
        AccessControl::new(&env).is_policy(&account)
    }

    // ============================================
    // WIRING & PARAMETERS
    // ============================================

    /// Wire the protocol asset, the epoch schedule, the lock reference and
    /// the treasury. May be repeated, but the schedule never moves backwards.
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a proxy admin
    /// - `InvalidTimestamp`: Zero epoch length, or `end_time` or `number`
    ///   behind the stored epoch
    pub fn initialize(
        env: Env,
        caller: Address,
        asset: Address,
        epoch: Epoch,
        lock_ref: Address,
        treasury: Address,
    ) -> Result<(), Error> {
        AccessControl::new(&env).require_proxy_admin(&caller)?;

        if epoch.length == 0 {
            return Err(Error::InvalidTimestamp);
        }
        if let Some(current) = Storage::epoch(&env) {
            if epoch.end_time < current.end_time || epoch.number < current.number {
                return Err(Error::InvalidTimestamp);
            }
        }

        env.storage().instance().set(&DataKey::Asset, &asset);
        env.storage().instance().set(&DataKey::LockRef, &lock_ref);
        env.storage().instance().set(&DataKey::Treasury, &treasury);
        Storage::set_epoch(&env, &epoch);
        if !env.storage().instance().has(&DataKey::Index) {
            Storage::set_index(&env, SCALE);
        }

        env.events().publish(
            (Symbol::new(&env, "initialized"),),
            InitializedEvent {
                asset,
                treasury,
                epoch_length: epoch.length,
                first_end_time: epoch.end_time,
            },
        );

        Ok(())
    }

    /// Set the index growth applied per epoch (18 decimals)
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    /// - `InvalidAmount`: Rate < 0
    pub fn set_rebase_per_epoch(env: Env, caller: Address, rate: i128) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        if rate < 0 {
            return Err(Error::InvalidAmount);
        }

        Self::rebase_if_due(&env)?;
        env.storage().instance().set(&DataKey::RebasePerEpoch, &rate);

        env.events().publish(
            (Symbol::new(&env, "rebase_rate"),),
            ParameterChangedEvent {
                caller,
                value: rate,
            },
        );

        Ok(())
    }

    /// Overwrite the rebase index
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    /// - `InvalidAmount`: Index <= 0
    pub fn set_index(env: Env, caller: Address, index: i128) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        if index <= 0 {
            return Err(Error::InvalidAmount);
        }

        Self::rebase_if_due(&env)?;
        Storage::set_index(&env, index);

        env.events().publish(
            (Symbol::new(&env, "index"),),
            ParameterChangedEvent {
                caller,
                value: index,
            },
        );

        Ok(())
    }

    /// Lock applied when a position is opened without an explicit duration
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    pub fn set_basic_lock_period(env: Env, caller: Address, duration: u64) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        Self::rebase_if_due(&env)?;
        env.storage()
            .instance()
            .set(&DataKey::BasicLockPeriod, &duration);

        env.events().publish(
            (Symbol::new(&env, "basic_lock"),),
            ParameterChangedEvent {
                caller,
                value: duration as i128,
            },
        );

        Ok(())
    }

    /// Allow or revoke `bonder` opening positions on behalf of other owners
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    pub fn set_bonder(
        env: Env,
        caller: Address,
        bonder: Address,
        enabled: bool,
    ) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        let key = DataKey::Bonder(bonder.clone());
        if enabled {
            env.storage().instance().set(&key, &true);
        } else {
            env.storage().instance().remove(&key);
        }

        env.events().publish(
            (Symbol::new(&env, "bonder"), bonder),
            ParameterChangedEvent {
                caller,
                value: enabled as i128,
            },
        );

        Ok(())
    }

    // ============================================
    // REBASE
    // ============================================

    /// Settle every epoch that ended at or before now. Returns the number of
    /// epochs advanced; a second call in the same epoch returns 0.
    ///
    /// # Errors
    /// - `NotInitialized`: No epoch schedule
    pub fn rebase(env: Env) -> Result<u64, Error> {
        if Storage::epoch(&env).is_none() {
            return Err(Error::NotInitialized);
        }
        Self::rebase_if_due(&env)
    }

    // ============================================
    // POSITIONS
    // ============================================

    /// Open a position for `owner` whose asset is already held by the
    /// treasury. Only registered bonders may call this.
    ///
    /// # Errors
    /// - `Forbidden`: Caller is not a bonder
    /// - `InvalidAmount`: Amount <= 0
    /// - `NotInitialized`: Ledger not wired
    pub fn deposit(
        env: Env,
        caller: Address,
        owner: Address,
        amount: i128,
        lock_duration: u64,
    ) -> Result<u64, Error> {
        caller.require_auth();

        if !Self::is_bonder(env.clone(), caller) {
            return Err(Error::Forbidden);
        }

        Self::open_position(&env, &owner, amount, lock_duration)
    }

    /// Move `amount` of the asset from `owner` into the treasury and open a
    /// position for it
    ///
    /// # Errors
    /// - `InvalidAmount`: Amount <= 0
    /// - `NotInitialized`: Ledger not wired
    pub fn stake(env: Env, owner: Address, amount: i128, lock_duration: u64) -> Result<u64, Error> {
        owner.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let asset = Self::asset(env.clone())?;
        let treasury = Self::treasury(env.clone())?;
        token::Client::new(&env, &asset).transfer(&owner, &treasury, &amount);

        Self::open_position(&env, &owner, amount, lock_duration)
    }

    /// Redeem `shares` of position `id` at the current index
    ///
    /// # Errors
    /// - `NotFound`: Unknown position
    /// - `Unauthorized`: Caller does not own the position
    /// - `LockActive`: Lock has not ended
    /// - `InvalidAmount`: Shares <= 0
    /// - `InsufficientShares`: Shares exceed the position, or it is fully redeemed
    pub fn unstake(env: Env, owner: Address, id: u64, shares: i128) -> Result<i128, Error> {
        owner.require_auth();
        Self::rebase_if_due(&env)?;
        Self::redeem(&env, &owner, id, Some(shares))
    }

    /// Redeem every remaining share of position `id`
    pub fn unstake_id(env: Env, owner: Address, id: u64) -> Result<i128, Error> {
        owner.require_auth();
        Self::rebase_if_due(&env)?;
        Self::redeem(&env, &owner, id, None)
    }

    /// Redeem several positions in full. Any failure reverts the whole batch.
    pub fn multi_unstake(env: Env, owner: Address, ids: Vec<u64>) -> Result<i128, Error> {
        owner.require_auth();
        Self::rebase_if_due(&env)?;

        let mut total: i128 = 0;
        for id in ids.iter() {
            let out = Self::redeem(&env, &owner, id, None)?;
            total = total.checked_add(out).ok_or(Error::ArithmeticOverflow)?;
        }

        Ok(total)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    /// Asset value of position `id` at the current index
    ///
    /// # Errors
    /// - `NotFound`: Unknown position
    pub fn balance_of_id(env: Env, id: u64) -> Result<i128, Error> {
        let index = Self::index(env.clone())?;
        match Storage::position(&env, id) {
            Some(position) => mul_div_floor(&env, position.shares, index, SCALE),
            None => Err(Error::NotFound),
        }
    }

    pub fn balance_of(env: Env, owner: Address) -> Result<i128, Error> {
        let index = Self::index(env.clone())?;
        let mut total: i128 = 0;
        for id in Storage::owner_positions(&env, &owner).iter() {
            if let Some(position) = Storage::position(&env, id) {
                let value = mul_div_floor(&env, position.shares, index, SCALE)?;
                total = total.checked_add(value).ok_or(Error::ArithmeticOverflow)?;
            }
        }
        Ok(total)
    }

    /// Every position id ever opened for `owner`, closed ones included
    pub fn staking_of(env: Env, owner: Address) -> Vec<u64> {
        Storage::owner_positions(&env, &owner)
    }

    /// # Errors
    /// - `NotFound`: No position `id` owned by `owner`
    pub fn staking_balances(env: Env, owner: Address, id: u64) -> Result<Position, Error> {
        match Storage::position(&env, id) {
            Some(position) if position.owner == owner => Ok(position),
            _ => Err(Error::NotFound),
        }
    }

    pub fn position(env: Env, id: u64) -> Option<Position> {
        Storage::position(&env, id)
    }

    /// Epoch schedule as of now, including epochs not yet settled on chain
    pub fn epoch(env: Env) -> Result<Epoch, Error> {
        Self::projected(&env).map(|(epoch, _)| epoch)
    }

    /// Rebase index as of now, including epochs not yet settled on chain
    pub fn index(env: Env) -> Result<i128, Error> {
        match Storage::epoch(&env) {
            Some(_) => Self::projected(&env).map(|(_, index)| index),
            None => Ok(Storage::index(&env)),
        }
    }

    pub fn rebase_per_epoch(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::RebasePerEpoch)
            .unwrap_or(0)
    }

    pub fn basic_lock_period(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::BasicLockPeriod)
            .unwrap_or(0)
    }

    pub fn total_shares(env: Env) -> i128 {
        Storage::total_shares(&env)
    }

    pub fn is_bonder(env: Env, account: Address) -> bool {
        env.storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Bonder(account))
            .unwrap_or(false)
    }

    pub fn treasury(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Treasury)
            .ok_or(Error::NotInitialized)
    }

    pub fn asset(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Asset)
            .ok_or(Error::NotInitialized)
    }

    pub fn lock_ref(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::LockRef)
            .ok_or(Error::NotInitialized)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn projected(env: &Env) -> Result<(Epoch, i128), Error> {
        let epoch = Storage::epoch(env).ok_or(Error::NotInitialized)?;
        let index = Storage::index(env);
        let due = rebase::epochs_due(&epoch, env.ledger().timestamp());
        if due == 0 {
            return Ok((epoch, index));
        }
        rebase::advance(&epoch, index, Self::rebase_per_epoch(env.clone()), due)
    }

    fn rebase_if_due(env: &Env) -> Result<u64, Error> {
        let epoch = match Storage::epoch(env) {
            Some(epoch) => epoch,
            None => return Ok(0),
        };

        let due = rebase::epochs_due(&epoch, env.ledger().timestamp());
        if due == 0 {
            return Ok(0);
        }

        let (next, index) = rebase::advance(
            &epoch,
            Storage::index(env),
            Self::rebase_per_epoch(env.clone()),
            due,
        )?;
        Storage::set_epoch(env, &next);
        Storage::set_index(env, index);

        log!(env, "rebase", due, index);
        env.events().publish(
            (Symbol::new(env, "rebased"),),
            RebasedEvent {
                epochs: due,
                number: next.number,
                end_time: next.end_time,
                index,
            },
        );

        Ok(due)
    }

    fn open_position(
        env: &Env,
        owner: &Address,
        amount: i128,
        lock_duration: u64,
    ) -> Result<u64, Error> {
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if Storage::epoch(env).is_none() {
            return Err(Error::NotInitialized);
        }

        Self::rebase_if_due(env)?;

        let index = Storage::index(env);
        let shares = mul_div_floor(env, amount, SCALE, index)?;
        if shares == 0 {
            return Err(Error::InvalidAmount);
        }

        let now = env.ledger().timestamp();
        let lock = if lock_duration == 0 {
            Self::basic_lock_period(env.clone())
        } else {
            lock_duration
        };
        let lock_end = now.checked_add(lock).ok_or(Error::ArithmeticOverflow)?;

        let id = Storage::next_position_id(env);
        Storage::set_position(
            env,
            &Position {
                id,
                owner: owner.clone(),
                shares,
                deposited: amount,
                redeemed: 0,
                lock_end,
                created_at: now,
            },
        );
        Storage::push_owner_position(env, owner, id);

        let total = Storage::total_shares(env)
            .checked_add(shares)
            .ok_or(Error::ArithmeticOverflow)?;
        Storage::set_total_shares(env, total);

        env.events().publish(
            (Symbol::new(env, "staked"), owner.clone()),
            StakedEvent {
                id,
                owner: owner.clone(),
                amount,
                shares,
                lock_end,
            },
        );

        Ok(id)
    }

    /// `shares == None` redeems everything left in the position
    fn redeem(env: &Env, owner: &Address, id: u64, shares: Option<i128>) -> Result<i128, Error> {
        let mut position = Storage::position(env, id).ok_or(Error::NotFound)?;

        if position.owner != *owner {
            return Err(Error::Unauthorized);
        }
        if env.ledger().timestamp() < position.lock_end {
            return Err(Error::LockActive);
        }

        if position.shares == 0 {
            return Err(Error::InsufficientShares);
        }

        let shares = shares.unwrap_or(position.shares);
        if shares <= 0 {
            return Err(Error::InvalidAmount);
        }
        if shares > position.shares {
            return Err(Error::InsufficientShares);
        }

        let amount = mul_div_floor(env, shares, Storage::index(env), SCALE)?;

        position.shares -= shares;
        position.redeemed = position
            .redeemed
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        Storage::set_position(env, &position);
        Storage::set_total_shares(env, Storage::total_shares(env) - shares);

        if amount > 0 {
            Self::pay_out(env, owner, amount)?;
        }

        env.events().publish(
            (Symbol::new(env, "unstaked"), owner.clone()),
            UnstakedEvent {
                id,
                owner: owner.clone(),
                shares,
                amount,
            },
        );

        Ok(amount)
    }

    /// Pay `amount` from the treasury reserve, minting any shortfall left by
    /// index growth first
    fn pay_out(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
        let asset = Self::asset(env.clone())?;
        let treasury = Self::treasury(env.clone())?;
        let this = env.current_contract_address();
        let asset_client = token::Client::new(env, &asset);

        let reserve = asset_client.balance(&treasury);
        if reserve < amount {
            let shortfall = amount - reserve;
            log!(env, "unstake shortfall minted", shortfall);

            let args: Vec<Val> = vec![
                env,
                this.into_val(env),
                treasury.into_val(env),
                shortfall.into_val(env),
            ];
            env.invoke_contract::<()>(&treasury, &Symbol::new(env, "mint"), args);
        }

        asset_client.transfer_from(&this, &treasury, to, &amount);
        Ok(())
    }
}
