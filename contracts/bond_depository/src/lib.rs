#![no_std]

mod events;
mod storage;
mod validation;

use events::*;
pub use storage::{DepositRecord, FeeTransfer, Market, MarketTerms};
use storage::DataKey;
use validation::{calculate_fee, calculate_mint, calculate_payout, check_terms, sum_percents};

use protocol_common::{AccessControl, Error, Role, PERCENT_BASE};
use soroban_sdk::{
    contract, contractimpl, log, token, vec, Address, Env, IntoVal, Symbol, Val, Vec,
};

#[contract]
pub struct BondDepository;

#[contractimpl]
impl BondDepository {
    // ============================================
    // ROLES
    // ============================================

    /// Make `owner` admin and proxy admin of this depository
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

    /// Wire the protocol asset, the base (ETH-market) quote asset, the staking
    /// ledger, the treasury and the calculator. May be repeated.
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a proxy admin
    pub fn initialize(
        env: Env,
        caller: Address,
        asset: Address,
        base_asset: Address,
        staking: Address,
        treasury: Address,
        calculator: Address,
    ) -> Result<(), Error> {
        AccessControl::new(&env).require_proxy_admin(&caller)?;

        env.storage().instance().set(&DataKey::Asset, &asset);
        env.storage().instance().set(&DataKey::BaseAsset, &base_asset);
        env.storage().instance().set(&DataKey::Staking, &staking);
        env.storage().instance().set(&DataKey::Treasury, &treasury);
        env.storage().instance().set(&DataKey::Calculator, &calculator);

        env.events().publish(
            (Symbol::new(&env, "initialized"),),
            InitializedEvent {
                asset,
                base_asset,
                staking,
                treasury,
            },
        );

        Ok(())
    }

    /// Protocol asset minted per quote unit; the treasury mints at least the
    /// payout whatever the rate
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    /// - `InvalidAmount`: Rate < 0
    pub fn set_mint_rate(env: Env, caller: Address, rate: i128) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        if rate < 0 {
            return Err(Error::InvalidAmount);
        }

        env.storage().instance().set(&DataKey::MintRate, &rate);

        env.events().publish(
            (Symbol::new(&env, "mint_rate"),),
            MintRateChangedEvent { caller, rate },
        );

        Ok(())
    }

    // ============================================
    // FEE TRANSFERS
    // ============================================

    /// Append a fee recipient taking `percent` of every payout
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    /// - `InvalidPercent`: Zero percent, or the list would exceed 100
    pub fn add_transfer(
        env: Env,
        caller: Address,
        recipient: Address,
        percent: u32,
    ) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        let mut transfers = Self::transfers(env.clone());
        let total = sum_percents(&transfers)
            .checked_add(percent)
            .ok_or(Error::InvalidPercent)?;
        if percent == 0 || total as i128 > PERCENT_BASE {
            return Err(Error::InvalidPercent);
        }

        transfers.push_back(FeeTransfer {
            recipient: recipient.clone(),
            percent,
        });
        env.storage().instance().set(&DataKey::Transfers, &transfers);

        env.events().publish(
            (Symbol::new(&env, "transfer_added"),),
            TransferChangedEvent {
                index: transfers.len() - 1,
                recipient,
                percent,
                total_percents: total,
            },
        );

        Ok(())
    }

    /// Replace the fee recipient at `index`. A zero percent keeps the slot
    /// but stops paying it.
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    /// - `NotFound`: No transfer at `index`
    /// - `InvalidPercent`: The list would exceed 100
    pub fn transfer_change(
        env: Env,
        caller: Address,
        index: u32,
        recipient: Address,
        percent: u32,
    ) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        let mut transfers = Self::transfers(env.clone());
        let current = transfers.get(index).ok_or(Error::NotFound)?;

        let total = (sum_percents(&transfers) - current.percent)
            .checked_add(percent)
            .ok_or(Error::InvalidPercent)?;
        if total as i128 > PERCENT_BASE {
            return Err(Error::InvalidPercent);
        }

        transfers.set(
            index,
            FeeTransfer {
                recipient: recipient.clone(),
                percent,
            },
        );
        env.storage().instance().set(&DataKey::Transfers, &transfers);

        env.events().publish(
            (Symbol::new(&env, "transfer_changed"),),
            TransferChangedEvent {
                index,
                recipient,
                percent,
                total_percents: total,
            },
        );

        Ok(())
    }

    pub fn transfers(env: Env) -> Vec<FeeTransfer> {
        env.storage()
            .instance()
            .get(&DataKey::Transfers)
            .unwrap_or(Vec::new(&env))
    }

    pub fn total_percents(env: Env) -> u32 {
        sum_percents(&Self::transfers(env))
    }

    // ============================================
    // MARKETS
    // ============================================

    /// Open a market selling up to `terms.capacity` of the protocol asset.
    /// ETH markets quote in the configured base asset and ignore `quote_token`.
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    /// - `InvalidAmount`: Non-positive capacity, price or max payout
    /// - `InvalidTimestamp`: `finish_time` not in the future
    /// - `NotInitialized`: ETH market without a base asset
    pub fn create(
        env: Env,
        caller: Address,
        is_eth: bool,
        owner: Address,
        quote_token: Address,
        pool: Address,
        fee_tier: u32,
        terms: MarketTerms,
    ) -> Result<u32, Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        let now = env.ledger().timestamp();
        check_terms(&terms, now)?;

        let quote_token = if is_eth {
            Self::base_asset(env.clone())?
        } else {
            quote_token
        };

        let id = Self::markets_length(env.clone());
        let market = Market {
            id,
            is_eth,
            owner,
            quote_token: quote_token.clone(),
            pool,
            fee_tier,
            capacity: terms.capacity,
            sold: 0,
            finish_time: terms.finish_time,
            base_price: terms.base_price,
            asset_price: terms.asset_price,
            max_payout: terms.max_payout,
            active: true,
            created_at: now,
        };

        env.storage()
            .persistent()
            .set(&DataKey::Market(id), &market);
        env.storage()
            .instance()
            .set(&DataKey::MarketCount, &(id + 1));

        env.events().publish(
            (Symbol::new(&env, "market_created"), id),
            MarketCreatedEvent {
                id,
                is_eth,
                quote_token,
                capacity: terms.capacity,
                finish_time: terms.finish_time,
                base_price: terms.base_price,
                asset_price: terms.asset_price,
            },
        );

        Ok(id)
    }

    /// Stop a market immediately, whatever its finish time
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    /// - `NotFound`: Unknown market
    pub fn close(env: Env, caller: Address, id: u32) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        let mut market = Self::load_market(&env, id)?;
        let unsold = market.capacity;

        market.capacity = 0;
        market.active = false;
        env.storage()
            .persistent()
            .set(&DataKey::Market(id), &market);

        env.events().publish(
            (Symbol::new(&env, "market_closed"), id),
            MarketClosedEvent { id, unsold },
        );

        Ok(())
    }

    // ============================================
    // DEPOSITS
    // ============================================

    /// Buy from an ETH market with the base asset
    ///
    /// # Errors
    /// - `WrongMarketKind`: Market quotes in another token
    /// - see [`BondDepository::deposit`]
    pub fn eth_deposit(
        env: Env,
        depositor: Address,
        id: u32,
        amount: i128,
        lock_duration: u64,
        lock: bool,
    ) -> Result<DepositRecord, Error> {
        Self::purchase(&env, depositor, id, amount, lock_duration, lock, true)
    }

    /// Buy from a token market with its quote token. With `lock`, the net
    /// payout becomes a staking position locked for `lock_duration`;
    /// otherwise it is paid out directly.
    ///
    /// # Errors
    /// - `InvalidAmount`: Amount <= 0 or payout rounds to 0
    /// - `NotFound`: Unknown market
    /// - `WrongMarketKind`: ETH market
    /// - `MarketClosed`: Closed or sold out
    /// - `MarketExpired`: Past the finish time
    /// - `ExceedsMaxPayout`: Payout above the per-deposit limit
    /// - `CapacityExceeded`: Payout above the remaining capacity
    /// - `LockRequiresDuration`: `lock` with a zero duration
    pub fn deposit(
        env: Env,
        depositor: Address,
        id: u32,
        amount: i128,
        lock_duration: u64,
        lock: bool,
    ) -> Result<DepositRecord, Error> {
        Self::purchase(&env, depositor, id, amount, lock_duration, lock, false)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    /// Market `id` with `active` reflecting the current time and capacity
    pub fn markets(env: Env, id: u32) -> Result<Market, Error> {
        let mut market = Self::load_market(&env, id)?;
        market.active = Self::is_open(&env, &market);
        Ok(market)
    }

    /// Number of markets ever created; also the next market id
    pub fn markets_length(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::MarketCount)
            .unwrap_or(0)
    }

    pub fn payout_for(env: Env, id: u32, amount: i128) -> Result<i128, Error> {
        let market = Self::load_market(&env, id)?;
        calculate_payout(&env, amount, market.base_price, market.asset_price)
    }

    pub fn deposit_record(env: Env, id: u64) -> Result<DepositRecord, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Deposit(id))
            .ok_or(Error::NotFound)
    }

    pub fn deposits_length(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::DepositCount)
            .unwrap_or(0)
    }

    pub fn mint_rate(env: Env) -> i128 {
        env.storage()
            .instance()
            .get(&DataKey::MintRate)
            .unwrap_or(0)
    }

    pub fn asset(env: Env) -> Result<Address, Error> {
        Self::wired(&env, DataKey::Asset)
    }

    pub fn base_asset(env: Env) -> Result<Address, Error> {
        Self::wired(&env, DataKey::BaseAsset)
    }

    pub fn staking(env: Env) -> Result<Address, Error> {
        Self::wired(&env, DataKey::Staking)
    }

    pub fn treasury(env: Env) -> Result<Address, Error> {
        Self::wired(&env, DataKey::Treasury)
    }

    pub fn calculator(env: Env) -> Result<Address, Error> {
        Self::wired(&env, DataKey::Calculator)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn wired(env: &Env, key: DataKey) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&key)
            .ok_or(Error::NotInitialized)
    }

    fn load_market(env: &Env, id: u32) -> Result<Market, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Market(id))
            .ok_or(Error::NotFound)
    }

    fn is_open(env: &Env, market: &Market) -> bool {
        market.active && market.capacity > 0 && env.ledger().timestamp() <= market.finish_time
    }

    fn purchase(
        env: &Env,
        depositor: Address,
        id: u32,
        amount: i128,
        lock_duration: u64,
        lock: bool,
        is_eth: bool,
    ) -> Result<DepositRecord, Error> {
        depositor.require_auth();

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let mut market = Self::load_market(env, id)?;
        if market.is_eth != is_eth {
            return Err(Error::WrongMarketKind);
        }

        let now = env.ledger().timestamp();
        if !market.active || market.capacity == 0 {
            return Err(Error::MarketClosed);
        }
        if now > market.finish_time {
            return Err(Error::MarketExpired);
        }

        let payout = calculate_payout(env, amount, market.base_price, market.asset_price)?;
        if payout == 0 {
            return Err(Error::InvalidAmount);
        }
        if payout > market.max_payout {
            return Err(Error::ExceedsMaxPayout);
        }
        if payout > market.capacity {
            return Err(Error::CapacityExceeded);
        }
        if lock && lock_duration == 0 {
            return Err(Error::LockRequiresDuration);
        }

        market.capacity -= payout;
        market.sold = market
            .sold
            .checked_add(payout)
            .ok_or(Error::ArithmeticOverflow)?;
        if market.capacity == 0 {
            market.active = false;
        }
        env.storage()
            .persistent()
            .set(&DataKey::Market(id), &market);

        let asset = Self::asset(env.clone())?;
        let treasury = Self::treasury(env.clone())?;
        let this = env.current_contract_address();

        token::Client::new(env, &market.quote_token).transfer(&depositor, &treasury, &amount);

        let minted = calculate_mint(payout, amount, Self::mint_rate(env.clone()))
            .ok_or(Error::ArithmeticOverflow)?;
        let args: Vec<Val> = vec![
            env,
            this.into_val(env),
            treasury.into_val(env),
            minted.into_val(env),
        ];
        env.invoke_contract::<()>(&treasury, &Symbol::new(env, "mint"), args);

        let asset_client = token::Client::new(env, &asset);
        let mut fees: i128 = 0;
        for transfer in Self::transfers(env.clone()).iter() {
            let fee = calculate_fee(payout, transfer.percent).ok_or(Error::ArithmeticOverflow)?;
            if fee > 0 {
                asset_client.transfer_from(&this, &treasury, &transfer.recipient, &fee);
                fees = fees.checked_add(fee).ok_or(Error::ArithmeticOverflow)?;
            }
        }

        let net = payout - fees;
        let stake_id = if lock && net > 0 {
            let staking = Self::staking(env.clone())?;
            let args: Vec<Val> = vec![
                env,
                this.into_val(env),
                depositor.into_val(env),
                net.into_val(env),
                lock_duration.into_val(env),
            ];
            env.invoke_contract::<u64>(&staking, &Symbol::new(env, "deposit"), args)
        } else {
            if net > 0 {
                asset_client.transfer_from(&this, &treasury, &depositor, &net);
            }
            0
        };

        log!(env, "bond deposit routed", id, payout, fees, stake_id);

        let record_id = Self::deposits_length(env.clone());
        let record = DepositRecord {
            id: record_id,
            market_id: id,
            depositor: depositor.clone(),
            amount,
            payout,
            fees,
            stake_id,
            timestamp: now,
        };
        env.storage()
            .persistent()
            .set(&DataKey::Deposit(record_id), &record);
        env.storage()
            .instance()
            .set(&DataKey::DepositCount, &(record_id + 1));

        env.events().publish(
            (Symbol::new(env, "deposited"), depositor.clone()),
            DepositedEvent {
                id: record_id,
                market_id: id,
                depositor,
                amount,
                payout,
                fees,
                stake_id,
            },
        );

        Ok(record)
    }
}
