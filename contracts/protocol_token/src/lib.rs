#![no_std]

mod events;
mod storage;

use events::{ApproveEvent, BurnEvent, MintEvent, TransferEvent};
use protocol_common::Error;
use storage::{AllowanceValue, DataKey, Metadata, DECIMALS};

use soroban_sdk::{contract, contractimpl, Address, Env, String, Symbol};

#[contract]
pub struct ProtocolToken;

#[contractimpl]
impl ProtocolToken {
    /// Initialize the token contract
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, admin: Address, name: String, symbol: String) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::Metadata, &Metadata { name, symbol });
        env.storage().instance().set(&DataKey::TotalSupply, &0i128);

        Ok(())
    }

    /// Add a minter (the treasury)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn add_minter(env: Env, minter: Address) -> Result<(), Error> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        admin.require_auth();

        env.storage()
            .instance()
            .set(&DataKey::Minter(minter), &true);

        Ok(())
    }

    /// Remove a minter
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn remove_minter(env: Env, minter: Address) -> Result<(), Error> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        admin.require_auth();

        env.storage().instance().remove(&DataKey::Minter(minter));

        Ok(())
    }

    /// Mint tokens (only minters)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount <= 0
    /// - `Unauthorized`: Caller is not a minter
    pub fn mint(env: Env, minter: Address, to: Address, amount: i128) -> Result<(), Error> {
        Self::check_initialized(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        minter.require_auth();

        if !Self::is_minter(env.clone(), minter.clone()) {
            return Err(Error::Unauthorized);
        }

        Self::credit(&env, &to, amount)?;

        let supply = Self::total_supply(env.clone())
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        env.storage().instance().set(&DataKey::TotalSupply, &supply);

        env.events().publish(
            (Symbol::new(&env, "mint"), to.clone()),
            MintEvent { minter, to, amount },
        );

        Ok(())
    }

    /// Burn tokens from the caller's own balance
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount <= 0
    /// - `InsufficientBalance`: Not enough balance
    pub fn burn(env: Env, from: Address, amount: i128) -> Result<(), Error> {
        Self::check_initialized(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        from.require_auth();

        Self::debit(&env, &from, amount)?;

        let supply = Self::total_supply(env.clone()) - amount;
        env.storage().instance().set(&DataKey::TotalSupply, &supply);

        env.events().publish(
            (Symbol::new(&env, "burn"), from.clone()),
            BurnEvent { from, amount },
        );

        Ok(())
    }

    /// Transfer tokens between holders
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount <= 0
    /// - `InsufficientBalance`: Not enough balance
    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        Self::check_initialized(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        from.require_auth();

        Self::move_balance(&env, &from, &to, amount)
    }

    /// Let `spender` move up to `amount` of `from`'s tokens until
    /// `expiration_ledger`. `i128::MAX` is a standing allowance that is never
    /// drawn down.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount < 0
    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), Error> {
        Self::check_initialized(&env)?;

        if amount < 0 {
            return Err(Error::InvalidAmount);
        }

        from.require_auth();

        let key = DataKey::Allowance(from.clone(), spender.clone());
        if amount == 0 {
            env.storage().instance().remove(&key);
        } else {
            env.storage().instance().set(
                &key,
                &AllowanceValue {
                    amount,
                    expiration_ledger,
                },
            );
        }

        env.events().publish(
            (Symbol::new(&env, "approve"), from.clone()),
            ApproveEvent {
                from,
                spender,
                amount,
                expiration_ledger,
            },
        );

        Ok(())
    }

    /// Move tokens on behalf of `from` using the spender's allowance
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `InvalidAmount`: Amount <= 0
    /// - `InsufficientAllowance`: Allowance missing, expired or too small
    /// - `InsufficientBalance`: Not enough balance
    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        Self::check_initialized(&env)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        spender.require_auth();

        let allowance = Self::allowance(env.clone(), from.clone(), spender.clone());
        if allowance < amount {
            return Err(Error::InsufficientAllowance);
        }

        if allowance != i128::MAX {
            let key = DataKey::Allowance(from.clone(), spender.clone());
            let mut value: AllowanceValue = env
                .storage()
                .instance()
                .get(&key)
                .ok_or(Error::InsufficientAllowance)?;
            value.amount = allowance - amount;
            env.storage().instance().set(&key, &value);
        }

        Self::move_balance(&env, &from, &to, amount)
    }

    /// Get the live allowance from `from` to `spender`
    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        match env
            .storage()
            .instance()
            .get::<DataKey, AllowanceValue>(&DataKey::Allowance(from, spender))
        {
            Some(value) if value.expiration_ledger >= env.ledger().sequence() => value.amount,
            _ => 0,
        }
    }

    /// Get balance for a holder
    pub fn balance(env: Env, id: Address) -> i128 {
        env.storage()
            .instance()
            .get::<DataKey, i128>(&DataKey::Balance(id))
            .unwrap_or(0)
    }

    pub fn total_supply(env: Env) -> i128 {
        env.storage()
            .instance()
            .get::<DataKey, i128>(&DataKey::TotalSupply)
            .unwrap_or(0)
    }

    /// Check if address is a minter
    pub fn is_minter(env: Env, address: Address) -> bool {
        env.storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Minter(address))
            .unwrap_or(false)
    }

    pub fn decimals(_env: Env) -> u32 {
        DECIMALS
    }

    pub fn name(env: Env) -> Result<String, Error> {
        Ok(Self::metadata(&env)?.name)
    }

    pub fn symbol(env: Env) -> Result<String, Error> {
        Ok(Self::metadata(&env)?.symbol)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn check_initialized(env: &Env) -> Result<(), Error> {
        if !env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    fn metadata(env: &Env) -> Result<Metadata, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Metadata)
            .ok_or(Error::NotInitialized)
    }

    fn credit(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
        let key = DataKey::Balance(to.clone());
        let balance = env
            .storage()
            .instance()
            .get::<DataKey, i128>(&key)
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(Error::ArithmeticOverflow)?;
        env.storage().instance().set(&key, &balance);
        Ok(())
    }

    fn debit(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
        let key = DataKey::Balance(from.clone());
        let balance = env
            .storage()
            .instance()
            .get::<DataKey, i128>(&key)
            .ok_or(Error::InsufficientBalance)?;

        if balance < amount {
            return Err(Error::InsufficientBalance);
        }

        let remaining = balance - amount;
        if remaining == 0 {
            env.storage().instance().remove(&key);
        } else {
            env.storage().instance().set(&key, &remaining);
        }
        Ok(())
    }

    fn move_balance(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
        Self::debit(env, from, amount)?;
        Self::credit(env, to, amount)?;

        env.events().publish(
            (Symbol::new(env, "transfer"), from.clone(), to.clone()),
            TransferEvent {
                from: from.clone(),
                to: to.clone(),
                amount,
            },
        );

        Ok(())
    }
}
