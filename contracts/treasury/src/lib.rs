#![no_std]

mod events;
mod storage;

use events::*;
pub use storage::Permission;
use storage::DataKey;

use protocol_common::{AccessControl, Error, Role};
use soroban_sdk::{
    contract, contractimpl, token, vec, Address, Env, IntoVal, Symbol, Val, Vec,
};

#[contract]
pub struct Treasury;

#[contractimpl]
impl Treasury {
    // ============================================
    // ROLES
    // ============================================

    /// Make `owner` admin and proxy admin of this treasury
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
    // WIRING
    // ============================================

    /// Wire the protocol asset and the valuation calculator. May be repeated
    /// to replace either address.
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a proxy admin
    pub fn initialize(
        env: Env,
        caller: Address,
        asset: Address,
        calculator: Address,
    ) -> Result<(), Error> {
        AccessControl::new(&env).require_proxy_admin(&caller)?;

        env.storage().instance().set(&DataKey::Asset, &asset);
        env.storage().instance().set(&DataKey::Calculator, &calculator);

        env.events().publish(
            (Symbol::new(&env, "initialized"),),
            InitializedEvent { asset, calculator },
        );

        Ok(())
    }

    // ============================================
    // PERMISSION TABLE
    // ============================================

    /// Grant `permission` to `grantee`
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    pub fn enable(
        env: Env,
        caller: Address,
        permission: Permission,
        grantee: Address,
    ) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;
        Self::set_permission(&env, permission, &grantee, true);
        Ok(())
    }

    /// Withdraw `permission` from `grantee`
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    pub fn disable(
        env: Env,
        caller: Address,
        permission: Permission,
        grantee: Address,
    ) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;
        Self::set_permission(&env, permission, &grantee, false);
        Ok(())
    }

    pub fn permissions(env: Env, permission: Permission, account: Address) -> bool {
        env.storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Grant(permission, account))
            .unwrap_or(false)
    }

    // ============================================
    // RESERVE
    // ============================================

    /// Give `spender` a standing, unlimited allowance over the treasury's
    /// protocol asset. Used once per engine when wiring staking and bonds.
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is not a policy admin
    /// - `NotInitialized`: Asset not wired
    pub fn approve(env: Env, caller: Address, spender: Address) -> Result<(), Error> {
        AccessControl::new(&env).require_policy(&caller)?;

        let asset = Self::asset(env.clone())?;
        token::Client::new(&env, &asset).approve(
            &env.current_contract_address(),
            &spender,
            &i128::MAX,
            &u32::MAX,
        );

        env.events().publish(
            (Symbol::new(&env, "approved"), spender.clone()),
            ApprovedEvent { spender },
        );

        Ok(())
    }

    /// Mint the protocol asset to `recipient`. No supply cap is enforced here;
    /// caps live with the callers.
    ///
    /// # Errors
    /// - `Forbidden`: Caller lacks the `Minter` permission
    /// - `InvalidAmount`: Amount <= 0
    /// - `NotInitialized`: Asset not wired
    pub fn mint(env: Env, caller: Address, recipient: Address, amount: i128) -> Result<(), Error> {
        caller.require_auth();

        if !Self::permissions(env.clone(), Permission::Minter, caller.clone()) {
            return Err(Error::Forbidden);
        }

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let asset = Self::asset(env.clone())?;
        let args: Vec<Val> = vec![
            &env,
            env.current_contract_address().into_val(&env),
            recipient.into_val(&env),
            amount.into_val(&env),
        ];
        env.invoke_contract::<()>(&asset, &Symbol::new(&env, "mint"), args);

        env.events().publish(
            (Symbol::new(&env, "minted"), recipient.clone()),
            MintedEvent {
                caller,
                recipient,
                amount,
            },
        );

        Ok(())
    }

    /// Move any reserve token held by the treasury to `to`
    ///
    /// # Errors
    /// - `Forbidden`: Caller lacks the `ReserveSpender` permission
    /// - `InvalidAmount`: Amount <= 0
    pub fn withdraw(
        env: Env,
        caller: Address,
        token: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        caller.require_auth();

        if !Self::permissions(env.clone(), Permission::ReserveSpender, caller.clone()) {
            return Err(Error::Forbidden);
        }

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        token::Client::new(&env, &token).transfer(&env.current_contract_address(), &to, &amount);

        env.events().publish(
            (Symbol::new(&env, "withdrawn"), token.clone()),
            WithdrawnEvent {
                caller,
                token,
                to,
                amount,
            },
        );

        Ok(())
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn asset(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Asset)
            .ok_or(Error::NotInitialized)
    }

    pub fn calculator(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Calculator)
            .ok_or(Error::NotInitialized)
    }

    /// Protocol asset held by the treasury
    pub fn reserve_balance(env: Env) -> Result<i128, Error> {
        let asset = Self::asset(env.clone())?;
        Ok(token::Client::new(&env, &asset).balance(&env.current_contract_address()))
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn set_permission(env: &Env, permission: Permission, grantee: &Address, enabled: bool) {
        let key = DataKey::Grant(permission, grantee.clone());
        if enabled {
            env.storage().instance().set(&key, &true);
        } else {
            env.storage().instance().remove(&key);
        }

        env.events().publish(
            (Symbol::new(env, "permission"), permission, grantee.clone()),
            PermissionChangedEvent {
                permission,
                grantee: grantee.clone(),
                enabled,
            },
        );
    }
}
