//! Role registry shared by every engine.
//!
//! Each contract keeps its own registry in instance storage; the engines talk to
//! it through [`AccessControl`] instead of reading role keys themselves.

use soroban_sdk::{contracttype, Address, Env, Symbol};

use crate::error::Error;
use crate::events::RoleChangedEvent;

/// Independent authorization roles. Holding one never implies another.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// Privileged reads and operational ownership
    Admin = 0,
    /// Role management and wiring (`initialize`)
    ProxyAdmin = 1,
    /// Parameter changes (permissions, rates, markets)
    Policy = 2,
}

#[contracttype]
#[derive(Clone)]
enum AccessKey {
    Bootstrapped,
    Member(Role, Address),
}

pub struct AccessControl<'a> {
    env: &'a Env,
}

impl<'a> AccessControl<'a> {
    pub fn new(env: &'a Env) -> Self {
        Self { env }
    }

    /// Makes `owner` Admin and ProxyAdmin. Runs once per contract.
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Registry already bootstrapped
    pub fn bootstrap(&self, owner: &Address) -> Result<(), Error> {
        if self.env.storage().instance().has(&AccessKey::Bootstrapped) {
            return Err(Error::AlreadyInitialized);
        }

        owner.require_auth();

        self.env
            .storage()
            .instance()
            .set(&AccessKey::Bootstrapped, &true);
        self.write(Role::Admin, owner, true, owner);
        self.write(Role::ProxyAdmin, owner, true, owner);

        Ok(())
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.env
            .storage()
            .instance()
            .get::<AccessKey, bool>(&AccessKey::Member(role, account.clone()))
            .unwrap_or(false)
    }

    pub fn is_admin(&self, account: &Address) -> bool {
        self.has_role(Role::Admin, account)
    }

    pub fn is_proxy_admin(&self, account: &Address) -> bool {
        self.has_role(Role::ProxyAdmin, account)
    }

    pub fn is_policy(&self, account: &Address) -> bool {
        self.has_role(Role::Policy, account)
    }

    /// Authenticates `caller` and checks it holds `role`.
    ///
    /// # Errors
    /// - `Unauthorized`: Caller does not hold `role`
    pub fn require_role(&self, role: Role, caller: &Address) -> Result<(), Error> {
        caller.require_auth();

        if !self.has_role(role, caller) {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    pub fn require_proxy_admin(&self, caller: &Address) -> Result<(), Error> {
        self.require_role(Role::ProxyAdmin, caller)
    }

    pub fn require_policy(&self, caller: &Address) -> Result<(), Error> {
        self.require_role(Role::Policy, caller)
    }

    /// # Errors
    /// - `Unauthorized`: Caller is not a proxy admin
    pub fn grant(&self, caller: &Address, role: Role, account: &Address) -> Result<(), Error> {
        self.require_proxy_admin(caller)?;
        self.write(role, account, true, caller);
        Ok(())
    }

    /// # Errors
    /// - `Unauthorized`: Caller is not a proxy admin
    pub fn revoke(&self, caller: &Address, role: Role, account: &Address) -> Result<(), Error> {
        self.require_proxy_admin(caller)?;
        self.write(role, account, false, caller);
        Ok(())
    }

    fn write(&self, role: Role, account: &Address, granted: bool, by: &Address) {
        let key = AccessKey::Member(role, account.clone());
        if granted {
            self.env.storage().instance().set(&key, &true);
        } else {
            self.env.storage().instance().remove(&key);
        }

        let topic = if granted { "role_granted" } else { "role_revoked" };
        self.env.events().publish(
            (Symbol::new(self.env, topic), role),
            RoleChangedEvent {
                role,
                account: account.clone(),
                granted,
                by: by.clone(),
            },
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{contract, contractimpl, testutils::Address as _, Address, Env};

    // Instance storage needs a contract frame to live in.
    #[contract]
    pub struct Host;

    #[contractimpl]
    impl Host {}

    fn setup() -> (Env, Address, Address) {
        let env = Env::default();
        env.mock_all_auths();
        let host = env.register(Host, ());
        let owner = Address::generate(&env);
        (env, host, owner)
    }

    #[test]
    fn test_bootstrap_grants_admin_and_proxy_admin_only() {
        let (env, host, owner) = setup();
        env.as_contract(&host, || {
            let access = AccessControl::new(&env);
            access.bootstrap(&owner).unwrap();

            assert!(access.is_admin(&owner));
            assert!(access.is_proxy_admin(&owner));
            assert!(!access.is_policy(&owner));

            assert_eq!(access.bootstrap(&owner), Err(Error::AlreadyInitialized));
        });
    }

    #[test]
    fn test_only_proxy_admin_can_grant() {
        let (env, host, owner) = setup();
        let user = Address::generate(&env);

        // One frame per authorizing call: an address authorizes once per frame.
        let run = |f: &dyn Fn(&AccessControl) -> Result<(), Error>| {
            env.as_contract(&host, || f(&AccessControl::new(&env)))
        };

        run(&|access| access.bootstrap(&owner)).unwrap();

        assert_eq!(
            run(&|access| access.grant(&user, Role::Policy, &user)),
            Err(Error::Unauthorized)
        );
        env.as_contract(&host, || assert!(!AccessControl::new(&env).is_policy(&user)));

        run(&|access| access.grant(&owner, Role::Policy, &user)).unwrap();
        env.as_contract(&host, || assert!(AccessControl::new(&env).is_policy(&user)));
        assert!(run(&|access| access.require_policy(&user)).is_ok());

        run(&|access| access.revoke(&owner, Role::Policy, &user)).unwrap();
        env.as_contract(&host, || assert!(!AccessControl::new(&env).is_policy(&user)));
        assert_eq!(
            run(&|access| access.require_policy(&user)),
            Err(Error::Unauthorized)
        );
    }

    #[test]
    fn test_roles_are_independent() {
        let (env, host, owner) = setup();
        let run = |f: &dyn Fn(&AccessControl) -> Result<(), Error>| {
            env.as_contract(&host, || f(&AccessControl::new(&env)))
        };

        run(&|access| access.bootstrap(&owner)).unwrap();

        // Admin and proxy admin do not pass a policy check.
        assert_eq!(
            run(&|access| access.require_policy(&owner)),
            Err(Error::Unauthorized)
        );

        run(&|access| access.grant(&owner, Role::Policy, &owner)).unwrap();
        run(&|access| access.revoke(&owner, Role::Admin, &owner)).unwrap();

        env.as_contract(&host, || {
            let access = AccessControl::new(&env);
            assert!(!access.is_admin(&owner));
            assert!(access.is_proxy_admin(&owner));
            assert!(access.is_policy(&owner));
        });
    }
}
