use soroban_sdk::{contracttype, Address};

use crate::storage::Permission;

#[contracttype]
#[derive(Clone, Debug)]
pub struct InitializedEvent {
    pub asset: Address,
    pub calculator: Address,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PermissionChangedEvent {
    pub permission: Permission,
    pub grantee: Address,
    pub enabled: bool,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ApprovedEvent {
    pub spender: Address,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct MintedEvent {
    pub caller: Address,
    pub recipient: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct WithdrawnEvent {
    pub caller: Address,
    pub token: Address,
    pub to: Address,
    pub amount: i128,
}
