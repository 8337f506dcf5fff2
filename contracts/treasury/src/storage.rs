use soroban_sdk::{contracttype, Address};

/// Permission types. Discriminants are the wire-level type numbers used by
/// callers, so existing values must never change.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Permission {
    /// May move reserve tokens out of the treasury
    ReserveSpender = 1,
    /// May mint the protocol asset through the treasury
    Minter = 7,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Asset,
    Calculator,
    Grant(Permission, Address),
}
