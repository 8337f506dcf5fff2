use soroban_sdk::contracterror;

/// Error codes shared by the treasury, staking ledger, bond depository and
/// protocol token. Codes are wire-stable: append, never renumber.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ============================================
    // INITIALIZATION ERRORS (1-9)
    // ============================================
    /// Roles already bootstrapped / token already initialized
    AlreadyInitialized = 1,
    /// Wiring (asset, treasury, staking...) not configured yet
    NotInitialized = 2,

    // ============================================
    // AUTHORIZATION ERRORS (10-19)
    // ============================================
    /// Caller lacks the required role
    Unauthorized = 10,
    /// Caller lacks the type-specific permission
    Forbidden = 11,

    // ============================================
    // AMOUNT ERRORS (20-29)
    // ============================================
    /// Zero, negative or otherwise malformed numeric input
    InvalidAmount = 20,
    /// Not enough token balance
    InsufficientBalance = 21,
    /// Not enough spending allowance
    InsufficientAllowance = 22,
    /// Fee split percentages would exceed 100
    InvalidPercent = 23,
    /// Timestamp in the past or otherwise out of range
    InvalidTimestamp = 24,
    /// Checked arithmetic overflowed
    ArithmeticOverflow = 25,

    // ============================================
    // MARKET ERRORS (30-39)
    // ============================================
    /// Market closed or capacity exhausted
    MarketClosed = 30,
    /// Market finish time has passed
    MarketExpired = 31,
    /// Payout above the market's per-deposit cap
    ExceedsMaxPayout = 32,
    /// Payout above the market's remaining capacity
    CapacityExceeded = 33,
    /// ETH deposit into a token market or the reverse
    WrongMarketKind = 34,

    // ============================================
    // STAKING ERRORS (40-49)
    // ============================================
    /// Redemption attempted before the position's lock end
    LockActive = 40,
    /// Lock requested with a zero duration
    LockRequiresDuration = 41,
    /// Redeeming more shares than the position holds
    InsufficientShares = 42,

    // ============================================
    // LOOKUP ERRORS (50-59)
    // ============================================
    /// Unknown market, position or list index
    NotFound = 50,
}

impl Error {
    /// Reason string reported alongside the error code.
    pub const fn reason(&self) -> &'static str {
        match self {
            Error::AlreadyInitialized => "already initialized",
            Error::NotInitialized => "not initialized",
            Error::Unauthorized => "caller does not hold the required role",
            Error::Forbidden => "caller lacks the required permission",
            Error::InvalidAmount => "amount must be positive",
            Error::InsufficientBalance => "insufficient balance",
            Error::InsufficientAllowance => "insufficient allowance",
            Error::InvalidPercent => "fee split exceeds 100 percent",
            Error::InvalidTimestamp => "timestamp out of range",
            Error::ArithmeticOverflow => "arithmetic overflow",
            Error::MarketClosed => "market is closed",
            Error::MarketExpired => "market has expired",
            Error::ExceedsMaxPayout => "payout exceeds max payout",
            Error::CapacityExceeded => "payout exceeds market capacity",
            Error::WrongMarketKind => "deposit kind does not match market",
            Error::LockActive => "position is still locked",
            Error::LockRequiresDuration => "lock requested without a duration",
            Error::InsufficientShares => "not enough shares in position",
            Error::NotFound => "record not found",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(Error::Unauthorized as u32, 10);
        assert_eq!(Error::Forbidden as u32, 11);
        assert_eq!(Error::MarketClosed as u32, 30);
        assert_eq!(Error::LockActive as u32, 40);
        assert_eq!(Error::NotFound as u32, 50);
    }

    #[test]
    fn test_reasons_are_distinct() {
        let all = [
            Error::AlreadyInitialized,
            Error::NotInitialized,
            Error::Unauthorized,
            Error::Forbidden,
            Error::InvalidAmount,
            Error::InsufficientBalance,
            Error::InsufficientAllowance,
            Error::InvalidPercent,
            Error::InvalidTimestamp,
            Error::ArithmeticOverflow,
            Error::MarketClosed,
            Error::MarketExpired,
            Error::ExceedsMaxPayout,
            Error::CapacityExceeded,
            Error::WrongMarketKind,
            Error::LockActive,
            Error::LockRequiresDuration,
            Error::InsufficientShares,
            Error::NotFound,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a.reason(), b.reason());
            }
        }
    }
}
