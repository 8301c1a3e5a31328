use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum VaultError {
    /// Operation needs both ranges seeded by `initialize`
    NotInitialized = 1,
    AlreadyInitialized = 2,
    /// Price moved past the caller's bounds or the trailing average guard
    Slippage = 3,
    /// A liquidity amount or token valuation does not fit in 128 bits
    LiquidityOverflow = 4,
    Unauthorized = 5,
    Paused = 6,
    InsufficientBalance = 7,
    InsufficientAllowance = 8,
    InvalidAmount = 9,
    InvalidConfig = 10,
}
