use soroban_sdk::{contracttype, Address, String};

/// Constructor arguments of the range vault
#[contracttype]
#[derive(Clone, Debug)]
pub struct VaultParams {
    /// Venue pool the vault provides liquidity to
    pub pool: Address,
    pub tight_lower: i32,
    pub tight_upper: i32,
    pub wide_lower: i32,
    pub wide_upper: i32,
    /// Target units of tight liquidity per unit of wide liquidity
    pub liquidity_ratio: u32,
    /// Largest tolerated distance between spot tick and the 5 minute average tick
    pub max_tick_movement: i32,
    /// Address allowed to toggle the pause flag
    pub pauser: Address,
    /// Share token name
    pub name: String,
    /// Share token symbol
    pub symbol: String,
}

/// A tick range with its boundary prices cached at construction
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RangeBounds {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub sqrt_ratio_lower_x96: u128,
    pub sqrt_ratio_upper_x96: u128,
}

/// Immutable vault configuration
#[contracttype]
#[derive(Clone, Debug)]
pub struct VaultConfig {
    pub pool: Address,
    pub token0: Address,
    pub token1: Address,
    pub tight: RangeBounds,
    pub wide: RangeBounds,
    pub liquidity_ratio: u32,
    pub max_tick_movement: i32,
    pub name: String,
    pub symbol: String,
}

/// Liquidity the vault believes it owns in each range
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LiquidityLedger {
    pub tight: u128,
    pub wide: u128,
}

/// Liquidity of one range and the token amounts it is worth at the current price
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RangePosition {
    pub liquidity: u128,
    pub amount0: u128,
    pub amount1: u128,
}

/// Outcome of a rebalance
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RebalanceSummary {
    /// Fees collected from both ranges
    pub fees0: u128,
    pub fees1: u128,
    /// Liquidity added to each range
    pub tight_added: u128,
    pub wide_added: u128,
    /// Tokens left idle in the vault afterwards
    pub leftover0: u128,
    pub leftover1: u128,
}
