use soroban_sdk::{contracttype, Address};

/// Mutable price and liquidity state of a pool.
#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolState {
    /// Q64.96
    pub sqrt_price_x96: u128,
    pub tick: i32,
    /// Liquidity of all positions whose range contains `tick`
    pub liquidity: u128,
    /// Cumulative fees per unit of liquidity, Q64.64, wrapping
    pub fee_growth_global_0_x64: u128,
    pub fee_growth_global_1_x64: u128,
}

impl PoolState {
    pub fn new(sqrt_price_x96: u128, tick: i32) -> Self {
        Self {
            sqrt_price_x96,
            tick,
            liquidity: 0,
            fee_growth_global_0_x64: 0,
            fee_growth_global_1_x64: 0,
        }
    }
}

/// Set once by `initialize`.
#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// `token0 < token1`
    pub token0: Address,
    pub token1: Address,
    /// Millionths of the input amount
    pub fee: u32,
    pub tick_spacing: i32,
    pub max_liquidity_per_tick: u128,
}

/// Positions are keyed by owner and range.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PositionInfo {
    pub liquidity: u128,
    /// Fee growth inside the range when fees were last settled
    pub fee_growth_inside_0_last_x64: u128,
    pub fee_growth_inside_1_last_x64: u128,
    /// Fees and burned principal waiting for `collect`
    pub tokens_owed_0: u128,
    pub tokens_owed_1: u128,
}

#[contracttype]
#[derive(Clone, Debug, Default)]
pub struct TickInfo {
    /// Sum of liquidity of positions bounded by this tick
    pub liquidity_gross: u128,
    /// Added to active liquidity when the price crosses upward
    pub liquidity_net: i128,
    /// Fee growth on the side of the tick away from the current price
    pub fee_growth_outside_0_x64: u128,
    pub fee_growth_outside_1_x64: u128,
    pub initialized: bool,
}

/// One entry of the price oracle ring buffer
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Observation {
    /// Ledger timestamp the entry was written at
    pub timestamp: u64,
    /// Sum of tick * elapsed seconds since the pool was initialized
    pub tick_cumulative: i64,
}
