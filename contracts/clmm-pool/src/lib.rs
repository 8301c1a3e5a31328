#![no_std]

mod liquidity;
mod oracle;
mod storage;
mod swap;
mod tick;

use soroban_sdk::{contract, contractimpl, Address, Env, Vec};
use storage::{get_config, get_position, get_state, get_tick, is_initialized, set_config, set_state};
use vault_types::{Fee, PoolConfig, PoolState, PositionInfo, PositionKey, TickInfo};

/// Concentrated liquidity pool
///
/// Positions are keyed by owner and tick range. Whoever adds liquidity or
/// swaps pays the pool through a plain token transfer that the payer
/// authorizes, so a contract owner can pre-authorize exactly what it owes.
#[contract]
pub struct ClmmPool;

#[contractimpl]
impl ClmmPool {
    /// Initialize a new pool and seed its price oracle
    pub fn initialize(
        env: Env,
        token0: Address,
        token1: Address,
        fee: Fee,
        tick_spacing: i32,
        sqrt_price_x96: u128,
    ) {
        if is_initialized(&env) {
            panic!("Already initialized");
        }
        if token0 >= token1 {
            panic!("token0 must be less than token1");
        }
        if vault_types::fee_to_tick_spacing(fee) != tick_spacing {
            panic!("Tick spacing does not match fee tier");
        }

        let tick = vault_math::get_tick_at_sqrt_ratio(&env, sqrt_price_x96);

        let config = PoolConfig {
            token0,
            token1,
            fee,
            tick_spacing,
            max_liquidity_per_tick: vault_types::max_liquidity_per_tick(tick_spacing),
        };
        set_config(&env, &config);
        set_state(&env, &PoolState::new(sqrt_price_x96, tick));
        oracle::initialize(&env);
    }

    /// Execute a swap
    ///
    /// # Arguments
    /// * `sender` - Address paying the input token
    /// * `recipient` - Address to receive output tokens
    /// * `zero_for_one` - True if swapping token0 for token1
    /// * `amount_specified` - Positive for exact input, negative for exact output
    /// * `sqrt_price_limit_x96` - Price limit for the swap, 0 for none
    ///
    /// # Returns
    /// (amount0, amount1) - Negative values are amounts paid out
    pub fn swap(
        env: Env,
        sender: Address,
        recipient: Address,
        zero_for_one: bool,
        amount_specified: i128,
        sqrt_price_limit_x96: u128,
    ) -> (i128, i128) {
        sender.require_auth();
        swap::execute_swap(
            &env,
            sender,
            recipient,
            zero_for_one,
            amount_specified,
            sqrt_price_limit_x96,
        )
    }

    /// Deltas `swap` would return right now, for callers that must
    /// authorize the exact input before swapping. Partial fills included.
    pub fn quote_swap(env: Env, zero_for_one: bool, amount_specified: i128, sqrt_price_limit_x96: u128) -> (i128, i128) {
        swap::quote_swap(&env, zero_for_one, amount_specified, sqrt_price_limit_x96)
    }

    /// Add liquidity to `owner`'s position, pulling the tokens from `payer`
    ///
    /// # Returns
    /// (amount0, amount1) - Token amounts deposited
    pub fn mint(
        env: Env,
        owner: Address,
        payer: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> (u128, u128) {
        payer.require_auth();
        liquidity::mint(&env, owner, payer, tick_lower, tick_upper, amount)
    }

    /// Remove liquidity from a position, crediting it as owed tokens
    ///
    /// # Returns
    /// (amount0, amount1) - Token amounts released
    pub fn burn(env: Env, owner: Address, tick_lower: i32, tick_upper: i32, amount: u128) -> (u128, u128) {
        owner.require_auth();
        liquidity::burn(&env, owner, tick_lower, tick_upper, amount)
    }

    /// Collect owed tokens from a position
    ///
    /// # Returns
    /// (amount0, amount1) - Amounts transferred to `recipient`
    pub fn collect(
        env: Env,
        owner: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> (u128, u128) {
        owner.require_auth();
        liquidity::collect(
            &env,
            owner,
            recipient,
            tick_lower,
            tick_upper,
            amount0_requested,
            amount1_requested,
        )
    }

    /// Tick cumulatives for each `seconds_ago` before now
    pub fn observe(env: Env, seconds_agos: Vec<u32>) -> Vec<i64> {
        let state = get_state(&env);
        oracle::observe(&env, state.tick, &seconds_agos)
    }

    // === View Functions ===

    /// Current sqrt price and tick
    pub fn slot0(env: Env) -> (u128, i32) {
        let state = get_state(&env);
        (state.sqrt_price_x96, state.tick)
    }

    pub fn get_state(env: Env) -> PoolState {
        get_state(&env)
    }

    pub fn get_config(env: Env) -> PoolConfig {
        get_config(&env)
    }

    pub fn get_tick(env: Env, tick: i32) -> TickInfo {
        get_tick(&env, tick)
    }

    pub fn get_position(env: Env, owner: Address, tick_lower: i32, tick_upper: i32) -> PositionInfo {
        let key = PositionKey {
            owner,
            tick_lower,
            tick_upper,
        };
        get_position(&env, &key)
    }

    pub fn liquidity(env: Env) -> u128 {
        get_state(&env).liquidity
    }

    pub fn token0(env: Env) -> Address {
        get_config(&env).token0
    }

    pub fn token1(env: Env) -> Address {
        get_config(&env).token1
    }

    pub fn fee(env: Env) -> u32 {
        get_config(&env).fee
    }

    pub fn tick_spacing(env: Env) -> i32 {
        get_config(&env).tick_spacing
    }
}
