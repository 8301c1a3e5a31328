use crate::oracle;
use crate::storage::{get_config, get_position, get_state, set_position, set_state};
use crate::tick::{get_fee_growth_inside, update as update_tick};
use soroban_sdk::{token, Address, Env};
use vault_math::{add_delta, get_sqrt_ratio_at_tick, mul_div};
use vault_types::{PoolConfig, PositionKey, MAX_TICK, MIN_TICK, Q64};

/// Mint (add) liquidity to a position owned by `owner`, paid by `payer`
/// Amounts owed are rounded up in the pool's favour.
pub fn mint(
    env: &Env,
    owner: Address,
    payer: Address,
    tick_lower: i32,
    tick_upper: i32,
    amount: u128,
) -> (u128, u128) {
    if amount == 0 {
        panic!("Amount must be non-zero");
    }

    let config = get_config(env);
    validate_ticks(&config, tick_lower, tick_upper);

    let key = PositionKey {
        owner,
        tick_lower,
        tick_upper,
    };
    let (amount0, amount1) = modify_position(env, &config, &key, amount as i128);

    let contract_address = env.current_contract_address();
    if amount0 > 0 {
        token::Client::new(env, &config.token0).transfer(&payer, &contract_address, &(amount0 as i128));
    }
    if amount1 > 0 {
        token::Client::new(env, &config.token1).transfer(&payer, &contract_address, &(amount1 as i128));
    }

    (amount0, amount1)
}

/// Burn (remove) liquidity from a position
/// Returned amounts are credited to the position and must be collected.
/// Burning zero only settles accrued fees and requires a live position.
pub fn burn(env: &Env, owner: Address, tick_lower: i32, tick_upper: i32, amount: u128) -> (u128, u128) {
    let config = get_config(env);
    validate_ticks(&config, tick_lower, tick_upper);

    let key = PositionKey {
        owner,
        tick_lower,
        tick_upper,
    };
    if amount == 0 && get_position(env, &key).liquidity == 0 {
        panic!("Position has no liquidity");
    }

    let (amount0, amount1) = modify_position(env, &config, &key, -(amount as i128));

    if amount0 > 0 || amount1 > 0 {
        let mut position = get_position(env, &key);
        position.tokens_owed_0 += amount0;
        position.tokens_owed_1 += amount1;
        set_position(env, &key, &position);
    }

    (amount0, amount1)
}

/// Collect fees and withdrawn tokens from a position
pub fn collect(
    env: &Env,
    owner: Address,
    recipient: Address,
    tick_lower: i32,
    tick_upper: i32,
    amount0_requested: u128,
    amount1_requested: u128,
) -> (u128, u128) {
    let config = get_config(env);

    let key = PositionKey {
        owner,
        tick_lower,
        tick_upper,
    };
    let mut position = get_position(env, &key);

    let amount0 = amount0_requested.min(position.tokens_owed_0);
    let amount1 = amount1_requested.min(position.tokens_owed_1);

    position.tokens_owed_0 -= amount0;
    position.tokens_owed_1 -= amount1;
    set_position(env, &key, &position);

    let contract_address = env.current_contract_address();
    if amount0 > 0 {
        token::Client::new(env, &config.token0).transfer(&contract_address, &recipient, &(amount0 as i128));
    }
    if amount1 > 0 {
        token::Client::new(env, &config.token1).transfer(&contract_address, &recipient, &(amount1 as i128));
    }

    (amount0, amount1)
}

/// Apply a liquidity delta to ticks, position and active liquidity
/// Returns the token amounts backing the delta: rounded up when adding,
/// rounded down when removing.
fn modify_position(env: &Env, config: &PoolConfig, key: &PositionKey, liquidity_delta: i128) -> (u128, u128) {
    let mut state = get_state(env);

    if liquidity_delta != 0 {
        oracle::write(env, state.tick);

        update_tick(
            env,
            key.tick_lower,
            state.tick,
            liquidity_delta,
            state.fee_growth_global_0_x64,
            state.fee_growth_global_1_x64,
            false,
            config.max_liquidity_per_tick,
        );
        update_tick(
            env,
            key.tick_upper,
            state.tick,
            liquidity_delta,
            state.fee_growth_global_0_x64,
            state.fee_growth_global_1_x64,
            true,
            config.max_liquidity_per_tick,
        );
    }

    let (fee_growth_inside_0, fee_growth_inside_1) = get_fee_growth_inside(
        env,
        key.tick_lower,
        key.tick_upper,
        state.tick,
        state.fee_growth_global_0_x64,
        state.fee_growth_global_1_x64,
    );
    update_position(env, key, liquidity_delta, fee_growth_inside_0, fee_growth_inside_1);

    if liquidity_delta != 0 && state.tick >= key.tick_lower && state.tick < key.tick_upper {
        state.liquidity = add_delta(state.liquidity, liquidity_delta);
        set_state(env, &state);
    }

    let sqrt_ratio_lower = get_sqrt_ratio_at_tick(env, key.tick_lower);
    let sqrt_ratio_upper = get_sqrt_ratio_at_tick(env, key.tick_upper);
    let liquidity = liquidity_delta.unsigned_abs();
    if liquidity_delta > 0 {
        vault_math::get_amounts_for_liquidity_rounding_up(
            env,
            state.sqrt_price_x96,
            sqrt_ratio_lower,
            sqrt_ratio_upper,
            liquidity,
        )
    } else {
        vault_math::get_amounts_for_liquidity(
            env,
            state.sqrt_price_x96,
            sqrt_ratio_lower,
            sqrt_ratio_upper,
            liquidity,
        )
    }
}

/// Settle fees earned since the last checkpoint, then apply the delta
fn update_position(
    env: &Env,
    key: &PositionKey,
    liquidity_delta: i128,
    fee_growth_inside_0_x64: u128,
    fee_growth_inside_1_x64: u128,
) {
    let mut position = get_position(env, key);

    if position.liquidity > 0 {
        let fee_delta_0 = fee_growth_inside_0_x64.wrapping_sub(position.fee_growth_inside_0_last_x64);
        let fee_delta_1 = fee_growth_inside_1_x64.wrapping_sub(position.fee_growth_inside_1_last_x64);

        position.tokens_owed_0 += mul_div(env, fee_delta_0, position.liquidity, Q64);
        position.tokens_owed_1 += mul_div(env, fee_delta_1, position.liquidity, Q64);
    }

    position.liquidity = add_delta(position.liquidity, liquidity_delta);
    position.fee_growth_inside_0_last_x64 = fee_growth_inside_0_x64;
    position.fee_growth_inside_1_last_x64 = fee_growth_inside_1_x64;

    set_position(env, key, &position);
}

fn validate_ticks(config: &PoolConfig, tick_lower: i32, tick_upper: i32) {
    if tick_lower >= tick_upper {
        panic!("tick_lower must be less than tick_upper");
    }
    if tick_lower < MIN_TICK {
        panic!("tick_lower too low");
    }
    if tick_upper > MAX_TICK {
        panic!("tick_upper too high");
    }
    if tick_lower % config.tick_spacing != 0 || tick_upper % config.tick_spacing != 0 {
        panic!("Tick not on spacing");
    }
}
