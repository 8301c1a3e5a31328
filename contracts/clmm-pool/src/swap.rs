use crate::oracle;
use crate::storage::{get_config, get_state, get_tick, set_state, MAX_TICK_CROSSINGS_PER_SWAP};
use crate::tick::{cross, next_initialized_tick};
use soroban_sdk::{token, Address, Env};
use vault_math::{add_delta, compute_swap_step, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, mul_div};
use vault_types::{PoolConfig, MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, Q64};

/// Execute a swap
/// `sender` pays the input leg, `recipient` receives the output leg.
///
/// The number of initialized ticks crossed is capped to stay within the
/// ledger write entry limit. A swap that would cross more is partially
/// filled and the remainder can be sent in a later transaction.
pub fn execute_swap(
    env: &Env,
    sender: Address,
    recipient: Address,
    zero_for_one: bool,
    amount_specified: i128,
    sqrt_price_limit_x96: u128,
) -> (i128, i128) {
    let config = get_config(env);
    let (amount0, amount1) = run_swap(env, &config, zero_for_one, amount_specified, sqrt_price_limit_x96, true);

    // Positive deltas are owed to the pool, negative ones are paid out.
    let (paid_in, paid_out) = if zero_for_one {
        ((&config.token0, amount0), (&config.token1, amount1))
    } else {
        ((&config.token1, amount1), (&config.token0, amount0))
    };
    let pool = env.current_contract_address();
    if paid_in.1 > 0 {
        token::Client::new(env, paid_in.0).transfer(&sender, &pool, &paid_in.1);
    }
    if paid_out.1 < 0 {
        token::Client::new(env, paid_out.0).transfer(&pool, &recipient, &(-paid_out.1));
    }

    (amount0, amount1)
}

/// Deltas `execute_swap` would return from the current state, without
/// touching storage or moving tokens
pub fn quote_swap(env: &Env, zero_for_one: bool, amount_specified: i128, sqrt_price_limit_x96: u128) -> (i128, i128) {
    let config = get_config(env);
    run_swap(env, &config, zero_for_one, amount_specified, sqrt_price_limit_x96, false)
}

/// Walks the price through initialized ticks. With `commit` set, crossed
/// ticks, the oracle and the pool state are written back.
fn run_swap(
    env: &Env,
    config: &PoolConfig,
    zero_for_one: bool,
    amount_specified: i128,
    sqrt_price_limit_x96: u128,
    commit: bool,
) -> (i128, i128) {
    if amount_specified == 0 {
        panic!("Amount must be non-zero");
    }

    let mut state = get_state(env);

    let sqrt_price_limit = match (sqrt_price_limit_x96, zero_for_one) {
        (0, true) => MIN_SQRT_RATIO + 1,
        (0, false) => MAX_SQRT_RATIO - 1,
        (limit, _) => limit,
    };
    let limit_valid = if zero_for_one {
        sqrt_price_limit < state.sqrt_price_x96 && sqrt_price_limit > MIN_SQRT_RATIO
    } else {
        sqrt_price_limit > state.sqrt_price_x96 && sqrt_price_limit < MAX_SQRT_RATIO
    };
    if !limit_valid {
        panic!("Invalid price limit");
    }

    if commit {
        oracle::write(env, state.tick);
    }

    let exact_input = amount_specified > 0;

    let mut amount_remaining = amount_specified;
    let mut amount_calculated: i128 = 0;
    let mut sqrt_price_x96 = state.sqrt_price_x96;
    let mut tick = state.tick;
    let mut liquidity = state.liquidity;
    let mut fee_growth_global_x64 = if zero_for_one {
        state.fee_growth_global_0_x64
    } else {
        state.fee_growth_global_1_x64
    };
    let mut tick_crossings: u32 = 0;

    while amount_remaining != 0
        && sqrt_price_x96 != sqrt_price_limit
        && tick_crossings < MAX_TICK_CROSSINGS_PER_SWAP
    {
        let (tick_next, initialized) = next_initialized_tick(env, tick, zero_for_one);
        let tick_next = tick_next.clamp(MIN_TICK, MAX_TICK);
        let sqrt_price_next_x96 = get_sqrt_ratio_at_tick(env, tick_next);

        let sqrt_price_target_x96 = if zero_for_one {
            sqrt_price_next_x96.max(sqrt_price_limit)
        } else {
            sqrt_price_next_x96.min(sqrt_price_limit)
        };

        let step = compute_swap_step(
            env,
            sqrt_price_x96,
            sqrt_price_target_x96,
            liquidity,
            amount_remaining,
            config.fee,
        );

        if exact_input {
            amount_remaining -= (step.amount_in + step.fee_amount) as i128;
            amount_calculated -= step.amount_out as i128;
        } else {
            amount_remaining += step.amount_out as i128;
            amount_calculated += (step.amount_in + step.fee_amount) as i128;
        }

        if liquidity > 0 {
            fee_growth_global_x64 =
                fee_growth_global_x64.wrapping_add(mul_div(env, step.fee_amount, Q64, liquidity));
        }

        let sqrt_price_before = sqrt_price_x96;
        sqrt_price_x96 = step.sqrt_price_next_x96;

        if sqrt_price_x96 == sqrt_price_next_x96 {
            if initialized {
                let liquidity_net = if commit {
                    let (fee_growth_0, fee_growth_1) = if zero_for_one {
                        (fee_growth_global_x64, state.fee_growth_global_1_x64)
                    } else {
                        (state.fee_growth_global_0_x64, fee_growth_global_x64)
                    };
                    cross(env, tick_next, fee_growth_0, fee_growth_1)
                } else {
                    get_tick(env, tick_next).liquidity_net
                };
                let liquidity_net = if zero_for_one { -liquidity_net } else { liquidity_net };
                liquidity = add_delta(liquidity, liquidity_net);
                tick_crossings += 1;
            }

            tick = if zero_for_one { tick_next - 1 } else { tick_next };
        } else if sqrt_price_x96 != sqrt_price_before {
            tick = get_tick_at_sqrt_ratio(env, sqrt_price_x96);
        }
    }

    if commit {
        state.sqrt_price_x96 = sqrt_price_x96;
        state.tick = tick;
        state.liquidity = liquidity;
        if zero_for_one {
            state.fee_growth_global_0_x64 = fee_growth_global_x64;
        } else {
            state.fee_growth_global_1_x64 = fee_growth_global_x64;
        }
        set_state(env, &state);
    }

    if zero_for_one == exact_input {
        (amount_specified - amount_remaining, amount_calculated)
    } else {
        (amount_calculated, amount_specified - amount_remaining)
    }
}
