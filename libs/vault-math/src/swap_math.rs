use crate::full_math::{mul_div, mul_div_rounding_up};
use crate::sqrt_price_math::{
    get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use soroban_sdk::Env;

/// Fees are expressed in millionths of the input amount
pub const FEE_DENOMINATOR: u128 = 1_000_000;

/// Result of a single swap step computation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapStepResult {
    /// The sqrt price after this step
    pub sqrt_price_next_x96: u128,
    /// Amount of input token consumed, fee excluded
    pub amount_in: u128,
    /// Amount of output token produced
    pub amount_out: u128,
    /// Fee amount taken from input
    pub fee_amount: u128,
}

/// Compute the result of swapping within a single tick range
///
/// # Arguments
/// * `sqrt_price_current_x96` - Current sqrt price
/// * `sqrt_price_target_x96` - Target sqrt price (next tick boundary or price limit)
/// * `liquidity` - Available liquidity in this range
/// * `amount_remaining` - Remaining amount to swap (positive = exact input, negative = exact output)
/// * `fee_pips` - Fee in hundredths of a bip (e.g., 3000 = 0.3%)
pub fn compute_swap_step(
    env: &Env,
    sqrt_price_current_x96: u128,
    sqrt_price_target_x96: u128,
    liquidity: u128,
    amount_remaining: i128,
    fee_pips: u32,
) -> SwapStepResult {
    let zero_for_one = sqrt_price_current_x96 >= sqrt_price_target_x96;
    let exact_in = amount_remaining >= 0;
    let fee = fee_pips as u128;

    // Input needed (or output available) to move all the way to the target
    let amount_to_target = match (exact_in, zero_for_one) {
        (true, true) => get_amount0_delta(env, sqrt_price_target_x96, sqrt_price_current_x96, liquidity, true),
        (true, false) => get_amount1_delta(env, sqrt_price_current_x96, sqrt_price_target_x96, liquidity, true),
        (false, true) => get_amount1_delta(env, sqrt_price_target_x96, sqrt_price_current_x96, liquidity, false),
        (false, false) => get_amount0_delta(env, sqrt_price_current_x96, sqrt_price_target_x96, liquidity, false),
    };

    let sqrt_price_next_x96 = if exact_in {
        let amount_remaining_less_fee =
            mul_div(env, amount_remaining as u128, FEE_DENOMINATOR - fee, FEE_DENOMINATOR);
        if amount_remaining_less_fee >= amount_to_target {
            sqrt_price_target_x96
        } else {
            get_next_sqrt_price_from_input(
                env,
                sqrt_price_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )
        }
    } else if amount_remaining.unsigned_abs() >= amount_to_target {
        sqrt_price_target_x96
    } else {
        get_next_sqrt_price_from_output(
            env,
            sqrt_price_current_x96,
            liquidity,
            amount_remaining.unsigned_abs(),
            zero_for_one,
        )
    };

    let reached_target = sqrt_price_next_x96 == sqrt_price_target_x96;
    let (lower, upper) = if zero_for_one {
        (sqrt_price_next_x96, sqrt_price_current_x96)
    } else {
        (sqrt_price_current_x96, sqrt_price_next_x96)
    };

    let amount_in = if reached_target && exact_in {
        amount_to_target
    } else if zero_for_one {
        get_amount0_delta(env, lower, upper, liquidity, true)
    } else {
        get_amount1_delta(env, lower, upper, liquidity, true)
    };

    let mut amount_out = if reached_target && !exact_in {
        amount_to_target
    } else if zero_for_one {
        get_amount1_delta(env, lower, upper, liquidity, false)
    } else {
        get_amount0_delta(env, lower, upper, liquidity, false)
    };

    if !exact_in && amount_out > amount_remaining.unsigned_abs() {
        amount_out = amount_remaining.unsigned_abs();
    }

    let fee_amount = if exact_in && !reached_target {
        // the whole remainder is consumed, what the price move did not absorb is fee
        (amount_remaining as u128) - amount_in
    } else {
        mul_div_rounding_up(env, amount_in, fee, FEE_DENOMINATOR - fee)
    };

    SwapStepResult {
        sqrt_price_next_x96,
        amount_in,
        amount_out,
        fee_amount,
    }
}
