use crate::full_math::{bit_length, mul_div, mul_div_rounding_up, u128_from_u256};
use soroban_sdk::{Env, U256};
use vault_types::Q96;

fn sorted(a: u128, b: u128) -> (u128, u128) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

fn div_u256(env: &Env, numerator: &U256, denominator: &U256, round_up: bool) -> U256 {
    let quotient = numerator.div(denominator);
    if round_up && numerator.rem_euclid(denominator) > U256::from_u32(env, 0) {
        quotient.add(&U256::from_u32(env, 1))
    } else {
        quotient
    }
}

/// Calculate amount0 delta for a price move from sqrt_ratio_a to sqrt_ratio_b
/// delta_x = L * (sqrt_pb - sqrt_pa) / (sqrt_pa * sqrt_pb)
///
/// Exact whenever `L * 2^96 * (sqrt_pb - sqrt_pa)` fits in 256 bits. Beyond
/// that the two divisions are taken separately, each rounded in the
/// requested direction, so the result never crosses to the wrong side.
pub fn get_amount0_delta(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
    round_up: bool,
) -> u128 {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_ratio_lower == 0 {
        panic!("sqrt_ratio_lower cannot be zero");
    }
    let diff = sqrt_ratio_upper - sqrt_ratio_lower;

    if bit_length(liquidity) + bit_length(diff) + 96 <= 256 {
        let numerator = U256::from_u128(env, liquidity)
            .shl(96)
            .mul(&U256::from_u128(env, diff));
        let denominator =
            U256::from_u128(env, sqrt_ratio_lower).mul(&U256::from_u128(env, sqrt_ratio_upper));
        u128_from_u256(&div_u256(env, &numerator, &denominator, round_up))
    } else if round_up {
        let scaled = mul_div_rounding_up(env, liquidity, diff, sqrt_ratio_upper);
        mul_div_rounding_up(env, scaled, Q96, sqrt_ratio_lower)
    } else {
        let scaled = mul_div(env, liquidity, diff, sqrt_ratio_upper);
        mul_div(env, scaled, Q96, sqrt_ratio_lower)
    }
}

/// Calculate amount1 delta for a price move from sqrt_ratio_a to sqrt_ratio_b
/// delta_y = L * (sqrt_pb - sqrt_pa)
pub fn get_amount1_delta(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
    round_up: bool,
) -> u128 {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if round_up {
        mul_div_rounding_up(env, liquidity, sqrt_ratio_upper - sqrt_ratio_lower, Q96)
    } else {
        mul_div(env, liquidity, sqrt_ratio_upper - sqrt_ratio_lower, Q96)
    }
}

/// Get next sqrt price from an input amount of token0 or token1
pub fn get_next_sqrt_price_from_input(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount_in: u128,
    zero_for_one: bool,
) -> u128 {
    if sqrt_price_x96 == 0 || liquidity == 0 {
        panic!("Invalid inputs");
    }

    if zero_for_one {
        get_next_sqrt_price_from_amount0_rounding_up(env, sqrt_price_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount1_rounding_down(env, sqrt_price_x96, liquidity, amount_in, true)
    }
}

/// Get next sqrt price from an output amount
pub fn get_next_sqrt_price_from_output(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount_out: u128,
    zero_for_one: bool,
) -> u128 {
    if sqrt_price_x96 == 0 || liquidity == 0 {
        panic!("Invalid inputs");
    }

    if zero_for_one {
        get_next_sqrt_price_from_amount1_rounding_down(env, sqrt_price_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount0_rounding_up(env, sqrt_price_x96, liquidity, amount_out, false)
    }
}

/// sqrt_price_next = L * sqrt_price / (L +- amount * sqrt_price), rounded up
///
/// Uses the direct product when `L * 2^96 * sqrt_price` fits in 256 bits and
/// the equivalent `L / (L / sqrt_price +- amount)` form otherwise.
fn get_next_sqrt_price_from_amount0_rounding_up(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> u128 {
    if amount == 0 {
        return sqrt_price_x96;
    }

    let numerator1_bits = bit_length(liquidity) + 96;
    let numerator1 = U256::from_u128(env, liquidity).shl(96);
    let sqrt_price = U256::from_u128(env, sqrt_price_x96);
    let amount_256 = U256::from_u128(env, amount);
    let fits = numerator1_bits + bit_length(sqrt_price_x96) <= 256;

    if add {
        if fits && bit_length(amount) + bit_length(sqrt_price_x96) < 256 && numerator1_bits < 256 {
            let denominator = numerator1.add(&amount_256.mul(&sqrt_price));
            let product = numerator1.mul(&sqrt_price);
            return u128_from_u256(&div_u256(env, &product, &denominator, true));
        }
        let denominator = numerator1.div(&sqrt_price).add(&amount_256);
        u128_from_u256(&div_u256(env, &numerator1, &denominator, true))
    } else {
        let product = amount_256.mul(&sqrt_price);
        if product >= numerator1 {
            panic!("Denominator underflow");
        }
        if fits {
            let denominator = numerator1.sub(&product);
            let product = numerator1.mul(&sqrt_price);
            return u128_from_u256(&div_u256(env, &product, &denominator, true));
        }
        let scaled = numerator1.div(&sqrt_price);
        if scaled <= amount_256 {
            panic!("Denominator underflow");
        }
        let denominator = scaled.sub(&amount_256);
        u128_from_u256(&div_u256(env, &numerator1, &denominator, true))
    }
}

/// sqrt_price_next = sqrt_price +- amount / L, rounded down
fn get_next_sqrt_price_from_amount1_rounding_down(
    env: &Env,
    sqrt_price_x96: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> u128 {
    if add {
        let quotient = mul_div(env, amount, Q96, liquidity);
        match sqrt_price_x96.checked_add(quotient) {
            Some(next) => next,
            None => panic!("sqrt_price overflow"),
        }
    } else {
        let quotient = mul_div_rounding_up(env, amount, Q96, liquidity);
        if sqrt_price_x96 <= quotient {
            panic!("sqrt_price underflow");
        }
        sqrt_price_x96 - quotient
    }
}
