use crate::full_math::{checked_mul_div, mul_div};
use crate::sqrt_price_math::{get_amount0_delta, get_amount1_delta};
use soroban_sdk::Env;
use vault_types::Q96;

/// Where the current price sits relative to a range, which decides the
/// tokens a position in that range holds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PricePosition {
    /// At or below the lower bound: token0 only
    Below,
    /// Strictly between the bounds: both tokens
    Inside,
    /// At or above the upper bound: token1 only
    Above,
}

fn sorted(a: u128, b: u128) -> (u128, u128) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Classify `sqrt_ratio_x96` against the range [a, b]
pub fn price_position(sqrt_ratio_x96: u128, sqrt_ratio_a_x96: u128, sqrt_ratio_b_x96: u128) -> PricePosition {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sqrt_ratio_x96 <= sqrt_ratio_lower {
        PricePosition::Below
    } else if sqrt_ratio_x96 < sqrt_ratio_upper {
        PricePosition::Inside
    } else {
        PricePosition::Above
    }
}

/// Calculate liquidity from token amounts for a price range, rounding down
pub fn get_liquidity_for_amounts(
    env: &Env,
    sqrt_ratio_x96: u128,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    amount0: u128,
    amount1: u128,
) -> u128 {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    match price_position(sqrt_ratio_x96, sqrt_ratio_lower, sqrt_ratio_upper) {
        PricePosition::Below => {
            get_liquidity_for_amount0(env, sqrt_ratio_lower, sqrt_ratio_upper, amount0)
        }
        PricePosition::Inside => {
            let liquidity0 =
                get_liquidity_for_amount0(env, sqrt_ratio_x96, sqrt_ratio_upper, amount0);
            let liquidity1 =
                get_liquidity_for_amount1(env, sqrt_ratio_lower, sqrt_ratio_x96, amount1);
            liquidity0.min(liquidity1)
        }
        PricePosition::Above => {
            get_liquidity_for_amount1(env, sqrt_ratio_lower, sqrt_ratio_upper, amount1)
        }
    }
}

/// Calculate liquidity from amount0
/// L = amount0 * sqrt_pa * sqrt_pb / (sqrt_pb - sqrt_pa)
pub fn get_liquidity_for_amount0(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    amount0: u128,
) -> u128 {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let diff = sqrt_ratio_upper - sqrt_ratio_lower;

    match checked_mul_div(env, sqrt_ratio_lower, sqrt_ratio_upper, Q96) {
        Some(intermediate) => mul_div(env, amount0, intermediate, diff),
        // sqrt_pa * sqrt_pb above 2^224: divide by the width first
        None => mul_div(env, mul_div(env, amount0, sqrt_ratio_lower, diff), sqrt_ratio_upper, Q96),
    }
}

/// Calculate liquidity from amount1
/// L = amount1 / (sqrt_pb - sqrt_pa)
pub fn get_liquidity_for_amount1(
    env: &Env,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    amount1: u128,
) -> u128 {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    mul_div(env, amount1, Q96, sqrt_ratio_upper - sqrt_ratio_lower)
}

fn amounts_for_liquidity(
    env: &Env,
    sqrt_ratio_x96: u128,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
    round_up: bool,
) -> (u128, u128) {
    let (sqrt_ratio_lower, sqrt_ratio_upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    match price_position(sqrt_ratio_x96, sqrt_ratio_lower, sqrt_ratio_upper) {
        PricePosition::Below => (
            get_amount0_delta(env, sqrt_ratio_lower, sqrt_ratio_upper, liquidity, round_up),
            0,
        ),
        PricePosition::Inside => (
            get_amount0_delta(env, sqrt_ratio_x96, sqrt_ratio_upper, liquidity, round_up),
            get_amount1_delta(env, sqrt_ratio_lower, sqrt_ratio_x96, liquidity, round_up),
        ),
        PricePosition::Above => (
            0,
            get_amount1_delta(env, sqrt_ratio_lower, sqrt_ratio_upper, liquidity, round_up),
        ),
    }
}

/// Token amounts a position of `liquidity` is worth, rounded down
pub fn get_amounts_for_liquidity(
    env: &Env,
    sqrt_ratio_x96: u128,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
) -> (u128, u128) {
    amounts_for_liquidity(env, sqrt_ratio_x96, sqrt_ratio_a_x96, sqrt_ratio_b_x96, liquidity, false)
}

/// Token amounts needed to mint `liquidity`, rounded up
pub fn get_amounts_for_liquidity_rounding_up(
    env: &Env,
    sqrt_ratio_x96: u128,
    sqrt_ratio_a_x96: u128,
    sqrt_ratio_b_x96: u128,
    liquidity: u128,
) -> (u128, u128) {
    amounts_for_liquidity(env, sqrt_ratio_x96, sqrt_ratio_a_x96, sqrt_ratio_b_x96, liquidity, true)
}

/// Add signed liquidity delta to unsigned liquidity
pub fn add_delta(liquidity: u128, delta: i128) -> u128 {
    if delta < 0 {
        match liquidity.checked_sub(delta.unsigned_abs()) {
            Some(result) => result,
            None => panic!("Liquidity underflow"),
        }
    } else {
        match liquidity.checked_add(delta as u128) {
            Some(result) => result,
            None => panic!("Liquidity overflow"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_math::get_sqrt_ratio_at_tick;
    use soroban_sdk::Env;

    const AMOUNT: u128 = 1_000_000_000_000;

    #[test]
    fn test_add_delta() {
        assert_eq!(add_delta(100, 50), 150);
        assert_eq!(add_delta(100, -100), 0);
        assert_eq!(add_delta(0, i128::MAX), i128::MAX as u128);
        assert_eq!(add_delta(u128::MAX, i128::MIN), u128::MAX - (1u128 << 127));
    }

    #[test]
    #[should_panic(expected = "Liquidity underflow")]
    fn test_add_delta_underflow() {
        add_delta(50, -100);
    }

    #[test]
    #[should_panic(expected = "Liquidity overflow")]
    fn test_add_delta_overflow() {
        add_delta(u128::MAX, 1);
    }

    #[test]
    fn test_price_position() {
        assert_eq!(price_position(Q96 * 8 / 10, Q96 * 9 / 10, Q96 * 11 / 10), PricePosition::Below);
        assert_eq!(price_position(Q96 * 9 / 10, Q96 * 9 / 10, Q96 * 11 / 10), PricePosition::Below);
        assert_eq!(price_position(Q96, Q96 * 11 / 10, Q96 * 9 / 10), PricePosition::Inside);
        assert_eq!(price_position(Q96 * 11 / 10, Q96 * 9 / 10, Q96 * 11 / 10), PricePosition::Above);
    }

    #[test]
    fn test_liquidity_outside_range_ignores_other_token() {
        let env = Env::default();
        let lower = Q96 * 9 / 10;
        let upper = Q96 * 11 / 10;

        let below = get_liquidity_for_amounts(&env, Q96 * 8 / 10, lower, upper, AMOUNT, 0);
        assert!(below > 0);
        assert_eq!(below, get_liquidity_for_amounts(&env, Q96 * 8 / 10, lower, upper, AMOUNT, AMOUNT));

        let above = get_liquidity_for_amounts(&env, Q96 * 12 / 10, lower, upper, 0, AMOUNT);
        assert!(above > 0);
        assert_eq!(above, get_liquidity_for_amounts(&env, Q96 * 12 / 10, lower, upper, AMOUNT, AMOUNT));
    }

    #[test]
    fn test_liquidity_at_boundaries_matches_single_sided() {
        let env = Env::default();
        let lower = get_sqrt_ratio_at_tick(&env, -100);
        let upper = get_sqrt_ratio_at_tick(&env, 510);

        assert_eq!(
            get_liquidity_for_amounts(&env, lower, lower, upper, AMOUNT, AMOUNT),
            get_liquidity_for_amount0(&env, lower, upper, AMOUNT)
        );
        assert_eq!(
            get_liquidity_for_amounts(&env, upper, lower, upper, AMOUNT, AMOUNT),
            get_liquidity_for_amount1(&env, lower, upper, AMOUNT)
        );
    }

    #[test]
    fn test_liquidity_continuous_across_lower_boundary() {
        let env = Env::default();
        let lower = get_sqrt_ratio_at_tick(&env, -100);
        let upper = get_sqrt_ratio_at_tick(&env, 510);

        // token1 is kept small so the one-unit-wide token1 side still fits
        let at_boundary = get_liquidity_for_amounts(&env, lower, lower, upper, AMOUNT, 1_000_000);
        let just_inside = get_liquidity_for_amounts(&env, lower + 1, lower, upper, AMOUNT, 1_000_000);
        // one unit of sqrt price barely changes the token0 requirement
        assert!(just_inside >= at_boundary);
        assert!(just_inside - at_boundary <= at_boundary / 1_000_000_000);
    }

    #[test]
    fn test_liquidity_continuous_across_upper_boundary() {
        let env = Env::default();
        let lower = get_sqrt_ratio_at_tick(&env, -100);
        let upper = get_sqrt_ratio_at_tick(&env, 510);

        let at_boundary = get_liquidity_for_amounts(&env, upper, lower, upper, 1_000_000, AMOUNT);
        let just_inside = get_liquidity_for_amounts(&env, upper - 1, lower, upper, 1_000_000, AMOUNT);
        assert!(just_inside >= at_boundary);
        assert!(just_inside - at_boundary <= at_boundary / 1_000_000_000);
    }

    #[test]
    fn test_amounts_for_liquidity_by_position() {
        let env = Env::default();
        let lower = Q96 * 9 / 10;
        let upper = Q96 * 11 / 10;
        let liquidity = 1_000_000_000_000_000u128;

        let (a0, a1) = get_amounts_for_liquidity(&env, Q96 * 8 / 10, lower, upper, liquidity);
        assert!(a0 > 0);
        assert_eq!(a1, 0);

        let (a0, a1) = get_amounts_for_liquidity(&env, Q96, lower, upper, liquidity);
        assert!(a0 > 0 && a1 > 0);

        let (a0, a1) = get_amounts_for_liquidity(&env, Q96 * 12 / 10, lower, upper, liquidity);
        assert_eq!(a0, 0);
        assert!(a1 > 0);
    }

    #[test]
    fn test_rounding_up_never_below_rounding_down() {
        let env = Env::default();
        let lower = get_sqrt_ratio_at_tick(&env, -300);
        let upper = get_sqrt_ratio_at_tick(&env, 1050);

        for liquidity in [1u128, 100, 800, 1_000_003, 1 << 60] {
            let (d0, d1) = get_amounts_for_liquidity(&env, Q96, lower, upper, liquidity);
            let (u0, u1) = get_amounts_for_liquidity_rounding_up(&env, Q96, lower, upper, liquidity);
            assert!(u0 >= d0 && u0 - d0 <= 1);
            assert!(u1 >= d1 && u1 - d1 <= 1);
        }
    }

    #[test]
    fn test_liquidity_amounts_roundtrip() {
        let env = Env::default();
        let lower = get_sqrt_ratio_at_tick(&env, -100);
        let upper = get_sqrt_ratio_at_tick(&env, 510);
        let liquidity = 1_000_000_000_000_000u128;

        let (amount0, amount1) = get_amounts_for_liquidity(&env, Q96, lower, upper, liquidity);
        let recovered = get_liquidity_for_amounts(&env, Q96, lower, upper, amount0, amount1);
        assert!(recovered <= liquidity);
        assert!(liquidity - recovered <= liquidity / 1_000_000_000);
    }

    #[test]
    fn test_liquidity_for_amount0_at_extreme_prices() {
        let env = Env::default();
        // sqrt_pa * sqrt_pb no longer fits after dividing by 2^96
        let lower = get_sqrt_ratio_at_tick(&env, 400000);
        let upper = get_sqrt_ratio_at_tick(&env, 400100);
        let liquidity = get_liquidity_for_amount0(&env, lower, upper, 1);
        assert!(liquidity > 0);
    }
}
