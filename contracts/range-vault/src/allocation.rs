//! Splitting token balances across the tight and wide ranges
//!
//! Each range's cost is measured once, at the current price, for a fixed
//! reference amount of liquidity. Balances are then divided between the two
//! ranges in proportion to those costs. That gives both ranges the same
//! binding token and keeps their liquidity in the configured ratio whichever
//! side of either range the price sits on.

use crate::error::VaultError;
use soroban_sdk::Env;
use vault_math::{
    div_rounding_up, get_amounts_for_liquidity_rounding_up, get_liquidity_for_amounts,
    checked_quote_at_sqrt_ratio, mul_div,
};
use vault_types::{RangeBounds, VaultConfig};

/// Wide liquidity the unit costs are measured at. Large enough that the
/// rounded costs carry many significant digits.
pub const REFERENCE_LIQUIDITY: u128 = 1 << 64;

/// Leftover balances at or below this are not worth a swap
pub const DUST: u128 = 100;

/// Token cost of `REFERENCE_LIQUIDITY` wide liquidity plus the matching
/// tight liquidity, per range
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitCosts {
    pub tight0: u128,
    pub tight1: u128,
    pub wide0: u128,
    pub wide1: u128,
}

impl UnitCosts {
    pub fn total0(&self) -> u128 {
        self.tight0 + self.wide0
    }

    pub fn total1(&self) -> u128 {
        self.tight1 + self.wide1
    }
}

fn cost(env: &Env, range: &RangeBounds, sqrt_price_x96: u128, liquidity: u128) -> (u128, u128) {
    get_amounts_for_liquidity_rounding_up(
        env,
        sqrt_price_x96,
        range.sqrt_ratio_lower_x96,
        range.sqrt_ratio_upper_x96,
        liquidity,
    )
}

pub fn unit_costs(env: &Env, config: &VaultConfig, sqrt_price_x96: u128) -> UnitCosts {
    let tight_liquidity = REFERENCE_LIQUIDITY * config.liquidity_ratio as u128;
    let (tight0, tight1) = cost(env, &config.tight, sqrt_price_x96, tight_liquidity);
    let (wide0, wide1) = cost(env, &config.wide, sqrt_price_x96, REFERENCE_LIQUIDITY);
    UnitCosts {
        tight0,
        tight1,
        wide0,
        wide1,
    }
}

/// Part of `amount` owed to a range costing `part` out of `total`
fn share(env: &Env, amount: u128, part: u128, total: u128) -> u128 {
    if total == 0 {
        0
    } else {
        mul_div(env, amount, part, total)
    }
}

/// Largest (tight, wide) liquidity pair the balances can pay for
pub fn allocate(
    env: &Env,
    config: &VaultConfig,
    sqrt_price_x96: u128,
    amount0: u128,
    amount1: u128,
) -> (u128, u128) {
    let costs = unit_costs(env, config, sqrt_price_x96);

    let tight0 = share(env, amount0, costs.tight0, costs.total0());
    let tight1 = share(env, amount1, costs.tight1, costs.total1());

    let tight = liquidity_for(env, &config.tight, sqrt_price_x96, tight0, tight1);
    let wide = liquidity_for(env, &config.wide, sqrt_price_x96, amount0 - tight0, amount1 - tight1);

    cap_to_ratio(tight, wide, config.liquidity_ratio)
}

fn liquidity_for(env: &Env, range: &RangeBounds, sqrt_price_x96: u128, amount0: u128, amount1: u128) -> u128 {
    get_liquidity_for_amounts(
        env,
        sqrt_price_x96,
        range.sqrt_ratio_lower_x96,
        range.sqrt_ratio_upper_x96,
        amount0,
        amount1,
    )
}

/// Round the pair down until tight never exceeds `ratio` times wide
pub fn cap_to_ratio(tight: u128, wide: u128, ratio: u32) -> (u128, u128) {
    let ratio = ratio as u128;
    let tight = tight.min(wide.saturating_mul(ratio));
    let wide = wide.min(div_rounding_up(tight, ratio));
    (tight, wide)
}

/// Swap that moves leftover balances to the token mix both ranges consume
///
/// Values both balances in token1 and targets the share of that value the
/// unit costs put in token1. Returns `(zero_for_one, amount_in)`, or `None`
/// when the correction is dust. Fails with `LiquidityOverflow` when the
/// balances cannot be valued in 128 bits at this price.
pub fn rebalancing_swap(
    env: &Env,
    config: &VaultConfig,
    sqrt_price_x96: u128,
    amount0: u128,
    amount1: u128,
) -> Result<Option<(bool, u128)>, VaultError> {
    if amount0 <= DUST && amount1 <= DUST {
        return Ok(None);
    }
    let quote = |amount: u128, base_is_token0: bool| {
        checked_quote_at_sqrt_ratio(env, sqrt_price_x96, amount, base_is_token0)
            .ok_or(VaultError::LiquidityOverflow)
    };

    let costs = unit_costs(env, config, sqrt_price_x96);
    let cost_in_token1 = quote(costs.total0(), true)?
        .checked_add(costs.total1())
        .ok_or(VaultError::LiquidityOverflow)?;
    if cost_in_token1 == 0 {
        return Ok(None);
    }

    let value = quote(amount0, true)?
        .checked_add(amount1)
        .ok_or(VaultError::LiquidityOverflow)?;
    let target1 = mul_div(env, value, costs.total1(), cost_in_token1);

    let (zero_for_one, amount_in) = if target1 > amount1 {
        let amount_in = quote(target1 - amount1, false)?;
        (true, amount_in.min(amount0))
    } else {
        (false, amount1 - target1)
    };

    if amount_in <= DUST {
        Ok(None)
    } else {
        Ok(Some((zero_for_one, amount_in)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::testutils::Address as _;
    use soroban_sdk::{Address, String};
    use vault_math::get_sqrt_ratio_at_tick;
    use vault_types::MAX_SQRT_RATIO;

    const RATIO: u32 = 8;

    fn range(env: &Env, tick_lower: i32, tick_upper: i32) -> RangeBounds {
        RangeBounds {
            tick_lower,
            tick_upper,
            sqrt_ratio_lower_x96: get_sqrt_ratio_at_tick(env, tick_lower),
            sqrt_ratio_upper_x96: get_sqrt_ratio_at_tick(env, tick_upper),
        }
    }

    fn config(env: &Env) -> VaultConfig {
        VaultConfig {
            pool: Address::generate(env),
            token0: Address::generate(env),
            token1: Address::generate(env),
            tight: range(env, -100, 510),
            wide: range(env, -300, 1050),
            liquidity_ratio: RATIO,
            max_tick_movement: 100,
            name: String::from_str(env, "Range Vault"),
            symbol: String::from_str(env, "RV"),
        }
    }

    /// Wide liquidity straight from the unit costs, without splitting
    fn closed_form_wide(env: &Env, costs: &UnitCosts, amount0: u128, amount1: u128) -> u128 {
        let by0 = (costs.total0() > 0).then(|| mul_div(env, amount0, REFERENCE_LIQUIDITY, costs.total0()));
        let by1 = (costs.total1() > 0).then(|| mul_div(env, amount1, REFERENCE_LIQUIDITY, costs.total1()));
        match (by0, by1) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => 0,
        }
    }

    fn check_allocation(tick: i32, amount0: u128, amount1: u128) {
        let env = Env::default();
        let config = config(&env);
        let sqrt_price = get_sqrt_ratio_at_tick(&env, tick);

        let (tight, wide) = allocate(&env, &config, sqrt_price, amount0, amount1);
        assert!(wide > 0, "tick {}: nothing allocated", tick);
        assert!(tight <= wide * RATIO as u128, "tick {}: tight above ratio", tick);
        assert!(tight + RATIO as u128 > wide * RATIO as u128 - RATIO as u128, "tick {}: tight below ratio", tick);

        let costs = unit_costs(&env, &config, sqrt_price);
        let expected = closed_form_wide(&env, &costs, amount0, amount1);
        let tolerance = expected / 1_000_000 + 2;
        assert!(
            wide.abs_diff(expected) <= tolerance,
            "tick {}: wide {} vs closed form {}",
            tick,
            wide,
            expected
        );

        let (tight0, tight1) = cost(&env, &config.tight, sqrt_price, tight);
        let (wide0, wide1) = cost(&env, &config.wide, sqrt_price, wide);
        assert!(tight0 + wide0 <= amount0, "tick {}: token0 overspent", tick);
        assert!(tight1 + wide1 <= amount1, "tick {}: token1 overspent", tick);
    }

    #[test]
    fn test_allocate_price_inside_both_ranges() {
        check_allocation(0, 1_000_000_000_000, 1_000_000_000_000);
        check_allocation(200, 3_000_000_000, 1_000_000_000_000);
    }

    #[test]
    fn test_allocate_price_above_tight_inside_wide() {
        check_allocation(700, 1_000_000_000_000, 1_000_000_000_000);
    }

    #[test]
    fn test_allocate_price_below_tight_inside_wide() {
        check_allocation(-200, 1_000_000_000_000, 1_000_000_000_000);
    }

    #[test]
    fn test_allocate_price_outside_both_ranges() {
        check_allocation(2_000, 0, 1_000_000_000_000);
        check_allocation(-1_000, 1_000_000_000_000, 0);
    }

    #[test]
    fn test_allocate_price_on_range_boundaries() {
        for tick in [-300, -100, 510, 1050] {
            check_allocation(tick, 1_000_000_000_000, 1_000_000_000_000);
        }
    }

    #[test]
    fn test_allocate_single_token_inside_range_is_empty() {
        let env = Env::default();
        let config = config(&env);
        let sqrt_price = get_sqrt_ratio_at_tick(&env, 0);
        assert_eq!(allocate(&env, &config, sqrt_price, 1_000_000, 0), (0, 0));
    }

    #[test]
    fn test_cap_to_ratio() {
        assert_eq!(cap_to_ratio(800, 100, 8), (800, 100));
        assert_eq!(cap_to_ratio(900, 100, 8), (800, 100));
        assert_eq!(cap_to_ratio(790, 100, 8), (790, 99));
        assert_eq!(cap_to_ratio(5, 0, 8), (0, 0));
    }

    #[test]
    fn test_swap_half_of_lone_token_at_symmetric_costs() {
        let env = Env::default();
        let mut config = config(&env);
        config.tight = range(&env, -500, 500);
        config.wide = range(&env, -1000, 1000);
        let sqrt_price = get_sqrt_ratio_at_tick(&env, 0);

        let (zero_for_one, amount) = rebalancing_swap(&env, &config, sqrt_price, 1_000_000, 0).unwrap().unwrap();
        assert!(zero_for_one);
        assert!(amount.abs_diff(500_000) <= 1);

        let (zero_for_one, amount) = rebalancing_swap(&env, &config, sqrt_price, 0, 1_000_000).unwrap().unwrap();
        assert!(!zero_for_one);
        assert!(amount.abs_diff(500_000) <= 1);
    }

    #[test]
    fn test_swap_converts_everything_when_one_token_unused() {
        let env = Env::default();
        let config = config(&env);
        // above both ranges only token1 is consumed
        let sqrt_price = get_sqrt_ratio_at_tick(&env, 2_000);
        let (zero_for_one, amount) = rebalancing_swap(&env, &config, sqrt_price, 1_000_000, 5_000).unwrap().unwrap();
        assert!(zero_for_one);
        assert!(amount.abs_diff(1_000_000) <= 1);
    }

    #[test]
    fn test_swap_skips_dust() {
        let env = Env::default();
        let config = config(&env);
        let sqrt_price = get_sqrt_ratio_at_tick(&env, 0);
        assert_eq!(rebalancing_swap(&env, &config, sqrt_price, DUST, DUST), Ok(None));
    }

    #[test]
    fn test_swap_sizing_overflow_is_an_error() {
        let env = Env::default();
        let config = config(&env);
        // above both ranges, where a token0 balance this large has no token1 value in 128 bits
        let sqrt_price = MAX_SQRT_RATIO - 1;
        assert_eq!(
            rebalancing_swap(&env, &config, sqrt_price, u128::MAX / 2, 0),
            Err(VaultError::LiquidityOverflow)
        );
    }
}
