use crate::storage::{get_initialized_ticks, get_tick, set_initialized_ticks, set_tick};
use soroban_sdk::Env;
use vault_types::{MAX_TICK, MIN_TICK};

/// Update a tick with liquidity delta
/// Returns true if the tick was flipped (initialized or uninitialized)
pub fn update(
    env: &Env,
    tick: i32,
    tick_current: i32,
    liquidity_delta: i128,
    fee_growth_global_0_x64: u128,
    fee_growth_global_1_x64: u128,
    upper: bool,
    max_liquidity: u128,
) -> bool {
    let mut info = get_tick(env, tick);

    let liquidity_gross_before = info.liquidity_gross;
    let liquidity_gross_after = vault_math::add_delta(liquidity_gross_before, liquidity_delta);

    if liquidity_gross_after > max_liquidity {
        panic!("Liquidity overflow");
    }

    let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

    if liquidity_gross_before == 0 {
        // by convention all growth before initialization happened below the tick
        if tick <= tick_current {
            info.fee_growth_outside_0_x64 = fee_growth_global_0_x64;
            info.fee_growth_outside_1_x64 = fee_growth_global_1_x64;
        }
        info.initialized = true;
    }

    info.liquidity_gross = liquidity_gross_after;
    info.liquidity_net = if upper {
        info.liquidity_net - liquidity_delta
    } else {
        info.liquidity_net + liquidity_delta
    };

    set_tick(env, tick, &info);

    if flipped {
        if liquidity_gross_after == 0 {
            remove_initialized(env, tick);
        } else {
            insert_initialized(env, tick);
        }
    }

    flipped
}

/// Cross a tick during a swap
/// Returns the liquidity_net stored at the tick
pub fn cross(
    env: &Env,
    tick: i32,
    fee_growth_global_0_x64: u128,
    fee_growth_global_1_x64: u128,
) -> i128 {
    let mut info = get_tick(env, tick);

    info.fee_growth_outside_0_x64 = fee_growth_global_0_x64.wrapping_sub(info.fee_growth_outside_0_x64);
    info.fee_growth_outside_1_x64 = fee_growth_global_1_x64.wrapping_sub(info.fee_growth_outside_1_x64);

    set_tick(env, tick, &info);

    info.liquidity_net
}

/// Get fee growth inside a tick range
/// The accumulators wrap, so only differences between them are meaningful
pub fn get_fee_growth_inside(
    env: &Env,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    fee_growth_global_0_x64: u128,
    fee_growth_global_1_x64: u128,
) -> (u128, u128) {
    let lower = get_tick(env, tick_lower);
    let upper = get_tick(env, tick_upper);

    let (below_0, below_1) = if tick_current >= tick_lower {
        (lower.fee_growth_outside_0_x64, lower.fee_growth_outside_1_x64)
    } else {
        (
            fee_growth_global_0_x64.wrapping_sub(lower.fee_growth_outside_0_x64),
            fee_growth_global_1_x64.wrapping_sub(lower.fee_growth_outside_1_x64),
        )
    };

    let (above_0, above_1) = if tick_current < tick_upper {
        (upper.fee_growth_outside_0_x64, upper.fee_growth_outside_1_x64)
    } else {
        (
            fee_growth_global_0_x64.wrapping_sub(upper.fee_growth_outside_0_x64),
            fee_growth_global_1_x64.wrapping_sub(upper.fee_growth_outside_1_x64),
        )
    };

    (
        fee_growth_global_0_x64.wrapping_sub(below_0).wrapping_sub(above_0),
        fee_growth_global_1_x64.wrapping_sub(below_1).wrapping_sub(above_1),
    )
}

// === Initialized tick index ===
// A sorted vector replaces the word bitmap: a vault pool only ever holds a
// handful of initialized ticks.

fn insert_initialized(env: &Env, tick: i32) {
    let mut ticks = get_initialized_ticks(env);
    if let Err(index) = ticks.binary_search(tick) {
        ticks.insert(index, tick);
        set_initialized_ticks(env, &ticks);
    }
}

fn remove_initialized(env: &Env, tick: i32) {
    let mut ticks = get_initialized_ticks(env);
    if let Ok(index) = ticks.binary_search(tick) {
        ticks.remove(index);
        set_initialized_ticks(env, &ticks);
    }
}

/// Next initialized tick in the swap direction
/// With `lte` the search includes `tick` itself and moves left, otherwise it
/// starts strictly right of `tick`. Falls back to the tick bound when the
/// index is exhausted, reported as not initialized.
pub fn next_initialized_tick(env: &Env, tick: i32, lte: bool) -> (i32, bool) {
    let ticks = get_initialized_ticks(env);

    if lte {
        let index = match ticks.binary_search(tick) {
            Ok(_) => return (tick, true),
            Err(i) => i,
        };
        if index == 0 {
            (MIN_TICK, false)
        } else {
            (ticks.get_unchecked(index - 1), true)
        }
    } else {
        let index = match ticks.binary_search(tick) {
            Ok(i) => i + 1,
            Err(i) => i,
        };
        if index < ticks.len() {
            (ticks.get_unchecked(index), true)
        } else {
            (MAX_TICK, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::set_tick;
    use soroban_sdk::Env;
    use vault_types::TickInfo;

    fn with_contract<F, R>(env: &Env, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let contract_id = env.register(crate::ClmmPool, ());
        env.as_contract(&contract_id, f)
    }

    #[test]
    fn test_update_initializes_and_indexes_tick() {
        let env = Env::default();
        with_contract(&env, || {
            let flipped = update(&env, 100, 0, 1000, 0, 0, false, u128::MAX);
            assert!(flipped);

            let info = get_tick(&env, 100);
            assert!(info.initialized);
            assert_eq!(info.liquidity_gross, 1000);
            assert_eq!(info.liquidity_net, 1000);
            assert_eq!(next_initialized_tick(&env, 0, false), (100, true));
        });
    }

    #[test]
    fn test_update_upper_tick_subtracts_net() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, 100, 0, 1000, 0, 0, true, u128::MAX);
            let flipped = update(&env, 100, 0, 500, 0, 0, true, u128::MAX);
            assert!(!flipped);

            let info = get_tick(&env, 100);
            assert_eq!(info.liquidity_gross, 1500);
            assert_eq!(info.liquidity_net, -1500);
        });
    }

    #[test]
    fn test_update_remove_all_liquidity_clears_index() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, 0, 0, 1000, 0, 0, false, u128::MAX);
            assert!(!update(&env, 0, 0, -400, 0, 0, false, u128::MAX));
            assert!(update(&env, 0, 0, -600, 0, 0, false, u128::MAX));

            assert_eq!(get_tick(&env, 0).liquidity_gross, 0);
            assert_eq!(next_initialized_tick(&env, 0, true), (MIN_TICK, false));
        });
    }

    #[test]
    fn test_update_fee_growth_initialized_only_at_or_below_current() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, -100, 0, 1000, 1000, 2000, false, u128::MAX);
            update(&env, 100, 0, 1000, 1000, 2000, true, u128::MAX);

            let below = get_tick(&env, -100);
            assert_eq!(below.fee_growth_outside_0_x64, 1000);
            assert_eq!(below.fee_growth_outside_1_x64, 2000);

            let above = get_tick(&env, 100);
            assert_eq!(above.fee_growth_outside_0_x64, 0);
            assert_eq!(above.fee_growth_outside_1_x64, 0);
        });
    }

    #[test]
    #[should_panic(expected = "Liquidity overflow")]
    fn test_update_exceeds_max_liquidity() {
        let env = Env::default();
        with_contract(&env, || {
            update(&env, 0, 0, 2000, 0, 0, false, 1000);
        });
    }

    #[test]
    fn test_cross_flips_fee_growth_with_wrapping() {
        let env = Env::default();
        with_contract(&env, || {
            let info = TickInfo {
                liquidity_gross: 1000,
                liquidity_net: -750,
                fee_growth_outside_0_x64: 100,
                fee_growth_outside_1_x64: 200,
                initialized: true,
            };
            set_tick(&env, 0, &info);

            // global accumulator wrapped past zero since the tick was set
            let liquidity_net = cross(&env, 0, 50, 2000);
            assert_eq!(liquidity_net, -750);

            let crossed = get_tick(&env, 0);
            assert_eq!(crossed.fee_growth_outside_0_x64, u128::MAX - 49);
            assert_eq!(crossed.fee_growth_outside_1_x64, 1800);
        });
    }

    #[test]
    fn test_get_fee_growth_inside_by_price_position() {
        let env = Env::default();
        with_contract(&env, || {
            let lower = TickInfo {
                liquidity_gross: 1000,
                liquidity_net: 1000,
                fee_growth_outside_0_x64: 100,
                fee_growth_outside_1_x64: 200,
                initialized: true,
            };
            let upper = TickInfo {
                liquidity_gross: 1000,
                liquidity_net: -1000,
                fee_growth_outside_0_x64: 50,
                fee_growth_outside_1_x64: 100,
                initialized: true,
            };
            set_tick(&env, -100, &lower);
            set_tick(&env, 100, &upper);

            // inside: global - below - above
            assert_eq!(
                get_fee_growth_inside(&env, -100, 100, 0, 1000, 2000),
                (1000 - 100 - 50, 2000 - 200 - 100)
            );
            // below the range: lower outside counts growth above the lower tick
            assert_eq!(
                get_fee_growth_inside(&env, -100, 100, -200, 1000, 2000),
                (100 - 50, 200 - 100)
            );
            // above the range: upper outside counts growth below the upper tick
            assert_eq!(
                get_fee_growth_inside(&env, -100, 100, 200, 1000, 2000),
                (50u128.wrapping_sub(100), 100u128.wrapping_sub(200))
            );
        });
    }

    #[test]
    fn test_next_initialized_tick_search() {
        let env = Env::default();
        with_contract(&env, || {
            for tick in [-300, -100, 510, 1050] {
                update(&env, tick, 0, 10, 0, 0, false, u128::MAX);
            }

            assert_eq!(next_initialized_tick(&env, 0, true), (-100, true));
            assert_eq!(next_initialized_tick(&env, -100, true), (-100, true));
            assert_eq!(next_initialized_tick(&env, -101, true), (-300, true));
            assert_eq!(next_initialized_tick(&env, -301, true), (MIN_TICK, false));

            assert_eq!(next_initialized_tick(&env, 0, false), (510, true));
            assert_eq!(next_initialized_tick(&env, 510, false), (1050, true));
            assert_eq!(next_initialized_tick(&env, 1050, false), (MAX_TICK, false));
            assert_eq!(next_initialized_tick(&env, -1000, false), (-300, true));
        });
    }
}
