use crate::full_math::pow2;
use soroban_sdk::{Env, U256};
use vault_types::{MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK};

/// sqrt(1.0001^-(2^i)) in Q128, for i = 0..19
const SQRT_1_0001_POW2_X128: [u128; 19] = [
    0xfffcb933bd6fad37aa2d162d1a594001,
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
];

/// Calculate sqrt(1.0001^tick) * 2^96, rounded up
pub fn get_sqrt_ratio_at_tick(env: &Env, tick: i32) -> u128 {
    if tick < MIN_TICK || tick > MAX_TICK {
        panic!("Tick out of bounds");
    }

    let abs_tick = tick.unsigned_abs();
    let q128 = pow2(env, 128);

    // product of the factors for every set bit, computed for -|tick|
    let mut ratio = q128.clone();
    for (bit, factor) in SQRT_1_0001_POW2_X128.iter().enumerate() {
        if abs_tick & (1 << bit) != 0 {
            ratio = ratio.mul(&U256::from_u128(env, *factor)).div(&q128);
        }
    }

    if tick > 0 {
        let max = U256::from_parts(env, u64::MAX, u64::MAX, u64::MAX, u64::MAX);
        ratio = max.div(&ratio);
    }

    // Q128 -> Q96
    let shift = pow2(env, 32);
    let mut result = ratio.div(&shift);
    if ratio.rem_euclid(&shift) > U256::from_u32(env, 0) {
        result = result.add(&U256::from_u32(env, 1));
    }

    result
        .to_u128()
        .unwrap_or(u128::MAX)
        .clamp(MIN_SQRT_RATIO, MAX_SQRT_RATIO)
}

/// Greatest tick whose sqrt ratio is at or below `sqrt_price_x96`
pub fn get_tick_at_sqrt_ratio(env: &Env, sqrt_price_x96: u128) -> i32 {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        panic!("sqrt price out of bounds");
    }

    let mut low = MIN_TICK;
    let mut high = MAX_TICK;
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_ratio_at_tick(env, mid) <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    low
}
