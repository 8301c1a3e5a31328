use soroban_sdk::{Env, U256};

/// (a * b) / denominator with a 256-bit intermediate, or None when the
/// quotient does not fit in 128 bits
pub fn checked_mul_div(env: &Env, a: u128, b: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        panic!("Division by zero");
    }
    let product = U256::from_u128(env, a).mul(&U256::from_u128(env, b));
    product.div(&U256::from_u128(env, denominator)).to_u128()
}

/// Multiply and divide with 256-bit intermediate precision (rounds down)
/// Returns (a * b) / denominator
pub fn mul_div(env: &Env, a: u128, b: u128, denominator: u128) -> u128 {
    match checked_mul_div(env, a, b, denominator) {
        Some(result) => result,
        None => panic!("U256 overflow when converting to u128"),
    }
}

/// Multiply and divide with 256-bit intermediate precision (rounds up)
/// Returns ceil((a * b) / denominator)
pub fn mul_div_rounding_up(env: &Env, a: u128, b: u128, denominator: u128) -> u128 {
    if denominator == 0 {
        panic!("Division by zero");
    }
    let product = U256::from_u128(env, a).mul(&U256::from_u128(env, b));
    let denom_256 = U256::from_u128(env, denominator);
    let mut result = product.div(&denom_256);
    if product.rem_euclid(&denom_256) > U256::from_u32(env, 0) {
        result = result.add(&U256::from_u32(env, 1));
    }
    u128_from_u256(&result)
}

/// Convert U256 to u128, panics if overflow
pub fn u128_from_u256(value: &U256) -> u128 {
    match value.to_u128() {
        Some(v) => v,
        None => panic!("U256 overflow when converting to u128"),
    }
}

/// 2^bits as a U256
pub fn pow2(env: &Env, bits: u32) -> U256 {
    U256::from_u32(env, 1).shl(bits)
}

/// Number of significant bits in `value`
pub fn bit_length(value: u128) -> u32 {
    128 - value.leading_zeros()
}

/// Unsigned division with rounding up
pub fn div_rounding_up(a: u128, b: u128) -> u128 {
    if b == 0 {
        panic!("Division by zero");
    }
    if a == 0 {
        return 0;
    }
    (a - 1) / b + 1
}
