use crate::full_math::{pow2, u128_from_u256};
use soroban_sdk::{Env, U256};

/// Convert `base_amount` of one token into the other at `sqrt_ratio_x96`.
///
/// Token1 per token0 is `sqrt^2 / 2^192`. While the squared price fits in
/// 128 bits it is used at full Q192 precision; above that it is truncated to
/// Q128 so every product stays inside 256 bits.
pub fn get_quote_at_sqrt_ratio(
    env: &Env,
    sqrt_ratio_x96: u128,
    base_amount: u128,
    base_is_token0: bool,
) -> u128 {
    match checked_quote_at_sqrt_ratio(env, sqrt_ratio_x96, base_amount, base_is_token0) {
        Some(quote) => quote,
        None => panic!("Quote overflow"),
    }
}

/// Same as [`get_quote_at_sqrt_ratio`], or None when the quote does not fit
/// in 128 bits
pub fn checked_quote_at_sqrt_ratio(
    env: &Env,
    sqrt_ratio_x96: u128,
    base_amount: u128,
    base_is_token0: bool,
) -> Option<u128> {
    let base = U256::from_u128(env, base_amount);

    if sqrt_ratio_x96 <= u64::MAX as u128 {
        let ratio_x192 = sqrt_ratio_x96 * sqrt_ratio_x96;
        if base_is_token0 {
            return U256::from_u128(env, ratio_x192)
                .mul(&base)
                .div(&pow2(env, 192))
                .to_u128();
        }
        if ratio_x192 == 0 {
            return None;
        }
        // 2^192 * base / ratio as two long-division steps of 128 and 64 bits
        let ratio = U256::from_u128(env, ratio_x192);
        let numerator = base.shl(128);
        let high = numerator.div(&ratio);
        if high > U256::from_u128(env, u64::MAX as u128) {
            return None;
        }
        let low = numerator.rem_euclid(&ratio).shl(64).div(&ratio);
        return high.shl(64).add(&low).to_u128();
    }

    let sqrt = U256::from_u128(env, sqrt_ratio_x96);
    let ratio_x128 = sqrt.mul(&sqrt).shr(64);
    if base_is_token0 {
        // ratio_x128 can exceed 128 bits: split it as high * 2^128 + low
        let q128 = pow2(env, 128);
        let high = u128_from_u256(&ratio_x128.shr(128));
        let low = ratio_x128.rem_euclid(&q128);
        let whole = base_amount.checked_mul(high)?;
        let fraction = low.mul(&base).shr(128).to_u128()?;
        whole.checked_add(fraction)
    } else {
        base.shl(128).div(&ratio_x128).to_u128()
    }
}
