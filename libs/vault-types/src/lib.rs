#![no_std]

mod pool;
mod vault;

pub use pool::*;
pub use vault::*;

/// Binary point of sqrt prices
pub const Q96: u128 = 1 << 96;

/// Binary point of per-liquidity fee growth
pub const Q64: u128 = 1 << 64;

/// Tick bounds. A sqrt price in Q64.96 held in a u128 reaches 2^128 a
/// little past 443636, so the tick space is symmetric around that.
pub const MIN_TICK: i32 = -443636;
pub const MAX_TICK: i32 = 443636;

/// sqrt price at MIN_TICK
pub const MIN_SQRT_RATIO: u128 = 18447090764788882728;

/// sqrt price at MAX_TICK
pub const MAX_SQRT_RATIO: u128 = 340275971719517849884101479065584693834;

/// Swap fee in millionths of the input amount
pub type Fee = u32;

/// Fee tiers a pool can be created with, and the tick spacing of each
pub const FEE_TIERS: [(Fee, i32); 3] = [(500, 10), (3000, 60), (10000, 200)];

/// Tick spacing of a supported fee tier
pub fn fee_to_tick_spacing(fee: Fee) -> i32 {
    match FEE_TIERS.iter().find(|(tier, _)| *tier == fee) {
        Some((_, spacing)) => *spacing,
        None => panic!("Invalid fee"),
    }
}

/// Per-tick gross liquidity cap, so that summing every usable tick of a
/// spacing can never overflow the active liquidity
pub fn max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let lowest = MIN_TICK / tick_spacing;
    let highest = MAX_TICK / tick_spacing;
    u128::MAX / (highest - lowest + 1) as u128
}
