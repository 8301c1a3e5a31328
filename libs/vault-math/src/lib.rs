#![no_std]

pub mod full_math;
pub mod liquidity_math;
pub mod quote;
pub mod sqrt_price_math;
pub mod swap_math;
pub mod tick_math;

pub use full_math::*;
pub use liquidity_math::*;
pub use quote::*;
pub use sqrt_price_math::*;
pub use swap_math::*;
pub use tick_math::*;
