#![no_std]

mod allocation;
mod error;
mod shares;
mod storage;
mod venue;


pub use error::VaultError;

use soroban_sdk::{
    contract, contractimpl, log, panic_with_error, token, vec, Address, Env, String, Symbol,
};
use storage::{get_config, get_ledger, get_pauser, set_config, set_ledger, set_pauser};
use vault_math::{
    checked_mul_div, get_amounts_for_liquidity, get_amounts_for_liquidity_rounding_up,
    get_sqrt_ratio_at_tick,
};
use vault_types::{
    LiquidityLedger, RangeBounds, RangePosition, RebalanceSummary, VaultConfig, VaultParams,
    MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK,
};

/// Shares minted to the vault itself by `initialize`. Nobody can move
/// them, so the share price can never be reset by draining the supply.
pub const SEED_SHARES: i128 = 100;

/// Wide liquidity deposited by `initialize`; tight gets `liquidity_ratio` times more
pub const SEED_LIQUIDITY: u128 = 100;

/// Lookback of the average tick the rebalance guard compares against
pub const TWAP_WINDOW: u32 = 300;

/// Dual range liquidity vault
///
/// Keeps capital in a tight and a wide range of one pool, tracks the
/// liquidity it deposited itself, and issues fungible shares against it.
#[contract]
pub struct RangeVault;

#[contractimpl]
impl RangeVault {
    pub fn __constructor(env: Env, params: VaultParams) {
        let pool = venue::pool_config(&env, &params.pool);

        let ranges_valid = [
            (params.tight_lower, params.tight_upper),
            (params.wide_lower, params.wide_upper),
        ]
        .iter()
        .all(|&(lower, upper)| {
            lower < upper
                && lower >= MIN_TICK
                && upper <= MAX_TICK
                && lower % pool.tick_spacing == 0
                && upper % pool.tick_spacing == 0
        });
        if !ranges_valid || params.liquidity_ratio == 0 || params.max_tick_movement <= 0 {
            panic_with_error!(&env, VaultError::InvalidConfig);
        }

        let config = VaultConfig {
            pool: params.pool,
            token0: pool.token0,
            token1: pool.token1,
            tight: range_bounds(&env, params.tight_lower, params.tight_upper),
            wide: range_bounds(&env, params.wide_lower, params.wide_upper),
            liquidity_ratio: params.liquidity_ratio,
            max_tick_movement: params.max_tick_movement,
            name: params.name,
            symbol: params.symbol,
        };
        set_config(&env, &config);
        set_pauser(&env, &params.pauser);
    }

    /// Seed both ranges from `from` and lock the seed shares in the vault
    ///
    /// # Returns
    /// (amount0, amount1) - Tokens paid by `from`
    pub fn initialize(env: Env, from: Address) -> Result<(u128, u128), VaultError> {
        from.require_auth();

        let mut ledger = get_ledger(&env);
        if ledger.tight != 0 || ledger.wide != 0 {
            return Err(VaultError::AlreadyInitialized);
        }

        let config = get_config(&env);
        let tight = SEED_LIQUIDITY * config.liquidity_ratio as u128;
        let (tight0, tight1) = venue::mint(&env, &config.pool, &config.tight, &from, tight);
        let (wide0, wide1) = venue::mint(&env, &config.pool, &config.wide, &from, SEED_LIQUIDITY);

        ledger.tight = tight;
        ledger.wide = SEED_LIQUIDITY;
        set_ledger(&env, &ledger);
        shares::mint(&env, &env.current_contract_address(), SEED_SHARES);

        let amounts = (tight0 + wide0, tight1 + wide1);
        env.events()
            .publish((Symbol::new(&env, "initialize"),), (from, amounts.0, amounts.1));
        Ok(amounts)
    }

    /// Deposit for `shares` new shares
    ///
    /// Liquidity is added to both ranges in the vault's current tight:wide
    /// proportion and paid by `from`.
    ///
    /// # Returns
    /// (amount0, amount1) - Tokens paid by `from`
    pub fn mint(
        env: Env,
        from: Address,
        shares: i128,
        amount0_max: u128,
        amount1_max: u128,
    ) -> Result<(u128, u128), VaultError> {
        from.require_auth();
        require_not_paused(&env)?;
        if shares <= 0 {
            return Err(VaultError::InvalidAmount);
        }

        let mut ledger = active_ledger(&env)?;
        let (tight, wide) = proportional_liquidity(&env, shares, &ledger)?;
        if tight == 0 && wide == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let config = get_config(&env);

        let mut amount0 = 0;
        let mut amount1 = 0;
        for (range, liquidity) in [(&config.tight, tight), (&config.wide, wide)] {
            if liquidity > 0 {
                let (paid0, paid1) = venue::mint(&env, &config.pool, range, &from, liquidity);
                amount0 += paid0;
                amount1 += paid1;
            }
        }
        if amount0 > amount0_max || amount1 > amount1_max {
            return Err(VaultError::Slippage);
        }

        ledger.tight = ledger.tight.checked_add(tight).ok_or(VaultError::LiquidityOverflow)?;
        ledger.wide = ledger.wide.checked_add(wide).ok_or(VaultError::LiquidityOverflow)?;
        set_ledger(&env, &ledger);
        shares::mint(&env, &from, shares);

        env.events().publish(
            (Symbol::new(&env, "deposit"),),
            (from, shares, amount0, amount1),
        );
        Ok((amount0, amount1))
    }

    /// Redeem `shares` for their part of both ranges, paid to `recipient`
    ///
    /// Never paused. Shares are burned before the pool is called.
    ///
    /// # Returns
    /// (amount0, amount1) - Tokens sent to `recipient`
    pub fn burn(
        env: Env,
        from: Address,
        shares: i128,
        amount0_min: u128,
        amount1_min: u128,
        recipient: Address,
    ) -> Result<(u128, u128), VaultError> {
        from.require_auth();
        if shares <= 0 {
            return Err(VaultError::InvalidAmount);
        }

        let mut ledger = active_ledger(&env)?;
        let (tight, wide) = proportional_liquidity(&env, shares, &ledger)?;
        shares::burn(&env, &from, shares)?;

        let config = get_config(&env);
        let mut amount0 = 0;
        let mut amount1 = 0;
        for (range, liquidity) in [(&config.tight, tight), (&config.wide, wide)] {
            if liquidity > 0 {
                let (owed0, owed1) = venue::burn(&env, &config.pool, range, liquidity);
                let (paid0, paid1) = venue::collect(&env, &config.pool, range, &recipient, owed0, owed1);
                amount0 += paid0;
                amount1 += paid1;
            }
        }
        if amount0 < amount0_min || amount1 < amount1_min {
            return Err(VaultError::Slippage);
        }

        ledger.tight -= tight;
        ledger.wide -= wide;
        set_ledger(&env, &ledger);

        env.events().publish(
            (Symbol::new(&env, "withdraw"),),
            (from, recipient, shares, amount0, amount1),
        );
        Ok((amount0, amount1))
    }

    /// Harvest fees and redeploy every token the vault holds into both ranges
    pub fn rebalance(env: Env) -> Result<RebalanceSummary, VaultError> {
        require_not_paused(&env)?;

        // ranges become active only through `initialize`
        let mut ledger = active_ledger(&env)?;
        let config = get_config(&env);
        let vault = env.current_contract_address();
        let mut summary = RebalanceSummary::default();

        for range in [&config.tight, &config.wide] {
            venue::burn(&env, &config.pool, range, 0);
            let (fees0, fees1) = venue::collect(&env, &config.pool, range, &vault, u128::MAX, u128::MAX);
            summary.fees0 += fees0;
            summary.fees1 += fees1;
        }

        let sqrt_price_x96 = require_minimal_price_movement(&env, &config)?;

        let mut balance0 = token::Client::new(&env, &config.token0).balance(&vault) as u128;
        let mut balance1 = token::Client::new(&env, &config.token1).balance(&vault) as u128;

        deposit_balances(&env, &config, sqrt_price_x96, &mut balance0, &mut balance1, &mut summary);

        let sqrt_price_x96 = match allocation::rebalancing_swap(&env, &config, sqrt_price_x96, balance0, balance1)? {
            Some((zero_for_one, amount_in)) => {
                let sqrt_price_limit_x96 = if zero_for_one {
                    MIN_SQRT_RATIO + 1
                } else {
                    MAX_SQRT_RATIO - 1
                };
                let (delta0, delta1) =
                    venue::swap(&env, &config, zero_for_one, amount_in, sqrt_price_limit_x96);
                balance0 = (balance0 as i128 - delta0) as u128;
                balance1 = (balance1 as i128 - delta1) as u128;
                log!(&env, "rebalance swap", zero_for_one, amount_in, delta0, delta1);
                venue::slot0(&env, &config.pool).0
            }
            None => sqrt_price_x96,
        };

        deposit_balances(&env, &config, sqrt_price_x96, &mut balance0, &mut balance1, &mut summary);

        ledger.tight = ledger
            .tight
            .checked_add(summary.tight_added)
            .ok_or(VaultError::LiquidityOverflow)?;
        ledger.wide = ledger
            .wide
            .checked_add(summary.wide_added)
            .ok_or(VaultError::LiquidityOverflow)?;
        set_ledger(&env, &ledger);

        summary.leftover0 = balance0;
        summary.leftover1 = balance1;
        env.events()
            .publish((Symbol::new(&env, "rebalance"),), summary.clone());
        Ok(summary)
    }

    // === Previews ===

    /// Tokens `mint` would charge for `shares` at the current price
    pub fn preview_mint(env: Env, shares: i128) -> Result<(u128, u128), VaultError> {
        preview(&env, shares, true)
    }

    /// Tokens `burn` would pay out for `shares` at the current price
    pub fn preview_burn(env: Env, shares: i128) -> Result<(u128, u128), VaultError> {
        preview(&env, shares, false)
    }

    // === Positions ===

    pub fn tight_position(env: Env) -> RangePosition {
        let config = get_config(&env);
        position(&env, &config, &config.tight, get_ledger(&env).tight)
    }

    pub fn wide_position(env: Env) -> RangePosition {
        let config = get_config(&env);
        position(&env, &config, &config.wide, get_ledger(&env).wide)
    }

    /// Token amounts held across both ranges, fees not yet harvested excluded
    pub fn total_position(env: Env) -> (u128, u128) {
        let config = get_config(&env);
        let ledger = get_ledger(&env);
        let tight = position(&env, &config, &config.tight, ledger.tight);
        let wide = position(&env, &config, &config.wide, ledger.wide);
        (tight.amount0 + wide.amount0, tight.amount1 + wide.amount1)
    }

    /// Liquidity this vault has deposited into each range
    pub fn liquidity(env: Env) -> LiquidityLedger {
        get_ledger(&env)
    }

    pub fn config(env: Env) -> VaultConfig {
        get_config(&env)
    }

    // === Pause ===

    /// Block or unblock `mint` and `rebalance`. Withdrawals stay open.
    pub fn set_paused(env: Env, caller: Address, paused: bool) -> Result<(), VaultError> {
        caller.require_auth();
        if caller != get_pauser(&env) {
            return Err(VaultError::Unauthorized);
        }
        storage::set_paused(&env, paused);

        env.events()
            .publish((Symbol::new(&env, "paused"),), (caller, paused));
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    pub fn pauser(env: Env) -> Address {
        get_pauser(&env)
    }

    // === Share token ===

    pub fn balance(env: Env, id: Address) -> i128 {
        storage::get_balance(&env, &id)
    }

    pub fn total_supply(env: Env) -> i128 {
        storage::get_total_supply(&env)
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), VaultError> {
        from.require_auth();
        shares::transfer(&env, &from, &to, amount)
    }

    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), VaultError> {
        spender.require_auth();
        if amount < 0 {
            return Err(VaultError::InvalidAmount);
        }
        shares::spend_allowance(&env, &from, &spender, amount)?;
        shares::transfer(&env, &from, &to, amount)
    }

    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), VaultError> {
        from.require_auth();
        shares::approve(&env, &from, &spender, amount, expiration_ledger)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        storage::get_allowance(&env, &from, &spender).amount
    }

    pub fn decimals(_env: Env) -> u32 {
        7
    }

    pub fn name(env: Env) -> String {
        get_config(&env).name
    }

    pub fn symbol(env: Env) -> String {
        get_config(&env).symbol
    }
}

fn range_bounds(env: &Env, tick_lower: i32, tick_upper: i32) -> RangeBounds {
    RangeBounds {
        tick_lower,
        tick_upper,
        sqrt_ratio_lower_x96: get_sqrt_ratio_at_tick(env, tick_lower),
        sqrt_ratio_upper_x96: get_sqrt_ratio_at_tick(env, tick_upper),
    }
}

fn require_not_paused(env: &Env) -> Result<(), VaultError> {
    if storage::is_paused(env) {
        Err(VaultError::Paused)
    } else {
        Ok(())
    }
}

/// Ledger of a vault whose ranges have both been seeded
fn active_ledger(env: &Env) -> Result<LiquidityLedger, VaultError> {
    let ledger = get_ledger(env);
    if ledger.tight == 0 || ledger.wide == 0 {
        return Err(VaultError::NotInitialized);
    }
    Ok(ledger)
}

/// Liquidity per range matching `shares` out of the current supply
fn proportional_liquidity(env: &Env, shares: i128, ledger: &LiquidityLedger) -> Result<(u128, u128), VaultError> {
    let total_supply = storage::get_total_supply(env) as u128;
    let shares = shares as u128;
    let tight = checked_mul_div(env, shares, ledger.tight, total_supply).ok_or(VaultError::LiquidityOverflow)?;
    let wide = checked_mul_div(env, shares, ledger.wide, total_supply).ok_or(VaultError::LiquidityOverflow)?;
    Ok((tight, wide))
}

/// Refuse to redeploy capital while the spot tick is far from the
/// `TWAP_WINDOW` average. Returns the spot sqrt price.
fn require_minimal_price_movement(env: &Env, config: &VaultConfig) -> Result<u128, VaultError> {
    let (sqrt_price_x96, tick) = venue::slot0(env, &config.pool);
    let cumulatives = venue::observe(env, &config.pool, vec![env, TWAP_WINDOW, 0]);
    let elapsed = cumulatives.get_unchecked(1) - cumulatives.get_unchecked(0);
    let average_tick = elapsed / TWAP_WINDOW as i64;

    if (tick as i64 - average_tick).abs() >= config.max_tick_movement as i64 {
        log!(env, "price moved", tick, average_tick);
        return Err(VaultError::Slippage);
    }
    Ok(sqrt_price_x96)
}

/// Mint as much of the vault's balances into both ranges as the ratio allows
fn deposit_balances(
    env: &Env,
    config: &VaultConfig,
    sqrt_price_x96: u128,
    balance0: &mut u128,
    balance1: &mut u128,
    summary: &mut RebalanceSummary,
) {
    let (tight, wide) = allocation::allocate(env, config, sqrt_price_x96, *balance0, *balance1);
    for (range, liquidity) in [(&config.tight, tight), (&config.wide, wide)] {
        if liquidity > 0 {
            let (paid0, paid1) = venue::mint_from_vault(env, config, range, sqrt_price_x96, liquidity);
            *balance0 -= paid0;
            *balance1 -= paid1;
        }
    }
    summary.tight_added += tight;
    summary.wide_added += wide;
}

fn preview(env: &Env, shares: i128, minting: bool) -> Result<(u128, u128), VaultError> {
    if shares <= 0 {
        return Err(VaultError::InvalidAmount);
    }
    let ledger = active_ledger(env)?;
    let (tight, wide) = proportional_liquidity(env, shares, &ledger)?;
    let config = get_config(env);
    let (sqrt_price_x96, _) = venue::slot0(env, &config.pool);

    let mut amount0 = 0;
    let mut amount1 = 0;
    for (range, liquidity) in [(&config.tight, tight), (&config.wide, wide)] {
        let (a0, a1) = if minting {
            get_amounts_for_liquidity_rounding_up(
                env,
                sqrt_price_x96,
                range.sqrt_ratio_lower_x96,
                range.sqrt_ratio_upper_x96,
                liquidity,
            )
        } else {
            get_amounts_for_liquidity(
                env,
                sqrt_price_x96,
                range.sqrt_ratio_lower_x96,
                range.sqrt_ratio_upper_x96,
                liquidity,
            )
        };
        amount0 += a0;
        amount1 += a1;
    }
    Ok((amount0, amount1))
}

fn position(env: &Env, config: &VaultConfig, range: &RangeBounds, liquidity: u128) -> RangePosition {
    let (sqrt_price_x96, _) = venue::slot0(env, &config.pool);
    let (amount0, amount1) = get_amounts_for_liquidity(
        env,
        sqrt_price_x96,
        range.sqrt_ratio_lower_x96,
        range.sqrt_ratio_upper_x96,
        liquidity,
    );
    RangePosition {
        liquidity,
        amount0,
        amount1,
    }
}
