//! Calls into the concentrated liquidity pool
//!
//! The pool pulls payment with a plain `transfer(payer, pool, amount)` that
//! the payer must authorize. Users authorize their own transfers through the
//! invocation tree of the vault call. When the vault itself pays it
//! pre-authorizes exactly the transfers the pool is about to make.

use soroban_sdk::auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation};
use soroban_sdk::{vec, Address, Env, IntoVal, Symbol, Vec};
use vault_math::get_amounts_for_liquidity_rounding_up;
use vault_types::{PoolConfig, RangeBounds, VaultConfig};

pub fn pool_config(env: &Env, pool: &Address) -> PoolConfig {
    env.invoke_contract(pool, &Symbol::new(env, "get_config"), ().into_val(env))
}

/// Current sqrt price and tick
pub fn slot0(env: &Env, pool: &Address) -> (u128, i32) {
    env.invoke_contract(pool, &Symbol::new(env, "slot0"), ().into_val(env))
}

pub fn observe(env: &Env, pool: &Address, seconds_agos: Vec<u32>) -> Vec<i64> {
    env.invoke_contract(pool, &Symbol::new(env, "observe"), (seconds_agos,).into_val(env))
}

/// Add liquidity to the vault's position in `range`, paid by `payer`
pub fn mint(
    env: &Env,
    pool: &Address,
    range: &RangeBounds,
    payer: &Address,
    liquidity: u128,
) -> (u128, u128) {
    let vault = env.current_contract_address();
    env.invoke_contract(
        pool,
        &Symbol::new(env, "mint"),
        (vault, payer.clone(), range.tick_lower, range.tick_upper, liquidity).into_val(env),
    )
}

/// Remove liquidity from the vault's position, leaving the tokens owed
pub fn burn(env: &Env, pool: &Address, range: &RangeBounds, liquidity: u128) -> (u128, u128) {
    let vault = env.current_contract_address();
    env.invoke_contract(
        pool,
        &Symbol::new(env, "burn"),
        (vault, range.tick_lower, range.tick_upper, liquidity).into_val(env),
    )
}

pub fn collect(
    env: &Env,
    pool: &Address,
    range: &RangeBounds,
    recipient: &Address,
    amount0_max: u128,
    amount1_max: u128,
) -> (u128, u128) {
    let vault = env.current_contract_address();
    env.invoke_contract(
        pool,
        &Symbol::new(env, "collect"),
        (
            vault,
            recipient.clone(),
            range.tick_lower,
            range.tick_upper,
            amount0_max,
            amount1_max,
        )
            .into_val(env),
    )
}

/// Add liquidity paid from the vault's own balance
/// The pool charges the rounded up amounts at the current price, which are
/// computed here so exactly those transfers can be authorized.
pub fn mint_from_vault(
    env: &Env,
    config: &VaultConfig,
    range: &RangeBounds,
    sqrt_price_x96: u128,
    liquidity: u128,
) -> (u128, u128) {
    let (owed0, owed1) = get_amounts_for_liquidity_rounding_up(
        env,
        sqrt_price_x96,
        range.sqrt_ratio_lower_x96,
        range.sqrt_ratio_upper_x96,
        liquidity,
    );
    authorize_transfers(
        env,
        &config.pool,
        &[(&config.token0, owed0), (&config.token1, owed1)],
    );
    mint(env, &config.pool, range, &env.current_contract_address(), liquidity)
}

/// Exact input swap paid from the vault's balance
///
/// The pool is asked for the deltas first so the vault authorizes exactly
/// the input it will take, which is less than `amount_in` when the swap
/// stops at the limit or the pool's crossing cap.
pub fn swap(
    env: &Env,
    config: &VaultConfig,
    zero_for_one: bool,
    amount_in: u128,
    sqrt_price_limit_x96: u128,
) -> (i128, i128) {
    let vault = env.current_contract_address();
    let args = (zero_for_one, amount_in as i128, sqrt_price_limit_x96);
    let (quoted0, quoted1): (i128, i128) =
        env.invoke_contract(&config.pool, &Symbol::new(env, "quote_swap"), args.into_val(env));

    let (token_in, paid) = if zero_for_one {
        (&config.token0, quoted0)
    } else {
        (&config.token1, quoted1)
    };
    authorize_transfers(env, &config.pool, &[(token_in, paid.max(0) as u128)]);
    env.invoke_contract(
        &config.pool,
        &Symbol::new(env, "swap"),
        (vault.clone(), vault, zero_for_one, amount_in as i128, sqrt_price_limit_x96).into_val(env),
    )
}

/// Authorize the pool to pull each `(token, amount)` from the vault during
/// the next call. Zero amounts are never transferred and get no entry.
fn authorize_transfers(env: &Env, pool: &Address, transfers: &[(&Address, u128)]) {
    let vault = env.current_contract_address();
    let mut entries: Vec<InvokerContractAuthEntry> = vec![env];
    for (token, amount) in transfers {
        if *amount == 0 {
            continue;
        }
        entries.push_back(InvokerContractAuthEntry::Contract(SubContractInvocation {
            context: ContractContext {
                contract: (*token).clone(),
                fn_name: Symbol::new(env, "transfer"),
                args: (vault.clone(), pool.clone(), *amount as i128).into_val(env),
            },
            sub_invocations: vec![env],
        }));
    }
    if !entries.is_empty() {
        env.authorize_as_current_contract(entries);
    }
}
