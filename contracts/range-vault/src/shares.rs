use crate::error::VaultError;
use crate::storage::{
    get_allowance, get_balance, get_total_supply, set_allowance, set_balance, set_total_supply,
    AllowanceValue,
};
use soroban_sdk::{Address, Env, Symbol};

pub fn mint(env: &Env, to: &Address, amount: i128) {
    set_balance(env, to, get_balance(env, to) + amount);
    set_total_supply(env, get_total_supply(env) + amount);

    env.events()
        .publish((Symbol::new(env, "mint_shares"),), (to.clone(), amount));
}

pub fn burn(env: &Env, from: &Address, amount: i128) -> Result<(), VaultError> {
    let balance = get_balance(env, from);
    if balance < amount {
        return Err(VaultError::InsufficientBalance);
    }
    set_balance(env, from, balance - amount);
    set_total_supply(env, get_total_supply(env) - amount);

    env.events()
        .publish((Symbol::new(env, "burn_shares"),), (from.clone(), amount));
    Ok(())
}

pub fn transfer(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), VaultError> {
    if amount < 0 {
        return Err(VaultError::InvalidAmount);
    }
    let balance = get_balance(env, from);
    if balance < amount {
        return Err(VaultError::InsufficientBalance);
    }
    set_balance(env, from, balance - amount);
    set_balance(env, to, get_balance(env, to) + amount);

    env.events()
        .publish((Symbol::new(env, "transfer"),), (from.clone(), to.clone(), amount));
    Ok(())
}

pub fn approve(
    env: &Env,
    from: &Address,
    spender: &Address,
    amount: i128,
    expiration_ledger: u32,
) -> Result<(), VaultError> {
    if amount < 0 {
        return Err(VaultError::InvalidAmount);
    }
    if amount > 0 && expiration_ledger < env.ledger().sequence() {
        return Err(VaultError::InvalidAmount);
    }
    set_allowance(
        env,
        from,
        spender,
        &AllowanceValue {
            amount,
            expiration_ledger,
        },
    );

    env.events().publish(
        (Symbol::new(env, "approve"),),
        (from.clone(), spender.clone(), amount, expiration_ledger),
    );
    Ok(())
}

pub fn spend_allowance(env: &Env, from: &Address, spender: &Address, amount: i128) -> Result<(), VaultError> {
    let allowance = get_allowance(env, from, spender);
    if allowance.amount < amount {
        return Err(VaultError::InsufficientAllowance);
    }
    if amount > 0 {
        set_allowance(
            env,
            from,
            spender,
            &AllowanceValue {
                amount: allowance.amount - amount,
                expiration_ledger: allowance.expiration_ledger,
            },
        );
    }
    Ok(())
}
