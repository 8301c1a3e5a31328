use soroban_sdk::{contracttype, Address, Env};
use vault_types::{LiquidityLedger, VaultConfig};

/// Storage keys for the vault contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Immutable ranges and pool wiring (Instance storage)
    Config,
    /// Address allowed to toggle the pause flag (Instance storage)
    Pauser,
    /// Pause flag gating mint and rebalance (Instance storage)
    Paused,
    /// Liquidity this vault has deposited per range (Instance storage)
    Ledger,
    /// Share supply (Instance storage)
    TotalSupply,
    /// Share balance per holder (Persistent storage)
    Balance(Address),
    /// Share allowance per (owner, spender) (Temporary storage)
    Allowance(AllowanceKey),
}

#[contracttype]
#[derive(Clone)]
pub struct AllowanceKey {
    pub from: Address,
    pub spender: Address,
}

#[contracttype]
#[derive(Clone)]
pub struct AllowanceValue {
    pub amount: i128,
    pub expiration_ledger: u32,
}

const INSTANCE_TTL_THRESHOLD: u32 = 17280; // ~1 day
const INSTANCE_TTL_EXTEND: u32 = 518400; // ~30 days
const BALANCE_TTL_THRESHOLD: u32 = 17280;
const BALANCE_TTL_EXTEND: u32 = 518400;

pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

// === Config ===

pub fn get_config(env: &Env) -> VaultConfig {
    extend_instance_ttl(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("Vault not constructed")
}

pub fn set_config(env: &Env, config: &VaultConfig) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn get_pauser(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Pauser)
        .expect("Vault not constructed")
}

pub fn set_pauser(env: &Env, pauser: &Address) {
    env.storage().instance().set(&DataKey::Pauser, pauser);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
}

// === Position ledger ===

pub fn get_ledger(env: &Env) -> LiquidityLedger {
    env.storage()
        .instance()
        .get(&DataKey::Ledger)
        .unwrap_or_default()
}

pub fn set_ledger(env: &Env, ledger: &LiquidityLedger) {
    env.storage().instance().set(&DataKey::Ledger, ledger);
}

// === Shares ===

pub fn get_total_supply(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalSupply)
        .unwrap_or(0)
}

pub fn set_total_supply(env: &Env, supply: i128) {
    env.storage().instance().set(&DataKey::TotalSupply, &supply);
}

pub fn get_balance(env: &Env, owner: &Address) -> i128 {
    let key = DataKey::Balance(owner.clone());
    match env.storage().persistent().get::<_, i128>(&key) {
        Some(balance) => {
            env.storage()
                .persistent()
                .extend_ttl(&key, BALANCE_TTL_THRESHOLD, BALANCE_TTL_EXTEND);
            balance
        }
        None => 0,
    }
}

pub fn set_balance(env: &Env, owner: &Address, balance: i128) {
    let key = DataKey::Balance(owner.clone());
    if balance == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &balance);
        env.storage()
            .persistent()
            .extend_ttl(&key, BALANCE_TTL_THRESHOLD, BALANCE_TTL_EXTEND);
    }
}

pub fn get_allowance(env: &Env, from: &Address, spender: &Address) -> AllowanceValue {
    let key = DataKey::Allowance(AllowanceKey {
        from: from.clone(),
        spender: spender.clone(),
    });
    match env.storage().temporary().get::<_, AllowanceValue>(&key) {
        Some(allowance) if allowance.expiration_ledger >= env.ledger().sequence() => allowance,
        _ => AllowanceValue {
            amount: 0,
            expiration_ledger: 0,
        },
    }
}

pub fn set_allowance(env: &Env, from: &Address, spender: &Address, allowance: &AllowanceValue) {
    let key = DataKey::Allowance(AllowanceKey {
        from: from.clone(),
        spender: spender.clone(),
    });
    env.storage().temporary().set(&key, allowance);
    if allowance.amount > 0 {
        let live_for = allowance
            .expiration_ledger
            .saturating_sub(env.ledger().sequence());
        env.storage().temporary().extend_ttl(&key, live_for, live_for);
    }
}
