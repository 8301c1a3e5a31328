use soroban_sdk::{contracttype, Env, IntoVal, TryFromVal, Val, Vec};
use vault_types::{Observation, PoolConfig, PoolState, PositionInfo, PositionKey, TickInfo};

// Each crossed tick is one more entry write on top of state and the oracle
// buffer; the host allows 50 per transaction.
pub const MAX_TICK_CROSSINGS_PER_SWAP: u32 = 40;

/// Ledger keys. `Config`, `State` and `Observations` are instance entries,
/// the rest are persistent.
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    State,
    /// Oracle ring buffer, oldest first.
    Observations,
    /// Sorted indices of ticks with nonzero gross liquidity.
    InitializedTicks,
    Tick(i32),
    Position(PositionKey),
}

const DAY_IN_LEDGERS: u32 = 17_280;
const BUMP_THRESHOLD: u32 = DAY_IN_LEDGERS;
const BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;

pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(BUMP_THRESHOLD, BUMP_AMOUNT);
}

fn read_instance<T: TryFromVal<Env, Val>>(env: &Env, key: &DataKey) -> Option<T> {
    extend_instance_ttl(env);
    env.storage().instance().get(key)
}

fn write_instance<T: IntoVal<Env, Val>>(env: &Env, key: &DataKey, value: &T) {
    env.storage().instance().set(key, value);
    extend_instance_ttl(env);
}

/// Writes a persistent entry and bumps it, or drops it when `keep` is false.
fn write_persistent<T: IntoVal<Env, Val>>(env: &Env, key: &DataKey, value: &T, keep: bool) {
    let persistent = env.storage().persistent();
    if keep {
        persistent.set(key, value);
        persistent.extend_ttl(key, BUMP_THRESHOLD, BUMP_AMOUNT);
    } else {
        persistent.remove(key);
    }
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> PoolConfig {
    read_instance(env, &DataKey::Config).expect("Pool not initialized")
}

pub fn set_config(env: &Env, config: &PoolConfig) {
    write_instance(env, &DataKey::Config, config);
}

pub fn get_state(env: &Env) -> PoolState {
    read_instance(env, &DataKey::State).expect("Pool not initialized")
}

pub fn set_state(env: &Env, state: &PoolState) {
    write_instance(env, &DataKey::State, state);
}

pub fn get_observations(env: &Env) -> Vec<Observation> {
    read_instance(env, &DataKey::Observations).unwrap_or_else(|| Vec::new(env))
}

pub fn set_observations(env: &Env, observations: &Vec<Observation>) {
    write_instance(env, &DataKey::Observations, observations);
}

pub fn get_tick(env: &Env, tick: i32) -> TickInfo {
    env.storage()
        .persistent()
        .get(&DataKey::Tick(tick))
        .unwrap_or_default()
}

pub fn set_tick(env: &Env, tick: i32, info: &TickInfo) {
    write_persistent(env, &DataKey::Tick(tick), info, info.liquidity_gross != 0);
}

pub fn get_initialized_ticks(env: &Env) -> Vec<i32> {
    env.storage()
        .persistent()
        .get(&DataKey::InitializedTicks)
        .unwrap_or_else(|| Vec::new(env))
}

pub fn set_initialized_ticks(env: &Env, ticks: &Vec<i32>) {
    write_persistent(env, &DataKey::InitializedTicks, ticks, true);
}

pub fn get_position(env: &Env, key: &PositionKey) -> PositionInfo {
    env.storage()
        .persistent()
        .get(&DataKey::Position(key.clone()))
        .unwrap_or_default()
}

pub fn set_position(env: &Env, key: &PositionKey, info: &PositionInfo) {
    // Fully settled positions are dropped so the next read starts clean.
    let live = info.liquidity != 0 || info.tokens_owed_0 != 0 || info.tokens_owed_1 != 0;
    write_persistent(env, &DataKey::Position(key.clone()), info, live);
}
