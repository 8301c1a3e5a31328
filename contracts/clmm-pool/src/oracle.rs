use crate::storage::{get_observations, set_observations};
use soroban_sdk::{Env, Vec};
use vault_types::Observation;

/// Entries kept in the ring buffer. At one write per ledger close this
/// covers well over the 5 minute window the vault reads.
pub const OBSERVATION_CAPACITY: u32 = 64;

pub fn initialize(env: &Env) {
    let mut observations = Vec::new(env);
    observations.push_back(Observation {
        timestamp: env.ledger().timestamp(),
        tick_cumulative: 0,
    });
    set_observations(env, &observations);
}

fn transform(last: &Observation, timestamp: u64, tick: i32) -> Observation {
    let elapsed = (timestamp - last.timestamp) as i64;
    Observation {
        timestamp,
        tick_cumulative: last.tick_cumulative + tick as i64 * elapsed,
    }
}

/// Record `tick` as the price that held since the last observation
/// At most one entry is written per timestamp.
pub fn write(env: &Env, tick: i32) {
    let now = env.ledger().timestamp();
    let mut observations = get_observations(env);
    let last = match observations.last() {
        Some(last) => last,
        None => panic!("Oracle not initialized"),
    };
    if last.timestamp == now {
        return;
    }

    observations.push_back(transform(&last, now, tick));
    if observations.len() > OBSERVATION_CAPACITY {
        observations.pop_front();
    }
    set_observations(env, &observations);
}

/// Tick cumulatives at each `seconds_ago` before now
pub fn observe(env: &Env, tick_current: i32, seconds_agos: &Vec<u32>) -> Vec<i64> {
    let now = env.ledger().timestamp();
    let observations = get_observations(env);
    let mut cumulatives = Vec::new(env);
    for seconds_ago in seconds_agos.iter() {
        cumulatives.push_back(observe_single(&observations, now, tick_current, seconds_ago));
    }
    cumulatives
}

fn observe_single(observations: &Vec<Observation>, now: u64, tick_current: i32, seconds_ago: u32) -> i64 {
    let target = match now.checked_sub(seconds_ago as u64) {
        Some(target) => target,
        None => panic!("Observation too old"),
    };

    let last = match observations.last() {
        Some(last) => last,
        None => panic!("Oracle not initialized"),
    };
    if target >= last.timestamp {
        return transform(&last, target, tick_current).tick_cumulative;
    }

    let oldest = observations.get_unchecked(0);
    if target < oldest.timestamp {
        panic!("Observation too old");
    }

    // newest entry at or before the target, interpolating towards its successor
    let mut index = observations.len() - 1;
    loop {
        index -= 1;
        let before = observations.get_unchecked(index);
        if before.timestamp <= target {
            if before.timestamp == target {
                return before.tick_cumulative;
            }
            let after = observations.get_unchecked(index + 1);
            let span = (after.timestamp - before.timestamp) as i64;
            let offset = (target - before.timestamp) as i64;
            return before.tick_cumulative
                + (after.tick_cumulative - before.tick_cumulative) / span * offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::testutils::Ledger;
    use soroban_sdk::{vec, Env};

    fn with_contract<F, R>(env: &Env, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let contract_id = env.register(crate::ClmmPool, ());
        env.as_contract(&contract_id, f)
    }

    #[test]
    fn test_observe_extrapolates_from_latest() {
        let env = Env::default();
        env.ledger().set_timestamp(1_000);
        with_contract(&env, || {
            initialize(&env);
            env.ledger().set_timestamp(1_600);

            let cumulatives = observe(&env, 20, &vec![&env, 300u32, 0]);
            assert_eq!(cumulatives, vec![&env, 20 * 300i64, 20 * 600]);
        });
    }

    #[test]
    fn test_observe_interpolates_between_entries() {
        let env = Env::default();
        env.ledger().set_timestamp(1_000);
        with_contract(&env, || {
            initialize(&env);

            // tick 10 held for 100s, then tick -50
            env.ledger().set_timestamp(1_100);
            write(&env, 10);
            env.ledger().set_timestamp(1_300);
            write(&env, -50);
            env.ledger().set_timestamp(1_400);

            let cumulatives = observe(&env, 7, &vec![&env, 350u32, 300, 200, 0]);
            assert_eq!(
                cumulatives,
                vec![&env, 500i64, 1_000, 1_000 - 50 * 100, 1_000 - 50 * 200 + 7 * 100]
            );
        });
    }

    #[test]
    fn test_write_once_per_timestamp() {
        let env = Env::default();
        env.ledger().set_timestamp(1_000);
        with_contract(&env, || {
            initialize(&env);
            env.ledger().set_timestamp(1_010);
            write(&env, 5);
            write(&env, 99);
            assert_eq!(get_observations(&env).len(), 2);
            assert_eq!(get_observations(&env).get_unchecked(1).tick_cumulative, 50);
        });
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let env = Env::default();
        env.ledger().set_timestamp(1_000);
        with_contract(&env, || {
            initialize(&env);
            for i in 1..=(OBSERVATION_CAPACITY as u64 + 5) {
                env.ledger().set_timestamp(1_000 + i);
                write(&env, 1);
            }
            let observations = get_observations(&env);
            assert_eq!(observations.len(), OBSERVATION_CAPACITY);
            assert_eq!(observations.get_unchecked(0).timestamp, 1_006);
        });
    }

    #[test]
    #[should_panic(expected = "Observation too old")]
    fn test_observe_before_history() {
        let env = Env::default();
        env.ledger().set_timestamp(1_000);
        with_contract(&env, || {
            initialize(&env);
            env.ledger().set_timestamp(1_100);
            observe(&env, 0, &vec![&env, 300u32]);
        });
    }
}
