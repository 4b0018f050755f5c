//! Determinism testing utilities.
//!
//! Provides a harness for verifying that battles replay identically
//! given identical inputs and seeds.
//!
//! # Testing Strategy
//!
//! Balance numbers are only comparable across runs if every battle is a
//! pure function of its inputs and seed. Sources of non-determinism
//! include:
//!
//! - **Ambient randomness**: every draw must come from the injected RNG.
//! - **HashMap iteration order**: rosters iterate in list order only.
//! - **Thread scheduling**: batch trials derive their own seeds, so the
//!   result must not depend on which worker ran which trial.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: a single strike or battle replays from a seed
//! 2. **Property tests**: random stats still produce deterministic outcomes
//! 3. **Parallel tests**: running N battles on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use duel_core::battle::{Battle, BattleMode, Participant};
use duel_core::character::Character;
use duel_core::config::BalanceConfig;
use duel_core::rng::{battle_rng, BattleRng};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps taken per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stepped process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute a state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..steps {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Battle paired with the RNG that drives it.
pub struct SeededBattle<'c> {
    /// Battle state.
    pub battle: Battle<'c>,
    /// RNG consumed by every step.
    pub rng: BattleRng,
}

/// Set up a logged battle between `a` and `b` from `seed`.
#[must_use]
pub fn seeded_battle<'c>(
    a: &Character,
    b: &Character,
    mode: BattleMode,
    config: &'c BalanceConfig,
    seed: u64,
) -> SeededBattle<'c> {
    let mut rng = battle_rng(seed);
    let battle = Battle::new(
        Participant::new(a, None),
        Participant::new(b, None),
        mode,
        config,
        true,
        &mut rng,
    );
    SeededBattle { battle, rng }
}

/// Replay one battle `runs` times, stepping it to completion.
#[must_use]
pub fn verify_battle_determinism(
    a: &Character,
    b: &Character,
    config: &BalanceConfig,
    seed: u64,
    runs: usize,
) -> DeterminismResult {
    let cap = u64::from(BattleMode::Individual.turn_limit(&config.battle));
    verify_determinism(
        runs,
        cap,
        || seeded_battle(a, b, BattleMode::Individual, config, seed),
        |s| {
            s.battle.step(&mut s.rng);
        },
        |s| s.battle.state_hash(),
    )
}

/// Run the same seeded battle on `threads` threads and collect result hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_parallel_battles(
    a: &Character,
    b: &Character,
    config: &BalanceConfig,
    seed: u64,
    threads: usize,
) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    let SeededBattle { battle, mut rng } =
                        seeded_battle(a, b, BattleMode::Individual, config, seed);
                    compute_hash(&battle.run(&mut rng))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps: u64::from(config.battle.turn_cap),
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for combat inputs.
pub mod strategies {
    use duel_core::attributes::Attribute;
    use duel_core::character::{Character, Grade, Stats};
    use proptest::prelude::*;

    /// Any of the six attributes.
    pub fn arb_attribute() -> impl Strategy<Value = Attribute> {
        prop::sample::select(Attribute::ALL.to_vec())
    }

    /// Stats in the range seen across real rosters, with some headroom.
    ///
    /// `ce` is zero about one time in five to cover the CE0 archetype.
    pub fn arb_stats() -> impl Strategy<Value = Stats> {
        (
            (0u32..60, 0u32..60, 0u32..60),
            prop_oneof![1 => Just(0u32), 4 => 1u32..60],
            (1u32..300, 0u32..60, 0u32..60, 0u32..60),
        )
            .prop_map(|((atk, def, spd), ce, (hp, crt, tec, mnt))| Stats {
                atk,
                def,
                spd,
                ce,
                hp,
                crt,
                tec,
                mnt,
            })
    }

    /// A character with arbitrary stats and attribute.
    pub fn arb_character(id: &'static str) -> impl Strategy<Value = Character> {
        (arb_attribute(), arb_stats())
            .prop_map(move |(attribute, stats)| Character::new(id, id, Grade::First, attribute, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::special_grade_six;
    use proptest::prelude::*;

    #[test]
    fn test_battle_replays_from_seed() {
        let roster = special_grade_six();
        let config = BalanceConfig::default();
        let result = verify_battle_determinism(
            &roster.characters()[0],
            &roster.characters()[1],
            &config,
            42,
            5,
        );
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_parallel_battles_match() {
        let roster = special_grade_six();
        let config = BalanceConfig::default();
        run_parallel_battles(
            &roster.characters()[2],
            &roster.characters()[3],
            &config,
            7,
            4,
        )
        .assert_deterministic();
    }

    #[test]
    fn test_different_seeds_can_differ() {
        let roster = special_grade_six();
        let config = BalanceConfig::default();
        let a = &roster.characters()[0];
        let b = &roster.characters()[1];
        let hashes: Vec<u64> = (0..20)
            .map(|seed| {
                let SeededBattle { battle, mut rng } =
                    seeded_battle(a, b, BattleMode::Individual, &config, seed);
                compute_hash(&battle.run(&mut rng))
            })
            .collect();
        let mut unique = hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        assert!(unique.len() > 1);
    }

    proptest! {
        /// Arbitrary stat lines still replay identically.
        #[test]
        fn prop_random_stats_are_deterministic(
            a in strategies::arb_character("a"),
            b in strategies::arb_character("b"),
            seed in any::<u64>(),
        ) {
            let config = BalanceConfig::default();
            let result = verify_battle_determinism(&a, &b, &config, seed, 2);
            prop_assert!(result.is_deterministic);
        }
    }
}
