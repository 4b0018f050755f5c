//! Single-battle simulator and best-of series.
//!
//! These are thin wrappers over [`Battle`]: build two participants, run to
//! completion, hand back the result. A call is exactly one battle (or one
//! series); nothing is retried.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arena::ArenaModifier;
use crate::battle::{Battle, BattleMode, BattleResult, Outcome, Participant, Side};
use crate::character::Character;
use crate::config::BalanceConfig;
use crate::rng::{battle_rng, mix64};

/// Options for one match.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions<'a> {
    /// Arena adjusting both stat totals.
    pub arena: Option<&'a ArenaModifier>,
    /// Rule set.
    pub mode: BattleMode,
    /// Keep the per-turn log.
    pub record_log: bool,
}

impl<'a> MatchOptions<'a> {
    /// Individual mode, no arena, no log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the arena.
    pub fn with_arena(mut self, arena: Option<&'a ArenaModifier>) -> Self {
        self.arena = arena;
        self
    }

    /// Set the rule set.
    pub fn with_mode(mut self, mode: BattleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keep the per-turn log.
    pub fn with_log(mut self) -> Self {
        self.record_log = true;
        self
    }
}

/// Run one battle between `a` and `b`.
pub fn simulate<R: Rng + ?Sized>(
    a: &Character,
    b: &Character,
    options: &MatchOptions<'_>,
    config: &BalanceConfig,
    rng: &mut R,
) -> BattleResult {
    let battle = Battle::new(
        Participant::new(a, options.arena),
        Participant::new(b, options.arena),
        options.mode,
        config,
        options.record_log,
        rng,
    );
    battle.run(rng)
}

/// Run one battle with a fresh RNG seeded from `seed`.
pub fn simulate_seeded(
    a: &Character,
    b: &Character,
    options: &MatchOptions<'_>,
    config: &BalanceConfig,
    seed: u64,
) -> BattleResult {
    simulate(a, b, options, config, &mut battle_rng(seed))
}

/// One set of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSet {
    /// One-based set number.
    pub set_number: u32,
    /// Arena the set was played in, if any.
    pub arena_id: Option<String>,
    /// Battle result.
    pub result: BattleResult,
}

/// Result of a best-of series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesResult {
    /// Requested series length.
    pub best_of: u32,
    /// Set wins of side A and side B.
    pub wins: [u32; 2],
    /// Sets in play order.
    pub sets: Vec<SeriesSet>,
    /// Series winner id, `None` if the set limit ran out first.
    pub winner_id: Option<String>,
}

/// Set wins needed and the set limit for a best-of series.
#[must_use]
pub const fn series_limits(best_of: u32) -> (u32, u32) {
    let best_of = if best_of == 0 { 1 } else { best_of };
    (best_of.div_ceil(2), best_of.saturating_mul(2))
}

/// Play sets until one side reaches `ceil(best_of / 2)` wins.
///
/// Arenas are used in rotation, one per set. Drawn sets count for nobody,
/// so the series stops after `best_of × 2` sets even without a winner.
/// Each set draws its RNG seed from `seed` and the set number.
pub fn simulate_series(
    a: &Character,
    b: &Character,
    arenas: &[&ArenaModifier],
    best_of: u32,
    mode: BattleMode,
    config: &BalanceConfig,
    seed: u64,
) -> SeriesResult {
    let best_of = best_of.max(1);
    let (wins_needed, max_sets) = series_limits(best_of);
    let mut wins = [0_u32; 2];
    let mut sets = Vec::new();

    for set_number in 1..=max_sets {
        let arena = if arenas.is_empty() {
            None
        } else {
            Some(arenas[(set_number as usize - 1) % arenas.len()])
        };
        let options = MatchOptions::new()
            .with_arena(arena)
            .with_mode(mode)
            .with_log();
        let result = simulate_seeded(
            a,
            b,
            &options,
            config,
            mix64(seed.wrapping_add(u64::from(set_number))),
        );
        match result.outcome {
            Outcome::Winner(Side::A) => wins[0] += 1,
            Outcome::Winner(Side::B) => wins[1] += 1,
            Outcome::Draw => {}
        }
        tracing::debug!(
            set = set_number,
            arena = arena.map(|x| x.id.as_str()),
            turns = result.turns,
            wins_a = wins[0],
            wins_b = wins[1],
            "Series set finished"
        );
        sets.push(SeriesSet {
            set_number,
            arena_id: arena.map(|x| x.id.clone()),
            result,
        });
        if wins[0] >= wins_needed || wins[1] >= wins_needed {
            break;
        }
    }

    let winner_id = if wins[0] >= wins_needed {
        Some(a.id.clone())
    } else if wins[1] >= wins_needed {
        Some(b.id.clone())
    } else {
        None
    };

    SeriesResult {
        best_of,
        wins,
        sets,
        winner_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;
    use crate::character::{Grade, Stats, MAX_STAT};

    fn character(id: &str, atk: u32) -> Character {
        Character::new(
            id,
            id,
            Grade::First,
            Attribute::Body,
            Stats {
                atk,
                def: 16,
                spd: 18,
                ce: 20,
                hp: 90,
                crt: 10,
                tec: 10,
                mnt: 10,
            },
        )
    }

    #[test]
    fn test_seeded_simulation_is_reproducible() {
        let a = character("a", 20);
        let b = character("b", 21);
        let options = MatchOptions::new().with_log();
        let config = BalanceConfig::default();
        let first = simulate_seeded(&a, &b, &options, &config, 99);
        let second = simulate_seeded(&a, &b, &options, &config, 99);
        assert_eq!(first, second);
        assert!(first.log.is_some());
    }

    #[test]
    fn test_log_hp_is_consistent() {
        let a = character("a", 20);
        let b = character("b", 20);
        let result = simulate_seeded(
            &a,
            &b,
            &MatchOptions::new().with_log(),
            &BalanceConfig::default(),
            5,
        );
        for record in result.log.unwrap() {
            assert_eq!(
                record.defender_hp_after,
                record.defender_hp_before.saturating_sub(record.damage)
            );
        }
    }

    #[test]
    fn test_series_limits() {
        assert_eq!(series_limits(5), (3, 10));
        assert_eq!(series_limits(4), (2, 8));
        assert_eq!(series_limits(0), (1, 2));
        assert_eq!(series_limits(u32::MAX), (u32::MAX / 2 + 1, u32::MAX));
    }

    #[test]
    fn test_max_stat_fighters_do_not_overflow() {
        let mut big = character("big", MAX_STAT);
        big.stats.def = MAX_STAT;
        big.stats.spd = MAX_STAT;
        big.stats.ce = MAX_STAT;
        big.stats.hp = MAX_STAT;
        let other = big.clone();
        for mode in [BattleMode::Individual, BattleMode::Team] {
            let result = simulate_seeded(
                &big,
                &other,
                &MatchOptions::new().with_mode(mode),
                &BalanceConfig::default(),
                1,
            );
            assert!(result.turns >= 1);
        }
    }

    #[test]
    fn test_series_stops_at_majority() {
        let strong = character("strong", 40);
        let weak = character("weak", 5);
        let arena = ArenaModifier::new("dojo", Attribute::Body, 10, Attribute::Soul, 5);
        let series = simulate_series(
            &strong,
            &weak,
            &[&arena],
            5,
            BattleMode::Individual,
            &BalanceConfig::default(),
            1,
        );
        assert_eq!(series.winner_id.as_deref(), Some("strong"));
        assert_eq!(series.wins[0], 3);
        assert_eq!(series.sets.len(), 3);
        assert!(series.sets.iter().all(|s| s.arena_id.as_deref() == Some("dojo")));
    }
}
