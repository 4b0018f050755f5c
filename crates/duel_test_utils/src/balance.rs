//! Head-to-head helpers for balance assertions in tests.
//!
//! Runs many seeded duels between two characters and tallies the results
//! without going through the batch evaluator.

use duel_core::battle::{Outcome, Side};
use duel_core::character::Character;
use duel_core::config::BalanceConfig;
use duel_core::rng::derive_seed;
use duel_core::simulator::{simulate_seeded, MatchOptions};

/// Tally of a head-to-head run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadToHead {
    /// Duels played.
    pub total: u32,
    /// Wins for the first character.
    pub wins_a: u32,
    /// Wins for the second character.
    pub wins_b: u32,
    /// Equal HP at the turn cap.
    pub draws: u32,
    /// Average turns per duel.
    pub avg_turns: f64,
}

impl HeadToHead {
    /// Win rate of the first character, draws counting half (0.5 when empty).
    #[must_use]
    pub fn win_rate_a(&self) -> f64 {
        if self.total == 0 {
            return 0.5;
        }
        (f64::from(self.wins_a) + 0.5 * f64::from(self.draws)) / f64::from(self.total)
    }

    /// Win rate of the second character, draws counting half (0.5 when empty).
    #[must_use]
    pub fn win_rate_b(&self) -> f64 {
        1.0 - self.win_rate_a()
    }

    /// Check whether the first character's rate lies in `[min_rate, max_rate]`.
    #[must_use]
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.win_rate_a();
        rate >= min_rate && rate <= max_rate
    }
}

/// Run `trials` seeded duels of `a` against `b`.
#[must_use]
pub fn head_to_head(
    a: &Character,
    b: &Character,
    trials: u32,
    seed: u64,
    options: &MatchOptions<'_>,
    config: &BalanceConfig,
) -> HeadToHead {
    let mut stats = HeadToHead::default();
    let mut turns = 0_u64;
    for trial in 0..trials {
        let result = simulate_seeded(a, b, options, config, derive_seed(seed, 0, 1, trial));
        match result.outcome {
            Outcome::Winner(Side::A) => stats.wins_a += 1,
            Outcome::Winner(Side::B) => stats.wins_b += 1,
            Outcome::Draw => stats.draws += 1,
        }
        turns += u64::from(result.turns);
    }
    stats.total = trials;
    if trials > 0 {
        stats.avg_turns = turns as f64 / f64::from(trials);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{character, stats};
    use duel_core::attributes::Attribute;
    use duel_core::character::Grade;

    #[test]
    fn test_empty_tally_is_even() {
        let tally = HeadToHead::default();
        assert_eq!(tally.win_rate_a(), 0.5);
        assert!(tally.is_balanced(0.45, 0.55));
    }

    #[test]
    fn test_draws_count_half() {
        let tally = HeadToHead {
            total: 4,
            wins_a: 1,
            wins_b: 1,
            draws: 2,
            avg_turns: 10.0,
        };
        assert_eq!(tally.win_rate_a(), 0.5);
    }

    #[test]
    fn test_mirror_match_is_close_to_even() {
        let a = character("a", Grade::First, Attribute::Body, stats(20, 16, 18, 20, 90));
        let b = character("b", Grade::First, Attribute::Body, stats(20, 16, 18, 20, 90));
        let tally = head_to_head(&a, &b, 2000, 17, &MatchOptions::new(), &BalanceConfig::default());
        assert_eq!(tally.total, 2000);
        assert!(tally.is_balanced(0.4, 0.6), "rate {}", tally.win_rate_a());
        assert!(tally.avg_turns > 0.0 && tally.avg_turns <= 30.0);
    }
}
