//! Per-pair battle metrics for balance analysis.
//!
//! Every pair of the batch accumulates one [`PairMetrics`]. Workers fill
//! their own local copies and the copies are merged once at the end.

use duel_core::battle::{BattleResult, Decision, Outcome, Side};
use serde::{Deserialize, Serialize};

/// Counters for all trials of one ordered pair `(a, b)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairMetrics {
    /// Trials played.
    pub trials: u32,
    /// Wins of the first-listed character.
    pub wins_a: u32,
    /// Wins of the second-listed character.
    pub wins_b: u32,
    /// Drawn trials.
    pub draws: u32,
    /// Sum of turns over all trials.
    pub total_turns: u64,
    /// Trials decided by remaining HP at the turn cap.
    pub turn_cap_decisions: u32,
    /// Trials in which `a` struck first.
    pub a_struck_first: u32,
    /// Ultimates used by both sides.
    pub ultimates: u64,
    /// Skills used by both sides.
    pub skills: u64,
    /// Critical hits by both sides.
    pub crits: u64,
}

impl PairMetrics {
    /// Fold one battle result into the counters.
    pub fn record(&mut self, result: &BattleResult) {
        self.trials += 1;
        match result.outcome {
            Outcome::Winner(Side::A) => self.wins_a += 1,
            Outcome::Winner(Side::B) => self.wins_b += 1,
            Outcome::Draw => self.draws += 1,
        }
        self.total_turns += u64::from(result.turns);
        if result.decision == Decision::TurnCap {
            self.turn_cap_decisions += 1;
        }
        if result.first_striker == Side::A {
            self.a_struck_first += 1;
        }
        for tally in &result.tallies {
            self.ultimates += u64::from(tally.ultimates);
            self.skills += u64::from(tally.skills);
            self.crits += u64::from(tally.crits);
        }
    }

    /// Combine two partial counters for the same pair.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            trials: self.trials + other.trials,
            wins_a: self.wins_a + other.wins_a,
            wins_b: self.wins_b + other.wins_b,
            draws: self.draws + other.draws,
            total_turns: self.total_turns + other.total_turns,
            turn_cap_decisions: self.turn_cap_decisions + other.turn_cap_decisions,
            a_struck_first: self.a_struck_first + other.a_struck_first,
            ultimates: self.ultimates + other.ultimates,
            skills: self.skills + other.skills,
            crits: self.crits + other.crits,
        }
    }

    /// Share of trials `a` won, draws counting half. `None` with no trials.
    #[must_use]
    pub fn win_rate_a(&self) -> Option<f64> {
        if self.trials == 0 {
            return None;
        }
        Some((f64::from(self.wins_a) + 0.5 * f64::from(self.draws)) / f64::from(self.trials))
    }

    /// Mean battle length in turns.
    #[must_use]
    pub fn avg_turns(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.total_turns as f64 / f64::from(self.trials)
    }

    /// Share of trials that went the distance.
    #[must_use]
    pub fn turn_cap_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        f64::from(self.turn_cap_decisions) / f64::from(self.trials)
    }
}

/// One evaluated pair of the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    /// Roster position of the first character.
    pub i: usize,
    /// Roster position of the second character.
    pub j: usize,
    /// Id of the first character.
    pub a: String,
    /// Id of the second character.
    pub b: String,
    /// Accumulated counters.
    pub metrics: PairMetrics,
}

/// Aggregate statistics over every battle of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Pairs evaluated.
    pub pairs: u32,
    /// Battles played.
    pub total_battles: u64,
    /// Drawn battles.
    pub draws: u64,
    /// Mean battle length in turns.
    pub avg_turns: f64,
    /// Share of battles decided at the turn cap.
    pub turn_cap_rate: f64,
    /// Share of battles won by the side that struck first.
    pub first_striker_win_rate: f64,
    /// Mean ultimates per battle.
    pub ultimates_per_battle: f64,
    /// Mean critical hits per battle.
    pub crits_per_battle: f64,
}

impl BatchSummary {
    /// Calculate summary from per-pair records.
    ///
    /// The first-striker rate is an estimate: a pair where `a` always strikes
    /// first contributes its `a` wins, otherwise its `b` wins, and coin-flip
    /// pairs contribute half of their decisive battles.
    #[must_use]
    pub fn from_pairs(pairs: &[PairRecord]) -> Self {
        let total = pairs.iter().fold(PairMetrics::default(), |acc, p| {
            acc.merge(p.metrics)
        });
        if total.trials == 0 {
            return Self::default();
        }

        let first_striker_wins: f64 = pairs
            .iter()
            .map(|p| {
                let m = &p.metrics;
                if m.a_struck_first == m.trials {
                    f64::from(m.wins_a)
                } else if m.a_struck_first == 0 {
                    f64::from(m.wins_b)
                } else {
                    f64::from(m.wins_a + m.wins_b) / 2.0
                }
            })
            .sum();

        let battles = f64::from(total.trials);
        Self {
            pairs: pairs.len() as u32,
            total_battles: u64::from(total.trials),
            draws: u64::from(total.draws),
            avg_turns: total.avg_turns(),
            turn_cap_rate: total.turn_cap_rate(),
            first_striker_win_rate: first_striker_wins / battles,
            ultimates_per_battle: total.ultimates as f64 / battles,
            crits_per_battle: total.crits as f64 / battles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::battle::ActionTally;

    fn result(outcome: Outcome, decision: Decision, turns: u32) -> BattleResult {
        BattleResult {
            outcome,
            winner_id: None,
            decision,
            turns,
            first_striker: Side::A,
            final_hp: [0, 0],
            tallies: [
                ActionTally {
                    ultimates: 2,
                    crits: 1,
                    ..Default::default()
                },
                ActionTally {
                    skills: 3,
                    ..Default::default()
                },
            ],
            log: None,
        }
    }

    #[test]
    fn test_record_counts_outcomes() {
        let mut m = PairMetrics::default();
        m.record(&result(Outcome::Winner(Side::A), Decision::Knockout, 10));
        m.record(&result(Outcome::Winner(Side::B), Decision::Knockout, 12));
        m.record(&result(Outcome::Draw, Decision::TurnCap, 30));

        assert_eq!(m.trials, 3);
        assert_eq!((m.wins_a, m.wins_b, m.draws), (1, 1, 1));
        assert_eq!(m.turn_cap_decisions, 1);
        assert_eq!(m.ultimates, 6);
        assert_eq!(m.skills, 9);
        assert_eq!(m.crits, 3);
        assert!((m.avg_turns() - 52.0 / 3.0).abs() < 1e-9);
        assert!((m.win_rate_a().unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_metrics_have_no_rate() {
        let m = PairMetrics::default();
        assert_eq!(m.win_rate_a(), None);
        assert_eq!(m.avg_turns(), 0.0);
    }

    #[test]
    fn test_merge_is_sum() {
        let mut left = PairMetrics::default();
        left.record(&result(Outcome::Winner(Side::A), Decision::Knockout, 8));
        let mut right = PairMetrics::default();
        right.record(&result(Outcome::Winner(Side::A), Decision::Knockout, 9));
        right.record(&result(Outcome::Winner(Side::B), Decision::TurnCap, 30));

        let merged = left.merge(right);
        assert_eq!(merged.trials, 3);
        assert_eq!(merged.wins_a, 2);
        assert_eq!(merged.total_turns, 47);
        assert_eq!(merged, right.merge(left));
    }

    #[test]
    fn test_batch_summary() {
        let mut m = PairMetrics::default();
        m.record(&result(Outcome::Winner(Side::A), Decision::Knockout, 10));
        m.record(&result(Outcome::Winner(Side::A), Decision::TurnCap, 30));
        let pairs = vec![PairRecord {
            i: 0,
            j: 1,
            a: "x".into(),
            b: "y".into(),
            metrics: m,
        }];

        let summary = BatchSummary::from_pairs(&pairs);
        assert_eq!(summary.total_battles, 2);
        assert!((summary.avg_turns - 20.0).abs() < 1e-9);
        assert!((summary.turn_cap_rate - 0.5).abs() < 1e-9);
        assert!((summary.first_striker_win_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_batch_summary_empty() {
        assert_eq!(BatchSummary::from_pairs(&[]), BatchSummary::default());
    }
}
