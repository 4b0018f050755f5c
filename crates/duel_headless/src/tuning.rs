//! Iterative stat tuning.
//!
//! A greedy local search: evaluate the roster, classify, nudge the outliers
//! by small bounded deltas, repeat. The search keeps the base roster
//! untouched and accumulates a sparse [`DeltaMap`]; every round evaluates a
//! fresh snapshot built from the base roster and the deltas so far.
//!
//! Every round uses the same batch seed, so consecutive rounds share their
//! random draws and a one-step change moves win rates in its own direction
//! rather than with the noise.
//!
//! The search is not globally optimal. It can stop with outliers left when
//! every remaining move is blocked by the drift bounds.

use std::path::Path;

use duel_core::arena::ArenaModifier;
use duel_core::character::{Character, Grade, StatDelta, StatKind};
use duel_core::config::BalanceConfig;
use duel_core::error::Result;
use duel_core::roster::{DeltaMap, Roster};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyzer::{analyze_batch, BalanceAnalysis, Classification, ClassificationView};
use crate::batch::{run_batch, BatchConfig};

/// Move rules and bounds for the tuning search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Round cap.
    pub max_rounds: u32,
    /// Maximum absolute drift of atk, def and spd from the base value.
    pub max_stat_delta: i32,
    /// Maximum absolute drift of hp from the base value.
    pub max_hp_delta: i32,
    /// Minimum current spd at which an OP character loses spd before atk.
    pub speed_nerf_floor: u32,
    /// OK characters at or above this rate get a light nerf.
    pub borderline_op: f64,
    /// OK characters at or below this rate get a light buff.
    pub borderline_wk: f64,
    /// Minimum current spd for the borderline speed nerf.
    pub borderline_speed_floor: u32,
    /// hp added to a WK character per round.
    pub hp_buff_step: i32,
    /// atk added to a WK character per round.
    pub atk_buff_step: i32,
    /// hp removed from an OP character per round.
    pub hp_nerf_step: i32,
    /// spd or atk removed from an OP character per round.
    pub stat_nerf_step: i32,
    /// Win rate that drives the moves.
    pub view: ClassificationView,
    /// Restrict tuning to one grade.
    pub grade: Option<Grade>,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            max_stat_delta: 2,
            max_hp_delta: 5,
            speed_nerf_floor: 20,
            borderline_op: 0.63,
            borderline_wk: 0.38,
            borderline_speed_floor: 21,
            hp_buff_step: 2,
            atk_buff_step: 1,
            hp_nerf_step: 2,
            stat_nerf_step: 1,
            view: ClassificationView::Grade,
            grade: None,
        }
    }
}

impl TuningConfig {
    /// Set the round cap.
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Restrict tuning to one grade.
    pub fn with_grade(mut self, grade: Option<Grade>) -> Self {
        self.grade = grade;
        self
    }

    /// Set the classification view.
    pub fn with_view(mut self, view: ClassificationView) -> Self {
        self.view = view;
        self
    }
}

/// Why a move was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveReason {
    /// Classified OP.
    Overpowered,
    /// Classified WK.
    Weak,
    /// OK, but close to the OP threshold.
    BorderlineOp,
    /// OK, but close to the WK threshold.
    BorderlineWeak,
}

/// One stat change applied in a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    /// Character id.
    pub id: String,
    /// Stat changed.
    pub stat: StatKind,
    /// Signed change.
    pub amount: i32,
    /// Win rate that triggered the move.
    pub rate: f64,
    /// Trigger.
    pub reason: MoveReason,
}

/// Trace of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningRound {
    /// One-based round number.
    pub round: u32,
    /// OP characters at the start of the round.
    pub op_count: usize,
    /// WK characters at the start of the round.
    pub wk_count: usize,
    /// Balance score at the start of the round.
    pub balance_score: f64,
    /// Changes made after evaluation.
    pub adjustments: Vec<Adjustment>,
}

/// How the search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningOutcome {
    /// No character is OP or WK.
    Converged,
    /// Outliers remain but every move is blocked by the drift bounds.
    Exhausted,
    /// The round cap was reached with outliers left.
    RoundCapReached,
}

/// Before/after value of one stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatChange {
    /// Stat.
    pub stat: StatKind,
    /// Base value.
    pub before: u32,
    /// Tuned value.
    pub after: u32,
}

/// All stat changes of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDiff {
    /// Character id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Changed stats.
    pub changes: Vec<StatChange>,
    /// Win rate before tuning.
    pub rate_before: Option<f64>,
    /// Win rate after tuning.
    pub rate_after: Option<f64>,
}

/// Result of a tuning search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningReport {
    /// How the search ended.
    pub outcome: TuningOutcome,
    /// Per-round trace.
    pub rounds: Vec<TuningRound>,
    /// Accumulated deltas against the base roster.
    pub deltas: DeltaMap,
    /// Stat diffs of every changed character.
    pub diffs: Vec<StatDiff>,
    /// Analysis of the base roster.
    pub initial: BalanceAnalysis,
    /// Analysis of the tuned roster.
    pub final_analysis: BalanceAnalysis,
}

impl TuningReport {
    /// Whether the search ended with no outliers.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.outcome == TuningOutcome::Converged
    }

    /// Apply the accumulated deltas to `base`.
    pub fn apply_to(&self, base: &Roster) -> Result<Roster> {
        base.with_deltas(&self.deltas)
    }

    /// Save to JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load from JSON
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Generate markdown summary
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# Tuning Report\n\n");
        md.push_str(&format!("- Outcome: {:?}\n", self.outcome));
        md.push_str(&format!("- Rounds: {}\n", self.rounds.len()));
        md.push_str(&format!(
            "- Balance score: {:.2} -> {:.2}\n",
            self.initial.balance_score, self.final_analysis.balance_score
        ));
        md.push_str(&format!(
            "- Outliers: {} -> {}\n",
            self.initial.outliers.len(),
            self.final_analysis.outliers.len()
        ));

        md.push_str("\n## Rounds\n\n");
        md.push_str("| Round | OP | WK | Score | Moves |\n|-------|----|----|-------|-------|\n");
        for r in &self.rounds {
            md.push_str(&format!(
                "| {} | {} | {} | {:.2} | {} |\n",
                r.round,
                r.op_count,
                r.wk_count,
                r.balance_score,
                r.adjustments.len()
            ));
        }

        if !self.diffs.is_empty() {
            md.push_str("\n## Stat Changes\n\n");
            for diff in &self.diffs {
                let changes: Vec<String> = diff
                    .changes
                    .iter()
                    .map(|c| format!("{} {} -> {}", c.stat.name(), c.before, c.after))
                    .collect();
                let rate = |r: Option<f64>| r.map_or("-".to_string(), |v| format!("{:.1}%", v * 100.0));
                md.push_str(&format!(
                    "- **{}** ({}): {} | {} -> {}\n",
                    diff.id,
                    diff.name,
                    changes.join(", "),
                    rate(diff.rate_before),
                    rate(diff.rate_after)
                ));
            }
        }
        md
    }
}

/// Headroom left before `drift + amount` leaves `[-bound, bound]`,
/// returned as the clamped amount (zero when blocked).
fn clamp_step(drift: i32, amount: i32, bound: i32) -> i32 {
    if amount >= 0 {
        amount.min(bound - drift).max(0)
    } else {
        amount.max(-bound - drift).min(0)
    }
}

/// Plan this round's moves for one character.
///
/// OP: lower spd if it is at least `speed_nerf_floor`, else atk, else hp.
/// WK: raise hp and atk. Borderline OK characters get a one-point nudge.
pub fn plan_moves(
    character: &Character,
    drift: &StatDelta,
    rate: f64,
    class: Classification,
    config: &TuningConfig,
) -> Vec<Adjustment> {
    let stat = config.max_stat_delta;
    let hp = config.max_hp_delta;
    let mut moves = Vec::new();
    let mut push = |kind: StatKind, amount: i32, reason: MoveReason| {
        if amount != 0 {
            moves.push(Adjustment {
                id: character.id.clone(),
                stat: kind,
                amount,
                rate,
                reason,
            });
        }
    };

    match class {
        Classification::Op => {
            let nerf = -config.stat_nerf_step;
            let spd_step = clamp_step(drift.spd, nerf, stat);
            let atk_step = clamp_step(drift.atk, nerf, stat);
            let reason = MoveReason::Overpowered;
            if character.stats.spd >= config.speed_nerf_floor && spd_step != 0 {
                push(StatKind::Spd, spd_step, reason);
            } else if atk_step != 0 {
                push(StatKind::Atk, atk_step, reason);
            } else {
                let hp_step = clamp_step(drift.hp, -config.hp_nerf_step, hp);
                // never remove the last hit point
                let hp_step = hp_step.max(1 - character.stats.hp as i32);
                push(StatKind::Hp, hp_step, reason);
            }
        }
        Classification::Wk => {
            let reason = MoveReason::Weak;
            push(StatKind::Hp, clamp_step(drift.hp, config.hp_buff_step, hp), reason);
            push(StatKind::Atk, clamp_step(drift.atk, config.atk_buff_step, stat), reason);
        }
        Classification::Ok => {
            if rate <= config.borderline_wk {
                push(StatKind::Hp, clamp_step(drift.hp, 1, hp), MoveReason::BorderlineWeak);
            } else if rate >= config.borderline_op
                && character.stats.spd >= config.borderline_speed_floor
            {
                push(StatKind::Spd, clamp_step(drift.spd, -1, stat), MoveReason::BorderlineOp);
            }
        }
    }

    moves
}

fn in_scope(character: &Character, config: &TuningConfig) -> bool {
    config.grade.map_or(true, |g| character.grade == g)
}

fn diffs(
    base: &Roster,
    deltas: &DeltaMap,
    initial: &BalanceAnalysis,
    final_analysis: &BalanceAnalysis,
    view: ClassificationView,
) -> Result<Vec<StatDiff>> {
    deltas
        .iter()
        .filter(|(_, d)| !d.is_zero())
        .map(|(id, delta)| {
            let character = base.require(id)?;
            let tuned = character.with_delta(delta)?;
            Ok(StatDiff {
                id: id.clone(),
                name: character.name.clone(),
                changes: delta
                    .changes()
                    .into_iter()
                    .map(|(stat, _)| StatChange {
                        stat,
                        before: character.stats.get(stat),
                        after: tuned.stats.get(stat),
                    })
                    .collect(),
                rate_before: initial.character(id).and_then(|c| c.rate(view)),
                rate_after: final_analysis.character(id).and_then(|c| c.rate(view)),
            })
        })
        .collect()
}

/// Run the tuning search on `base`.
///
/// `base` is never modified. With `config.grade` set, the batch runs on
/// that grade's members only.
pub fn tune(
    base: &Roster,
    config: &TuningConfig,
    batch: &BatchConfig,
    balance: &BalanceConfig,
    arena: Option<&ArenaModifier>,
) -> Result<TuningReport> {
    let base = match config.grade {
        Some(grade) => base.of_grade(grade)?,
        None => base.clone(),
    };
    let evaluate = |roster: &Roster| {
        let results = run_batch(roster, batch, balance, arena);
        analyze_batch(&results, config.view)
    };

    info!(
        characters = base.len(),
        max_rounds = config.max_rounds,
        trials = batch.trials,
        "Starting tuning search"
    );

    let mut deltas = DeltaMap::new();
    let mut rounds = Vec::new();
    let initial = evaluate(&base);
    let mut analysis = initial.clone();
    let mut outcome = TuningOutcome::RoundCapReached;

    for round in 1..=config.max_rounds {
        let roster = base.with_deltas(&deltas)?;
        if round > 1 {
            analysis = evaluate(&roster);
        }

        let mut trace = TuningRound {
            round,
            op_count: analysis.count(Classification::Op),
            wk_count: analysis.count(Classification::Wk),
            balance_score: analysis.balance_score,
            adjustments: Vec::new(),
        };

        if !analysis.needs_adjustment() {
            info!(round, score = analysis.balance_score, "Tuning converged");
            rounds.push(trace);
            outcome = TuningOutcome::Converged;
            break;
        }

        for summary in &analysis.characters {
            let (Some(rate), Some(class)) = (summary.rate(config.view), summary.classification)
            else {
                continue;
            };
            let character = roster.require(&summary.id)?;
            if !in_scope(character, config) {
                continue;
            }
            let drift = deltas.get(&summary.id).copied().unwrap_or_default();
            trace
                .adjustments
                .extend(plan_moves(character, &drift, rate, class, config));
        }

        for adj in &trace.adjustments {
            debug!(
                round,
                id = %adj.id,
                stat = adj.stat.name(),
                amount = adj.amount,
                rate = adj.rate,
                "Tuning move"
            );
            deltas.entry(adj.id.clone()).or_default().add(adj.stat, adj.amount);
        }

        info!(
            round,
            op = trace.op_count,
            wk = trace.wk_count,
            score = trace.balance_score,
            moves = trace.adjustments.len(),
            "Tuning round complete"
        );

        let stalled = trace.adjustments.is_empty();
        rounds.push(trace);
        if stalled {
            outcome = TuningOutcome::Exhausted;
            break;
        }
    }

    // the last round's moves have not been evaluated yet
    let final_analysis = if outcome == TuningOutcome::RoundCapReached {
        let tuned = evaluate(&base.with_deltas(&deltas)?);
        if !tuned.needs_adjustment() {
            outcome = TuningOutcome::Converged;
        }
        tuned
    } else {
        analysis
    };

    deltas.retain(|_, d| !d.is_zero());
    let diffs = diffs(&base, &deltas, &initial, &final_analysis, config.view)?;

    info!(
        outcome = ?outcome,
        rounds = rounds.len(),
        changed = diffs.len(),
        score_before = initial.balance_score,
        score_after = final_analysis.balance_score,
        "Tuning search finished"
    );

    Ok(TuningReport {
        outcome,
        rounds,
        deltas,
        diffs,
        initial,
        final_analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_core::attributes::Attribute;
    use duel_core::character::Stats;

    fn fighter(spd: u32, hp: u32) -> Character {
        Character::new(
            "x",
            "X",
            Grade::First,
            Attribute::Body,
            Stats {
                atk: 20,
                def: 16,
                spd,
                ce: 20,
                hp,
                crt: 10,
                tec: 10,
                mnt: 10,
            },
        )
    }

    fn plan(c: &Character, drift: StatDelta, rate: f64, class: Classification) -> Vec<(StatKind, i32)> {
        plan_moves(c, &drift, rate, class, &TuningConfig::default())
            .into_iter()
            .map(|a| (a.stat, a.amount))
            .collect()
    }

    #[test]
    fn test_clamp_step() {
        assert_eq!(clamp_step(0, -1, 2), -1);
        assert_eq!(clamp_step(-2, -1, 2), 0);
        assert_eq!(clamp_step(4, 2, 5), 1);
        assert_eq!(clamp_step(5, 2, 5), 0);
    }

    #[test]
    fn test_fast_op_loses_speed_first() {
        let c = fighter(22, 90);
        assert_eq!(plan(&c, StatDelta::default(), 0.7, Classification::Op), vec![(StatKind::Spd, -1)]);
    }

    #[test]
    fn test_slow_op_loses_attack() {
        let c = fighter(18, 90);
        assert_eq!(plan(&c, StatDelta::default(), 0.7, Classification::Op), vec![(StatKind::Atk, -1)]);
    }

    #[test]
    fn test_op_falls_back_to_hp_when_bounded() {
        let c = fighter(22, 90);
        let drift = StatDelta::default()
            .with(StatKind::Spd, -2)
            .with(StatKind::Atk, -2)
            .with(StatKind::Hp, -4);
        assert_eq!(plan(&c, drift, 0.7, Classification::Op), vec![(StatKind::Hp, -1)]);

        let drift = drift.with(StatKind::Hp, -5);
        assert!(plan(&c, drift, 0.7, Classification::Op).is_empty());
    }

    #[test]
    fn test_weak_gets_hp_and_attack() {
        let c = fighter(18, 90);
        assert_eq!(
            plan(&c, StatDelta::default(), 0.3, Classification::Wk),
            vec![(StatKind::Hp, 2), (StatKind::Atk, 1)]
        );
        let drift = StatDelta::default().with(StatKind::Atk, 2).with(StatKind::Hp, 5);
        assert!(plan(&c, drift, 0.3, Classification::Wk).is_empty());
    }

    #[test]
    fn test_borderline_moves() {
        let fast = fighter(21, 90);
        assert_eq!(plan(&fast, StatDelta::default(), 0.64, Classification::Ok), vec![(StatKind::Spd, -1)]);
        let slow = fighter(20, 90);
        assert!(plan(&slow, StatDelta::default(), 0.64, Classification::Ok).is_empty());
        assert_eq!(plan(&slow, StatDelta::default(), 0.37, Classification::Ok), vec![(StatKind::Hp, 1)]);
        assert!(plan(&slow, StatDelta::default(), 0.5, Classification::Ok).is_empty());
    }

    #[test]
    fn test_tuning_config_defaults() {
        let config = TuningConfig::default();
        assert_eq!(config.max_rounds, 4);
        assert_eq!(config.max_stat_delta, 2);
        assert_eq!(config.max_hp_delta, 5);
        assert_eq!(config.view, ClassificationView::Grade);
    }
}
