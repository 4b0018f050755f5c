//! The battle state machine.
//!
//! A [`Battle`] owns two [`Participant`]s and advances one turn per
//! [`Battle::step`]. Roles alternate every turn. The battle finishes when
//! either side reaches zero HP or the turn cap is hit, in which case the
//! higher remaining HP wins and an exact tie is a draw.
//!
//! # Modes
//!
//! - [`BattleMode::Individual`]: gauge, ultimates, equalizer and variance,
//!   capped at [`BattleRules::turn_cap`] turns.
//! - [`BattleMode::Team`]: the exchange rules used for team balance runs.
//!   No gauge, equalizer or variance. Capped at
//!   [`BattleRules::team_round_cap`] full exchanges, and speed ties always
//!   go to the first-listed side.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arena::ArenaModifier;
use crate::character::Character;
use crate::config::{BalanceConfig, BattleRules, SpeedTieBreak};
use crate::damage::{resolve_strike, ActionKind, PipelineStages, StrikeProfile};

/// Rule set of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BattleMode {
    /// One-on-one rules with gauge and ultimates.
    #[default]
    Individual,
    /// Plain exchange rules.
    Team,
}

impl BattleMode {
    /// Optional damage stages active in this mode.
    #[must_use]
    pub const fn stages(self) -> PipelineStages {
        match self {
            BattleMode::Individual => PipelineStages {
                equalizer: true,
                variance: true,
            },
            BattleMode::Team => PipelineStages {
                equalizer: false,
                variance: false,
            },
        }
    }

    /// Maximum number of turns in this mode.
    #[must_use]
    pub const fn turn_limit(self, rules: &BattleRules) -> u32 {
        match self {
            BattleMode::Individual => rules.turn_cap,
            BattleMode::Team => rules.team_round_cap.saturating_mul(2),
        }
    }

    /// Whether gauges charge and force ultimates.
    #[must_use]
    pub const fn uses_gauge(self) -> bool {
        matches!(self, BattleMode::Individual)
    }
}

/// One side of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// First-listed participant.
    A,
    /// Second-listed participant.
    B,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    const fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// Runtime projection of a character for one battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Character id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Values the damage resolver reads.
    pub profile: StrikeProfile,
    /// Remaining hit points, never below zero.
    pub current_hp: u32,
    /// Gauge in `0..=gauge_max`.
    pub gauge: u32,
}

impl Participant {
    /// Fresh participant at full HP with an empty gauge.
    #[must_use]
    pub fn new(character: &Character, arena: Option<&ArenaModifier>) -> Self {
        Self {
            id: character.id.clone(),
            name: character.name.clone(),
            profile: StrikeProfile::of(character, arena),
            current_hp: character.stats.hp,
            gauge: 0,
        }
    }

    /// Whether this side still stands.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_hp > 0
    }
}

/// Lifecycle of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleState {
    /// Turns remain.
    Ongoing,
    /// A side was knocked out or the turn cap was hit.
    Finished,
}

/// How a finished battle was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// A side reached zero HP.
    Knockout,
    /// The turn cap was reached and remaining HP decided.
    TurnCap,
    /// Stopped early through [`Battle::finish`]; remaining HP decided.
    Unfinished,
}

/// Outcome from the first-listed side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// A side won.
    Winner(Side),
    /// Equal remaining HP at the turn cap.
    Draw,
}

/// One line of the turn log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnRecord {
    /// One-based turn number.
    pub turn: u32,
    /// Acting side.
    pub attacker: Side,
    /// Acting character id.
    pub attacker_id: String,
    /// Receiving character id.
    pub defender_id: String,
    /// Action taken.
    pub action: ActionKind,
    /// Damage dealt.
    pub damage: u32,
    /// Whether the strike was critical.
    pub critical: bool,
    /// Attacker HP at the start of the turn.
    pub attacker_hp_before: u32,
    /// Defender HP before the strike.
    pub defender_hp_before: u32,
    /// Defender HP after the strike.
    pub defender_hp_after: u32,
}

/// Action counters for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActionTally {
    /// Basic attacks.
    pub basics: u32,
    /// Skills.
    pub skills: u32,
    /// Ultimates.
    pub ultimates: u32,
    /// Critical hits.
    pub crits: u32,
    /// Total damage dealt.
    pub damage: u64,
}

impl ActionTally {
    fn record(&mut self, action: ActionKind, critical: bool, damage: u32) {
        match action {
            ActionKind::Basic => self.basics += 1,
            ActionKind::Skill => self.skills += 1,
            ActionKind::Ultimate => self.ultimates += 1,
        }
        if critical {
            self.crits += 1;
        }
        self.damage += u64::from(damage);
    }
}

/// Result of a finished battle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleResult {
    /// Winner or draw.
    pub outcome: Outcome,
    /// Winning character id, `None` on a draw.
    pub winner_id: Option<String>,
    /// How the battle was decided.
    pub decision: Decision,
    /// Turns played.
    pub turns: u32,
    /// Side that struck first.
    pub first_striker: Side,
    /// Final HP of side A and side B.
    pub final_hp: [u32; 2],
    /// Action counters of side A and side B.
    pub tallies: [ActionTally; 2],
    /// Per-turn log, present when requested.
    pub log: Option<Vec<TurnRecord>>,
}

impl BattleResult {
    /// Whether `side` won.
    #[must_use]
    pub fn is_win_for(&self, side: Side) -> bool {
        self.outcome == Outcome::Winner(side)
    }
}

/// A battle in progress.
#[derive(Debug, Clone)]
pub struct Battle<'c> {
    config: &'c BalanceConfig,
    mode: BattleMode,
    sides: [Participant; 2],
    active: Side,
    first_striker: Side,
    turn: u32,
    state: BattleState,
    tallies: [ActionTally; 2],
    log: Option<Vec<TurnRecord>>,
}

impl<'c> Battle<'c> {
    /// Set up a battle and decide the first striker.
    ///
    /// Higher speed strikes first. Speed ties follow
    /// [`BattleRules::speed_tie`] in individual mode, drawing one coin flip
    /// from `rng` for [`SpeedTieBreak::CoinFlip`]. Team mode always gives ties
    /// to side A.
    pub fn new<R: Rng + ?Sized>(
        a: Participant,
        b: Participant,
        mode: BattleMode,
        config: &'c BalanceConfig,
        record_log: bool,
        rng: &mut R,
    ) -> Self {
        let spd_a = a.profile.stats.spd;
        let spd_b = b.profile.stats.spd;
        let first_striker = if spd_a > spd_b {
            Side::A
        } else if spd_b > spd_a {
            Side::B
        } else {
            match (mode, config.battle.speed_tie) {
                (BattleMode::Team, _) | (_, SpeedTieBreak::FirstListed) => Side::A,
                (BattleMode::Individual, SpeedTieBreak::CoinFlip) => {
                    if rng.gen::<bool>() {
                        Side::A
                    } else {
                        Side::B
                    }
                }
            }
        };

        Self {
            config,
            mode,
            sides: [a, b],
            active: first_striker,
            first_striker,
            turn: 0,
            state: BattleState::Ongoing,
            tallies: [ActionTally::default(); 2],
            log: record_log.then(Vec::new),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BattleState {
        self.state
    }

    /// Participant on `side`.
    #[must_use]
    pub fn participant(&self, side: Side) -> &Participant {
        &self.sides[side.index()]
    }

    /// Turns played so far.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Side that acts next.
    #[must_use]
    pub fn active(&self) -> Side {
        self.active
    }

    /// Hash of the mutable battle state, for replay comparisons.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.turn.hash(&mut hasher);
        self.active.hash(&mut hasher);
        for side in &self.sides {
            side.current_hp.hash(&mut hasher);
            side.gauge.hash(&mut hasher);
        }
        self.tallies.hash(&mut hasher);
        hasher.finish()
    }

    /// Play one turn. Returns `None` once the battle is finished.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<TurnRecord> {
        if self.state == BattleState::Finished {
            return None;
        }

        let config = self.config;
        let rules = &config.battle;
        let attacker_side = self.active;
        let defender_side = attacker_side.opponent();
        let ai = attacker_side.index();
        let di = defender_side.index();
        self.turn += 1;

        let force_ultimate = self.mode.uses_gauge() && self.sides[ai].gauge >= rules.gauge_max;
        let strike = resolve_strike(
            &self.sides[ai].profile,
            &self.sides[di].profile,
            force_ultimate,
            self.mode.stages(),
            config,
            rng,
        );

        let attacker_hp_before = self.sides[ai].current_hp;
        let defender_hp_before = self.sides[di].current_hp;
        let defender_hp_after = defender_hp_before.saturating_sub(strike.damage);
        self.sides[di].current_hp = defender_hp_after;
        self.tallies[ai].record(strike.action, strike.critical, strike.damage);

        if self.mode.uses_gauge() {
            if strike.action == ActionKind::Ultimate {
                self.sides[ai].gauge = 0;
            } else {
                for side in &mut self.sides {
                    side.gauge = side.gauge.saturating_add(rules.gauge_charge).min(rules.gauge_max);
                }
            }
        }

        let record = TurnRecord {
            turn: self.turn,
            attacker: attacker_side,
            attacker_id: self.sides[ai].id.clone(),
            defender_id: self.sides[di].id.clone(),
            action: strike.action,
            damage: strike.damage,
            critical: strike.critical,
            attacker_hp_before,
            defender_hp_before,
            defender_hp_after,
        };
        if let Some(log) = self.log.as_mut() {
            log.push(record.clone());
        }

        if defender_hp_after == 0 || self.turn >= self.mode.turn_limit(rules) {
            self.state = BattleState::Finished;
        } else {
            self.active = defender_side;
        }
        Some(record)
    }

    /// Play turns until the battle finishes.
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> BattleResult {
        while self.step(rng).is_some() {}
        self.finish()
    }

    /// Consume a finished battle into its result.
    ///
    /// Calling this on an ongoing battle decides it by remaining HP and
    /// reports [`Decision::Unfinished`].
    #[must_use]
    pub fn finish(self) -> BattleResult {
        let [a, b] = &self.sides;
        let knockout = !a.is_alive() || !b.is_alive();
        let outcome = if a.current_hp > b.current_hp {
            Outcome::Winner(Side::A)
        } else if b.current_hp > a.current_hp {
            Outcome::Winner(Side::B)
        } else {
            Outcome::Draw
        };
        let winner_id = match outcome {
            Outcome::Winner(Side::A) => Some(a.id.clone()),
            Outcome::Winner(Side::B) => Some(b.id.clone()),
            Outcome::Draw => None,
        };

        BattleResult {
            outcome,
            winner_id,
            decision: if knockout {
                Decision::Knockout
            } else if self.state == BattleState::Finished {
                Decision::TurnCap
            } else {
                Decision::Unfinished
            },
            turns: self.turn,
            first_striker: self.first_striker,
            final_hp: [a.current_hp, b.current_hp],
            tallies: self.tallies,
            log: self.log,
        }
    }
}
