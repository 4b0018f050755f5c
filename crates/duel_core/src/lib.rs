//! # Duel Core
//!
//! Stat-driven 1v1 combat resolver for the card battler.
//!
//! This crate contains **only** combat logic:
//! - No IO
//! - No ambient randomness (every stochastic call takes an RNG)
//! - No global state (rosters and configuration are passed explicitly)
//!
//! Given the same seed, a battle replays identically, which is what the
//! batch evaluator and the tuning search rely on.
//!
//! ## Crate Structure
//!
//! - [`attributes`] - Attribute categories and the advantage graph
//! - [`character`] - Grades, stats, stat deltas, validated characters
//! - [`roster`] - Ordered rosters and delta-map snapshots
//! - [`config`] - Balance configuration
//! - [`arena`] - Arena modifiers
//! - [`damage`] - The per-strike damage pipeline
//! - [`battle`] - The turn and gauge state machine
//! - [`simulator`] - Single battles and best-of series

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod arena;
pub mod attributes;
pub mod battle;
pub mod character;
pub mod config;
pub mod damage;
pub mod data;
pub mod error;
pub mod math;
pub mod rng;
pub mod roster;
pub mod simulator;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::arena::{ArenaCatalog, ArenaModifier};
    pub use crate::attributes::{advantage_multiplier, Attribute, Matchup};
    pub use crate::battle::{
        Battle, BattleMode, BattleResult, BattleState, Decision, Outcome, Participant, Side,
        TurnRecord,
    };
    pub use crate::character::{Character, Grade, StatDelta, StatKind, Stats};
    pub use crate::config::{BalanceConfig, SpeedTieBreak};
    pub use crate::damage::{ActionKind, StrikeOutcome, StrikeProfile};
    pub use crate::error::{DuelError, Result};
    pub use crate::rng::{battle_rng, derive_seed, BattleRng};
    pub use crate::roster::{DeltaMap, Roster};
    pub use crate::simulator::{simulate, simulate_seeded, simulate_series, MatchOptions};
}
