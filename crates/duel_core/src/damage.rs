//! The damage resolver.
//!
//! One strike runs a fixed pipeline. Every stage rounds to the nearest
//! integer before the next stage reads it:
//!
//! 1. base `atk × 0.4 + 5`
//! 2. defense mitigation, `min(def × 0.7, 22)` percent
//! 3. mental mitigation, `mnt × 0.5` percent
//! 4. attribute multiplier
//! 5. cursed-energy multiplier (`1 + ce × 0.006`, or the flat CE0 bonus)
//! 6. floor at the minimum damage
//! 7. stat-total equalizer, clamped
//! 8. random variance
//! 9. action multiplier (ultimate, skill or basic)
//! 10. critical multiplier
//! 11. floor at the minimum damage
//!
//! Stages 1-7 are deterministic and exposed through [`pre_variance_damage`].
//! All coefficients come from [`DamageCoefficients`].
//!
//! Each resolved strike draws the same number of values from the RNG
//! (variance when enabled, then the skill roll, then the crit roll) whatever
//! the outcome, so two battles fed the same seed stay aligned even when
//! their stats differ.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arena::ArenaModifier;
use crate::attributes::{advantage_multiplier, Attribute};
use crate::character::{Character, Stats};
use crate::config::{BalanceConfig, DamageCoefficients};
use crate::math::{round_half_up, scale};

/// Kind of action taken on a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Plain attack.
    Basic,
    /// Technique-triggered skill.
    Skill,
    /// Gauge-forced ultimate.
    Ultimate,
}

/// What the resolver needs to know about one side of a strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeProfile {
    /// Raw stats used inside the formula.
    pub stats: Stats,
    /// Attribute for the matchup multiplier.
    pub attribute: Attribute,
    /// Stat total used by the equalizer, after any arena adjustment.
    pub total: u32,
}

impl StrikeProfile {
    /// Profile of `character`, with its total adjusted by `arena`.
    #[must_use]
    pub fn of(character: &Character, arena: Option<&ArenaModifier>) -> Self {
        let total = character.total();
        Self {
            stats: character.stats,
            attribute: character.attribute,
            total: arena.map_or(total, |a| a.adjusted_total(character.attribute, total)),
        }
    }
}

/// Which optional stages of the pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStages {
    /// Apply the stat-total equalizer.
    pub equalizer: bool,
    /// Apply random variance.
    pub variance: bool,
}

impl Default for PipelineStages {
    fn default() -> Self {
        Self {
            equalizer: true,
            variance: true,
        }
    }
}

/// Intermediate values of the deterministic stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageBreakdown {
    /// Stage 1.
    pub base: i64,
    /// Stage 2.
    pub after_defense: i64,
    /// Stage 3.
    pub after_mental: i64,
    /// Stage 4.
    pub after_attribute: i64,
    /// Stage 5.
    pub after_cursed_energy: i64,
    /// Stage 6, never below the minimum damage.
    pub floored: i64,
    /// Stage 7.
    pub equalized: i64,
}

/// Result of one resolved strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeOutcome {
    /// Final damage, never below the minimum damage.
    pub damage: u32,
    /// Action taken.
    pub action: ActionKind,
    /// Whether the critical roll hit.
    pub critical: bool,
    /// Deterministic stage values.
    pub breakdown: DamageBreakdown,
}

/// Cursed-energy multiplier. CE0 characters always get the flat bonus.
#[must_use]
pub fn cursed_energy_multiplier(ce: u32, coefficients: &DamageCoefficients) -> f64 {
    if ce == 0 {
        coefficients.ce0_bonus
    } else {
        1.0 + f64::from(ce) * coefficients.ce_coefficient
    }
}

/// Equalizer factor for the given stat totals.
#[must_use]
pub fn equalizer_factor(attacker_total: u32, defender_total: u32, c: &DamageCoefficients) -> f64 {
    let diff = f64::from(attacker_total) - f64::from(defender_total);
    (1.0 + diff / c.equalizer_divisor).clamp(c.equalizer_min, c.equalizer_max)
}

/// Chance in `[0, 1]` that a non-ultimate turn becomes a skill.
#[must_use]
pub fn skill_chance(tec: u32, c: &DamageCoefficients) -> f64 {
    ((c.skill_base_chance + f64::from(tec) * c.skill_tec_coefficient) / 100.0).clamp(0.0, 1.0)
}

/// Chance in `[0, 1]` of a critical hit.
#[must_use]
pub fn crit_chance(crt: u32, c: &DamageCoefficients) -> f64 {
    (f64::from(crt) / c.crit_divisor).clamp(0.0, 1.0)
}

/// Run the deterministic stages 1-7.
#[must_use]
pub fn pre_variance_damage(
    attacker: &StrikeProfile,
    defender: &StrikeProfile,
    config: &BalanceConfig,
    equalizer: bool,
) -> DamageBreakdown {
    let c = &config.damage;
    let min = f64::from(c.min_damage);
    let a = &attacker.stats;
    let d = &defender.stats;

    let base = round_half_up(f64::from(a.atk) * c.atk_coefficient + c.base_flat);
    let after_defense = scale(
        base,
        1.0 - (f64::from(d.def) * c.def_rate).min(c.def_cap) / 100.0,
    );
    let after_mental = scale(after_defense, 1.0 - f64::from(d.mnt) * c.mnt_rate / 100.0);
    let after_attribute = scale(
        after_mental,
        advantage_multiplier(attacker.attribute, defender.attribute, &config.attributes),
    );
    let after_cursed_energy = scale(after_attribute, cursed_energy_multiplier(a.ce, c));
    let floored = after_cursed_energy.max(min);
    let equalized = if equalizer {
        scale(floored, equalizer_factor(attacker.total, defender.total, c))
    } else {
        floored
    };

    DamageBreakdown {
        base: base as i64,
        after_defense: after_defense as i64,
        after_mental: after_mental as i64,
        after_attribute: after_attribute as i64,
        after_cursed_energy: after_cursed_energy as i64,
        floored: floored as i64,
        equalized: equalized as i64,
    }
}

/// Resolve one strike.
pub fn resolve_strike<R: Rng + ?Sized>(
    attacker: &StrikeProfile,
    defender: &StrikeProfile,
    force_ultimate: bool,
    stages: PipelineStages,
    config: &BalanceConfig,
    rng: &mut R,
) -> StrikeOutcome {
    let c = &config.damage;
    let min = f64::from(c.min_damage);
    let breakdown = pre_variance_damage(attacker, defender, config, stages.equalizer);
    let mut damage = breakdown.equalized as f64;

    if stages.variance {
        let roll: f64 = rng.gen();
        damage = scale(damage, c.variance_min + roll * (c.variance_max - c.variance_min));
    }

    let skill_roll: f64 = rng.gen();
    let action = if force_ultimate {
        ActionKind::Ultimate
    } else if skill_roll < skill_chance(attacker.stats.tec, c) {
        ActionKind::Skill
    } else {
        ActionKind::Basic
    };
    damage = match action {
        ActionKind::Ultimate => scale(damage, c.ultimate_multiplier),
        ActionKind::Skill => scale(damage, c.skill_multiplier),
        ActionKind::Basic => damage,
    };

    let crit_roll: f64 = rng.gen();
    let critical = crit_roll < crit_chance(attacker.stats.crt, c);
    if critical {
        damage = scale(damage, c.crit_multiplier);
    }

    StrikeOutcome {
        damage: damage.max(min) as u32,
        action,
        critical,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::battle_rng;

    fn profile(attribute: Attribute, stats: Stats) -> StrikeProfile {
        StrikeProfile {
            stats,
            attribute,
            total: stats.total(),
        }
    }

    fn stats(atk: u32, def: u32, ce: u32, mnt: u32) -> Stats {
        Stats {
            atk,
            def,
            spd: 20,
            ce,
            hp: 100,
            crt: 10,
            tec: 10,
            mnt,
        }
    }

    #[test]
    fn test_reference_strike_stages() {
        // Barrier beats Curse
        let attacker = profile(Attribute::Barrier, stats(22, 20, 25, 10));
        let defender = profile(Attribute::Curse, stats(22, 20, 25, 10));
        let b = pre_variance_damage(&attacker, &defender, &BalanceConfig::default(), true);

        assert_eq!(b.base, 14); // 22 * 0.4 + 5 = 13.8
        assert_eq!(b.after_defense, 12); // 14 * 0.86 = 12.04
        assert_eq!(b.after_mental, 11); // 12 * 0.95 = 11.4
        assert_eq!(b.after_attribute, 12); // 11 * 1.08 = 11.88
        assert_eq!(b.after_cursed_energy, 14); // 12 * 1.15 = 13.8
        assert_eq!(b.floored, 14);
        assert_eq!(b.equalized, 14); // equal totals
    }

    #[test]
    fn test_disadvantage_direction() {
        let attacker = profile(Attribute::Curse, stats(22, 20, 25, 10));
        let defender = profile(Attribute::Barrier, stats(22, 20, 25, 10));
        let b = pre_variance_damage(&attacker, &defender, &BalanceConfig::default(), true);
        // 11 * 0.96 = 10.56
        assert_eq!(b.after_attribute, 11);
    }

    #[test]
    fn test_ce0_flat_bonus() {
        let c = DamageCoefficients::default();
        assert_eq!(cursed_energy_multiplier(0, &c), 1.12);
        assert!((cursed_energy_multiplier(25, &c) - 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_equalizer_clamped() {
        let c = DamageCoefficients::default();
        assert_eq!(equalizer_factor(900, 100, &c), 1.2);
        assert_eq!(equalizer_factor(100, 900, &c), 0.8);
        assert!((equalizer_factor(200, 150, &c) - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_minimum_damage_floor() {
        let attacker = profile(Attribute::Curse, stats(0, 0, 0, 0));
        let defender = profile(Attribute::Barrier, stats(0, 200, 0, 200));
        let config = BalanceConfig::default();
        let b = pre_variance_damage(&attacker, &defender, &config, true);
        assert_eq!(b.floored, 5);

        let mut rng = battle_rng(3);
        for _ in 0..200 {
            let out = resolve_strike(
                &attacker,
                &defender,
                false,
                PipelineStages::default(),
                &config,
                &mut rng,
            );
            assert!(out.damage >= 5);
        }
    }

    #[test]
    fn test_forced_ultimate_doubles() {
        let attacker = profile(Attribute::Body, stats(20, 16, 20, 10));
        let defender = profile(Attribute::Soul, stats(20, 16, 20, 10));
        let config = BalanceConfig::default();
        let stages = PipelineStages {
            equalizer: true,
            variance: false,
        };
        let out = resolve_strike(&attacker, &defender, true, stages, &config, &mut battle_rng(9));
        assert_eq!(out.action, ActionKind::Ultimate);
        let expected = out.breakdown.equalized * 2;
        if out.critical {
            assert_eq!(i64::from(out.damage), (expected as f64 * 1.5).round() as i64);
        } else {
            assert_eq!(i64::from(out.damage), expected);
        }
    }

    #[test]
    fn test_fixed_seed_reproducible() {
        let attacker = profile(Attribute::Range, stats(23, 15, 20, 10));
        let defender = profile(Attribute::Body, stats(19, 16, 18, 10));
        let config = BalanceConfig::default();
        let run = |seed| {
            let mut rng = battle_rng(seed);
            (0..20)
                .map(|_| {
                    resolve_strike(
                        &attacker,
                        &defender,
                        false,
                        PipelineStages::default(),
                        &config,
                        &mut rng,
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_full_skill_chance_always_skills() {
        let mut s = stats(20, 10, 20, 10);
        s.tec = 80;
        s.crt = 0;
        let attacker = profile(Attribute::Body, s);
        let defender = profile(Attribute::Body, stats(20, 10, 20, 10));
        let mut rng = battle_rng(5);
        for _ in 0..50 {
            let out = resolve_strike(
                &attacker,
                &defender,
                false,
                PipelineStages::default(),
                &BalanceConfig::default(),
                &mut rng,
            );
            assert_eq!(out.action, ActionKind::Skill);
            assert!(!out.critical);
        }
    }
}
