//! Balance configuration.
//!
//! Every constant of the damage formula and the battle rules lives here so
//! different tuning passes are configuration variations rather than code
//! forks. [`BalanceConfig::default`] holds the production values.
//!
//! # Example RON
//!
//! ```ron
//! BalanceConfig(
//!     attributes: (advantage: 1.08, disadvantage: 0.96),
//!     battle: (turn_cap: 30, speed_tie: CoinFlip),
//! )
//! ```
//!
//! Omitted fields fall back to their production defaults.

use serde::{Deserialize, Serialize};

use crate::error::{DuelError, Result};

/// Multipliers for attribute matchups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeMultipliers {
    /// Multiplier when the attacker has the advantage.
    pub advantage: f64,
    /// Multiplier when the defender has the advantage.
    pub disadvantage: f64,
}

impl Default for AttributeMultipliers {
    fn default() -> Self {
        Self {
            advantage: 1.08,
            disadvantage: 0.96,
        }
    }
}

/// Coefficients of the per-strike damage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageCoefficients {
    /// Attack scaling of the base damage.
    pub atk_coefficient: f64,
    /// Flat part of the base damage.
    pub base_flat: f64,
    /// Defense mitigation percent per defense point.
    pub def_rate: f64,
    /// Maximum defense mitigation percent.
    pub def_cap: f64,
    /// Mental mitigation percent per mental point.
    pub mnt_rate: f64,
    /// Damage multiplier gained per cursed-energy point.
    pub ce_coefficient: f64,
    /// Flat multiplier for characters with zero cursed energy.
    pub ce0_bonus: f64,
    /// Minimum damage of any strike.
    pub min_damage: u32,
    /// Divisor applied to the stat-total difference.
    pub equalizer_divisor: f64,
    /// Lower clamp of the equalizer.
    pub equalizer_min: f64,
    /// Upper clamp of the equalizer.
    pub equalizer_max: f64,
    /// Lower bound of the random variance factor.
    pub variance_min: f64,
    /// Upper bound of the random variance factor.
    pub variance_max: f64,
    /// Skill chance percent before technique scaling.
    pub skill_base_chance: f64,
    /// Skill chance percent per technique point.
    pub skill_tec_coefficient: f64,
    /// Damage multiplier of a skill.
    pub skill_multiplier: f64,
    /// Damage multiplier of an ultimate.
    pub ultimate_multiplier: f64,
    /// Critical chance is `crt / crit_divisor`.
    pub crit_divisor: f64,
    /// Damage multiplier of a critical hit.
    pub crit_multiplier: f64,
}

impl Default for DamageCoefficients {
    fn default() -> Self {
        Self {
            atk_coefficient: 0.4,
            base_flat: 5.0,
            def_rate: 0.7,
            def_cap: 22.0,
            mnt_rate: 0.5,
            ce_coefficient: 0.006,
            ce0_bonus: 1.12,
            min_damage: 5,
            equalizer_divisor: 1000.0,
            equalizer_min: 0.8,
            equalizer_max: 1.2,
            variance_min: 0.9,
            variance_max: 1.1,
            skill_base_chance: 20.0,
            skill_tec_coefficient: 1.0,
            skill_multiplier: 1.3,
            ultimate_multiplier: 2.0,
            crit_divisor: 150.0,
            crit_multiplier: 1.5,
        }
    }
}

/// How the first striker is chosen when both sides have equal speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeedTieBreak {
    /// Seeded coin flip drawn from the battle RNG.
    #[default]
    CoinFlip,
    /// The first-listed side strikes first.
    FirstListed,
}

/// Turn and gauge rules of an individual battle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleRules {
    /// Hard cap on turns before remaining HP decides.
    pub turn_cap: u32,
    /// Gauge gained by both sides on every non-ultimate turn.
    pub gauge_charge: u32,
    /// Gauge value that forces an ultimate.
    pub gauge_max: u32,
    /// Cap on full exchange rounds in team mode.
    pub team_round_cap: u32,
    /// Speed tie resolution.
    pub speed_tie: SpeedTieBreak,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            turn_cap: 30,
            gauge_charge: 25,
            gauge_max: 100,
            team_round_cap: 100,
            speed_tie: SpeedTieBreak::CoinFlip,
        }
    }
}

/// Win-rate thresholds used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Win rate at or above which a character is overpowered.
    pub op: f64,
    /// Win rate at or below which a character is weak.
    pub wk: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { op: 0.65, wk: 0.35 }
    }
}

/// Complete balance configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Attribute matchup multipliers.
    pub attributes: AttributeMultipliers,
    /// Damage pipeline coefficients.
    pub damage: DamageCoefficients,
    /// Turn and gauge rules.
    pub battle: BattleRules,
    /// Classification thresholds.
    pub thresholds: Thresholds,
}

impl BalanceConfig {
    /// Parse a configuration from RON text.
    pub fn from_ron_str(source: &str, label: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| DuelError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the attribute multipliers.
    pub fn with_multipliers(mut self, advantage: f64, disadvantage: f64) -> Self {
        self.attributes = AttributeMultipliers {
            advantage,
            disadvantage,
        };
        self
    }

    /// Set the speed tie-break rule.
    pub fn with_speed_tie(mut self, rule: SpeedTieBreak) -> Self {
        self.battle.speed_tie = rule;
        self
    }

    /// Set the turn cap.
    pub fn with_turn_cap(mut self, turn_cap: u32) -> Self {
        self.battle.turn_cap = turn_cap;
        self
    }

    /// Set the classification thresholds.
    pub fn with_thresholds(mut self, op: f64, wk: f64) -> Self {
        self.thresholds = Thresholds { op, wk };
        self
    }

    /// Check that the values describe a usable rule set.
    pub fn validate(&self) -> Result<()> {
        let d = &self.damage;
        let a = &self.attributes;
        let b = &self.battle;
        let t = &self.thresholds;

        if a.advantage <= 0.0 || a.disadvantage <= 0.0 {
            return Err(DuelError::InvalidConfig(
                "attribute multipliers must be positive".to_string(),
            ));
        }
        if d.equalizer_divisor <= 0.0 || d.equalizer_min > d.equalizer_max {
            return Err(DuelError::InvalidConfig(format!(
                "equalizer bounds [{}, {}] with divisor {} are inconsistent",
                d.equalizer_min, d.equalizer_max, d.equalizer_divisor
            )));
        }
        if d.variance_min <= 0.0 || d.variance_min > d.variance_max {
            return Err(DuelError::InvalidConfig(format!(
                "variance range [{}, {}] is inconsistent",
                d.variance_min, d.variance_max
            )));
        }
        if d.crit_divisor <= 0.0 {
            return Err(DuelError::InvalidConfig(
                "crit divisor must be positive".to_string(),
            ));
        }
        if d.min_damage == 0 {
            return Err(DuelError::InvalidConfig(
                "minimum damage must be at least 1".to_string(),
            ));
        }
        if b.turn_cap == 0 || b.team_round_cap == 0 {
            return Err(DuelError::InvalidConfig(
                "turn caps must be at least 1".to_string(),
            ));
        }
        if b.gauge_charge == 0 || b.gauge_max == 0 {
            return Err(DuelError::InvalidConfig(
                "gauge charge and maximum must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&t.op) || !(0.0..=1.0).contains(&t.wk) || t.wk >= t.op {
            return Err(DuelError::InvalidConfig(format!(
                "thresholds must satisfy 0 <= wk < op <= 1 (wk {}, op {})",
                t.wk, t.op
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(BalanceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_production_values() {
        let config = BalanceConfig::default();
        assert_eq!(config.attributes.advantage, 1.08);
        assert_eq!(config.attributes.disadvantage, 0.96);
        assert_eq!(config.battle.turn_cap, 30);
        assert_eq!(config.battle.gauge_charge, 25);
        assert_eq!(config.damage.min_damage, 5);
        assert_eq!(config.thresholds.op, 0.65);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = BalanceConfig::from_ron_str(
            "(attributes: (advantage: 1.2), battle: (speed_tie: FirstListed))",
            "inline",
        )
        .unwrap();
        assert_eq!(config.attributes.advantage, 1.2);
        assert_eq!(config.attributes.disadvantage, 0.96);
        assert_eq!(config.battle.speed_tie, SpeedTieBreak::FirstListed);
        assert_eq!(config.battle.turn_cap, 30);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = BalanceConfig::default().with_thresholds(0.3, 0.6);
        assert!(matches!(
            config.validate(),
            Err(DuelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bad_ron_reports_label() {
        let err = BalanceConfig::from_ron_str("(attributes: ", "balance.ron").unwrap_err();
        match err {
            DuelError::DataParseError { path, .. } => assert_eq!(path, "balance.ron"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
