//! Attribute categories and the fixed advantage graph.
//!
//! Each attribute beats exactly two others. The relation is antisymmetric:
//! if `A` beats `B` then `B` never beats `A`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AttributeMultipliers;

/// One of the six attribute categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Attribute {
    /// Barrier techniques.
    Barrier,
    /// Physical body.
    Body,
    /// Curse.
    Curse,
    /// Soul.
    Soul,
    /// Conversion techniques.
    Convert,
    /// Ranged.
    Range,
}

impl Attribute {
    /// All attributes in canonical order.
    pub const ALL: [Attribute; 6] = [
        Attribute::Barrier,
        Attribute::Body,
        Attribute::Curse,
        Attribute::Soul,
        Attribute::Convert,
        Attribute::Range,
    ];

    /// The two attributes this one beats.
    #[must_use]
    pub const fn beats(self) -> [Attribute; 2] {
        match self {
            Attribute::Barrier => [Attribute::Curse, Attribute::Convert],
            Attribute::Body => [Attribute::Barrier, Attribute::Convert],
            Attribute::Curse => [Attribute::Body, Attribute::Range],
            Attribute::Soul => [Attribute::Barrier, Attribute::Curse],
            Attribute::Convert => [Attribute::Soul, Attribute::Range],
            Attribute::Range => [Attribute::Body, Attribute::Soul],
        }
    }

    /// Whether this attribute beats `other`.
    #[must_use]
    pub fn has_advantage_over(self, other: Attribute) -> bool {
        self.beats().contains(&other)
    }

    /// Upper-case identifier used in data files and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Attribute::Barrier => "BARRIER",
            Attribute::Body => "BODY",
            Attribute::Curse => "CURSE",
            Attribute::Soul => "SOUL",
            Attribute::Convert => "CONVERT",
            Attribute::Range => "RANGE",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an attribute matchup from the attacker's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Matchup {
    /// Attacker's attribute beats the defender's.
    Advantage,
    /// Defender's attribute beats the attacker's.
    Disadvantage,
    /// Neither beats the other.
    Neutral,
}

impl Matchup {
    /// Classify `attacker` against `defender`.
    #[must_use]
    pub fn between(attacker: Attribute, defender: Attribute) -> Self {
        if attacker.has_advantage_over(defender) {
            Matchup::Advantage
        } else if defender.has_advantage_over(attacker) {
            Matchup::Disadvantage
        } else {
            Matchup::Neutral
        }
    }

    /// Damage multiplier for this matchup under `multipliers`.
    #[must_use]
    pub fn multiplier(self, multipliers: &AttributeMultipliers) -> f64 {
        match self {
            Matchup::Advantage => multipliers.advantage,
            Matchup::Disadvantage => multipliers.disadvantage,
            Matchup::Neutral => 1.0,
        }
    }
}

/// Attribute damage multiplier applied when `attacker` hits `defender`.
#[must_use]
pub fn advantage_multiplier(
    attacker: Attribute,
    defender: Attribute,
    multipliers: &AttributeMultipliers,
) -> f64 {
    Matchup::between(attacker, defender).multiplier(multipliers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_attribute_beats_two() {
        for attr in Attribute::ALL {
            let beaten = attr.beats();
            assert_ne!(beaten[0], beaten[1]);
            assert!(!beaten.contains(&attr));
        }
    }

    #[test]
    fn test_relation_is_antisymmetric() {
        for a in Attribute::ALL {
            for b in Attribute::ALL {
                assert!(
                    !(a.has_advantage_over(b) && b.has_advantage_over(a)),
                    "{a} and {b} beat each other"
                );
            }
        }
    }

    #[test]
    fn test_every_attribute_is_beaten_twice() {
        for target in Attribute::ALL {
            let beaten_by = Attribute::ALL
                .iter()
                .filter(|a| a.has_advantage_over(target))
                .count();
            assert_eq!(beaten_by, 2, "{target}");
        }
    }

    #[test]
    fn test_production_multipliers() {
        let m = AttributeMultipliers::default();
        assert_eq!(
            advantage_multiplier(Attribute::Barrier, Attribute::Curse, &m),
            1.08
        );
        assert_eq!(
            advantage_multiplier(Attribute::Curse, Attribute::Barrier, &m),
            0.96
        );
        assert_eq!(
            advantage_multiplier(Attribute::Barrier, Attribute::Barrier, &m),
            1.0
        );
        // Body and Soul never meet in the graph
        assert_eq!(advantage_multiplier(Attribute::Body, Attribute::Soul, &m), 1.0);
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let ron = ron::to_string(&Attribute::Convert).unwrap();
        assert_eq!(ron, "CONVERT");
        let parsed: Attribute = ron::from_str("RANGE").unwrap();
        assert_eq!(parsed, Attribute::Range);
    }
}
