//! Arena modifiers.
//!
//! An arena boosts one attribute and penalizes another. The adjustment only
//! touches a participant's stat total, which feeds the equalizer term of the
//! damage pipeline; raw stats inside the formula are unaffected.

use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::error::{DuelError, Result};
use crate::math::round_half_up;

/// A bonus/penalty pair keyed on attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaModifier {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Attribute receiving the bonus.
    pub bonus_attribute: Attribute,
    /// Bonus in percent.
    pub bonus_percent: u32,
    /// Attribute receiving the penalty.
    pub penalty_attribute: Attribute,
    /// Penalty in percent.
    pub penalty_percent: u32,
    /// Flavor text.
    #[serde(default)]
    pub description: String,
}

impl ArenaModifier {
    /// Create a modifier with an empty description.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        bonus_attribute: Attribute,
        bonus_percent: u32,
        penalty_attribute: Attribute,
        penalty_percent: u32,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            bonus_attribute,
            bonus_percent,
            penalty_attribute,
            penalty_percent,
            description: String::new(),
        }
    }

    /// Bonus and penalty percent that apply to `attribute`.
    #[must_use]
    pub fn percents_for(&self, attribute: Attribute) -> (u32, u32) {
        let bonus = if attribute == self.bonus_attribute {
            self.bonus_percent
        } else {
            0
        };
        let penalty = if attribute == self.penalty_attribute {
            self.penalty_percent
        } else {
            0
        };
        (bonus, penalty)
    }

    /// `round(total × (1 + bonus/100) × (1 − penalty/100))`.
    #[must_use]
    pub fn adjusted_total(&self, attribute: Attribute, total: u32) -> u32 {
        let (bonus, penalty) = self.percents_for(attribute);
        if bonus == 0 && penalty == 0 {
            return total;
        }
        let scaled = f64::from(total)
            * (1.0 + f64::from(bonus) / 100.0)
            * (1.0 - f64::from(penalty) / 100.0);
        round_half_up(scaled).max(0.0) as u32
    }

    /// Check percent ranges.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DuelError::MissingField {
                character: format!("arena '{}'", self.name),
                field: "id",
            });
        }
        if self.bonus_percent > 100 || self.penalty_percent > 100 {
            return Err(DuelError::InvalidConfig(format!(
                "arena '{}' percents must be within 0..=100",
                self.id
            )));
        }
        Ok(())
    }
}

/// A named set of arenas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaCatalog {
    /// Arenas in file order.
    pub arenas: Vec<ArenaModifier>,
}

impl ArenaCatalog {
    /// Parse and validate RON catalog text.
    pub fn from_ron_str(source: &str, label: &str) -> Result<Self> {
        let catalog: Self = ron::from_str(source).map_err(|e| DuelError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        for arena in &catalog.arenas {
            arena.validate()?;
        }
        Ok(catalog)
    }

    /// Arena by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ArenaModifier> {
        self.arenas.iter().find(|a| a.id == id)
    }

    /// Arena by id, or [`DuelError::UnknownArena`].
    pub fn require(&self, id: &str) -> Result<&ArenaModifier> {
        self.get(id)
            .ok_or_else(|| DuelError::UnknownArena(id.to_string()))
    }

    /// First arena whose bonus goes to `attribute`.
    #[must_use]
    pub fn favoring(&self, attribute: Attribute) -> Option<&ArenaModifier> {
        self.arenas.iter().find(|a| a.bonus_attribute == attribute)
    }

    /// Number of arenas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    /// Whether the catalog has no arenas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }
}
