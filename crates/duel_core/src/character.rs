//! Character and stat model.
//!
//! Characters are immutable once validated. Tuning never edits a character
//! in place; it applies a [`StatDelta`] to produce a new [`Stats`] value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::data::CharacterData;
use crate::error::{DuelError, Result};

/// Reporting tier. Used for grouping only, never in combat math.
///
/// Variants are declared from highest to lowest tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    /// 특급
    Special,
    /// 준특급
    SemiSpecial,
    /// 1급
    First,
    /// 준1급
    SemiFirst,
    /// 2급
    Second,
    /// 3급
    Third,
}

impl Grade {
    /// All grades from highest to lowest.
    pub const ALL: [Grade; 6] = [
        Grade::Special,
        Grade::SemiSpecial,
        Grade::First,
        Grade::SemiFirst,
        Grade::Second,
        Grade::Third,
    ];

    /// Korean tier label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Grade::Special => "특급",
            Grade::SemiSpecial => "준특급",
            Grade::First => "1급",
            Grade::SemiFirst => "준1급",
            Grade::Second => "2급",
            Grade::Third => "3급",
        }
    }

    /// Parse either the variant name or the Korean label.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|g| {
            g.label() == text || format!("{g:?}").eq_ignore_ascii_case(text)
        })
    }

    /// Weight of this grade in the aggregate balance score.
    #[must_use]
    pub const fn score_weight(self) -> f64 {
        match self {
            Grade::First => 3.0,
            Grade::SemiFirst => 2.0,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Names of the eight stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatKind {
    /// Attack.
    Atk,
    /// Defense.
    Def,
    /// Speed.
    Spd,
    /// Cursed energy.
    Ce,
    /// Hit points.
    Hp,
    /// Critical.
    Crt,
    /// Technique.
    Tec,
    /// Mental.
    Mnt,
}

impl StatKind {
    /// All stats in display order.
    pub const ALL: [StatKind; 8] = [
        StatKind::Atk,
        StatKind::Def,
        StatKind::Spd,
        StatKind::Ce,
        StatKind::Hp,
        StatKind::Crt,
        StatKind::Tec,
        StatKind::Mnt,
    ];

    /// Lower-case stat name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            StatKind::Atk => "atk",
            StatKind::Def => "def",
            StatKind::Spd => "spd",
            StatKind::Ce => "ce",
            StatKind::Hp => "hp",
            StatKind::Crt => "crt",
            StatKind::Tec => "tec",
            StatKind::Mnt => "mnt",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Largest value any single stat may take.
pub const MAX_STAT: u32 = 9_999;

/// The eight base stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Attack.
    pub atk: u32,
    /// Defense.
    pub def: u32,
    /// Speed.
    pub spd: u32,
    /// Cursed energy. Zero marks the CE0 archetype.
    pub ce: u32,
    /// Hit points.
    pub hp: u32,
    /// Critical.
    pub crt: u32,
    /// Technique.
    pub tec: u32,
    /// Mental.
    pub mnt: u32,
}

impl Stats {
    /// Sum of `atk + def + spd + ce + hp`.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.atk
            .saturating_add(self.def)
            .saturating_add(self.spd)
            .saturating_add(self.ce)
            .saturating_add(self.hp)
    }

    /// Whether this is a CE0 build.
    #[must_use]
    pub const fn is_ce0(&self) -> bool {
        self.ce == 0
    }

    /// Read one stat.
    #[must_use]
    pub const fn get(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Atk => self.atk,
            StatKind::Def => self.def,
            StatKind::Spd => self.spd,
            StatKind::Ce => self.ce,
            StatKind::Hp => self.hp,
            StatKind::Crt => self.crt,
            StatKind::Tec => self.tec,
            StatKind::Mnt => self.mnt,
        }
    }

    fn slot(&mut self, kind: StatKind) -> &mut u32 {
        match kind {
            StatKind::Atk => &mut self.atk,
            StatKind::Def => &mut self.def,
            StatKind::Spd => &mut self.spd,
            StatKind::Ce => &mut self.ce,
            StatKind::Hp => &mut self.hp,
            StatKind::Crt => &mut self.crt,
            StatKind::Tec => &mut self.tec,
            StatKind::Mnt => &mut self.mnt,
        }
    }

    /// Return a copy with `delta` applied.
    ///
    /// `owner` names the character in the error when a stat would go
    /// negative, exceed [`MAX_STAT`], or hit points would reach zero.
    pub fn apply(&self, delta: &StatDelta, owner: &str) -> Result<Stats> {
        let mut out = *self;
        for kind in StatKind::ALL {
            let shift = delta.get(kind);
            if shift == 0 {
                continue;
            }
            let value = i64::from(self.get(kind)) + i64::from(shift);
            if value < 0 || value > i64::from(MAX_STAT) || (kind == StatKind::Hp && value == 0) {
                return Err(DuelError::InvalidStat {
                    character: owner.to_string(),
                    stat: kind.name(),
                    value,
                });
            }
            *out.slot(kind) = u32::try_from(value).map_err(|_| DuelError::InvalidStat {
                character: owner.to_string(),
                stat: kind.name(),
                value,
            })?;
        }
        Ok(out)
    }
}

/// Signed per-stat offsets relative to a base character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatDelta {
    /// Attack offset.
    pub atk: i32,
    /// Defense offset.
    pub def: i32,
    /// Speed offset.
    pub spd: i32,
    /// Cursed energy offset.
    pub ce: i32,
    /// Hit point offset.
    pub hp: i32,
    /// Critical offset.
    pub crt: i32,
    /// Technique offset.
    pub tec: i32,
    /// Mental offset.
    pub mnt: i32,
}

impl StatDelta {
    /// Read one offset.
    #[must_use]
    pub const fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Atk => self.atk,
            StatKind::Def => self.def,
            StatKind::Spd => self.spd,
            StatKind::Ce => self.ce,
            StatKind::Hp => self.hp,
            StatKind::Crt => self.crt,
            StatKind::Tec => self.tec,
            StatKind::Mnt => self.mnt,
        }
    }

    /// Add `amount` to one offset.
    pub fn add(&mut self, kind: StatKind, amount: i32) {
        let slot = match kind {
            StatKind::Atk => &mut self.atk,
            StatKind::Def => &mut self.def,
            StatKind::Spd => &mut self.spd,
            StatKind::Ce => &mut self.ce,
            StatKind::Hp => &mut self.hp,
            StatKind::Crt => &mut self.crt,
            StatKind::Tec => &mut self.tec,
            StatKind::Mnt => &mut self.mnt,
        };
        *slot += amount;
    }

    /// Builder form of [`StatDelta::add`].
    pub fn with(mut self, kind: StatKind, amount: i32) -> Self {
        self.add(kind, amount);
        self
    }

    /// Whether every offset is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        StatKind::ALL.iter().all(|k| self.get(*k) == 0)
    }

    /// Non-zero offsets in display order.
    #[must_use]
    pub fn changes(&self) -> Vec<(StatKind, i32)> {
        StatKind::ALL
            .iter()
            .filter_map(|k| {
                let v = self.get(*k);
                (v != 0).then_some((*k, v))
            })
            .collect()
    }
}

/// A validated roster character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Character {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Reporting tier.
    pub grade: Grade,
    /// Attribute category.
    pub attribute: Attribute,
    /// Base stats.
    pub stats: Stats,
}

impl Character {
    /// Create a character from already-valid parts.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        grade: Grade,
        attribute: Attribute,
        stats: Stats,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            grade,
            attribute,
            stats,
        }
    }

    /// Stat total, always derived from the current stats.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.stats.total()
    }

    /// Copy of this character with `delta` applied to its stats.
    pub fn with_delta(&self, delta: &StatDelta) -> Result<Character> {
        Ok(Character {
            stats: self.stats.apply(delta, &self.id)?,
            ..self.clone()
        })
    }

    /// Validate a raw entry. `position` labels the entry when its id is empty.
    pub fn from_data(data: &CharacterData, position: usize) -> Result<Self> {
        let label = if data.id.trim().is_empty() {
            format!("#{position}")
        } else {
            data.id.clone()
        };
        if data.id.trim().is_empty() {
            return Err(DuelError::MissingField {
                character: label,
                field: "id",
            });
        }
        if data.name.trim().is_empty() {
            return Err(DuelError::MissingField {
                character: label,
                field: "name",
            });
        }

        let read = |stat: &'static str, value: i64| -> Result<u32> {
            u32::try_from(value)
                .ok()
                .filter(|v| *v <= MAX_STAT)
                .ok_or_else(|| DuelError::InvalidStat {
                    character: label.clone(),
                    stat,
                    value,
                })
        };

        let stats = Stats {
            atk: read("atk", data.atk)?,
            def: read("def", data.def)?,
            spd: read("spd", data.spd)?,
            ce: read("ce", data.ce)?,
            hp: read("hp", data.hp)?,
            crt: read("crt", data.crt)?,
            tec: read("tec", data.tec)?,
            mnt: read("mnt", data.mnt)?,
        };
        if stats.hp == 0 {
            return Err(DuelError::InvalidStat {
                character: label,
                stat: "hp",
                value: 0,
            });
        }

        Ok(Self::new(
            data.id.clone(),
            data.name.clone(),
            data.grade,
            data.attribute,
            stats,
        ))
    }

    /// Raw form suitable for writing back to a roster file.
    #[must_use]
    pub fn to_data(&self) -> CharacterData {
        let s = &self.stats;
        CharacterData {
            id: self.id.clone(),
            name: self.name.clone(),
            grade: self.grade,
            attribute: self.attribute,
            atk: s.atk.into(),
            def: s.def.into(),
            spd: s.spd.into(),
            ce: s.ce.into(),
            hp: s.hp.into(),
            crt: s.crt.into(),
            tec: s.tec.into(),
            mnt: s.mnt.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str) -> CharacterData {
        CharacterData {
            id: id.to_string(),
            name: "Test".to_string(),
            grade: Grade::First,
            attribute: Attribute::Body,
            atk: 20,
            def: 16,
            spd: 18,
            ce: 20,
            hp: 90,
            crt: 10,
            tec: 10,
            mnt: 10,
        }
    }

    #[test]
    fn test_total_excludes_secondary_stats() {
        let c = Character::from_data(&raw("a"), 0).unwrap();
        assert_eq!(c.total(), 20 + 16 + 18 + 20 + 90);
    }

    #[test]
    fn test_total_follows_delta() {
        let c = Character::from_data(&raw("a"), 0).unwrap();
        let nerfed = c
            .with_delta(&StatDelta::default().with(StatKind::Spd, -1).with(StatKind::Crt, 5))
            .unwrap();
        assert_eq!(nerfed.total(), c.total() - 1);
        assert_eq!(nerfed.stats.crt, 15);
        // The source is untouched
        assert_eq!(c.stats.spd, 18);
    }

    #[test]
    fn test_negative_stat_rejected() {
        let mut data = raw("a");
        data.def = -1;
        let err = Character::from_data(&data, 3).unwrap_err();
        assert_eq!(
            err,
            DuelError::InvalidStat {
                character: "a".to_string(),
                stat: "def",
                value: -1
            }
        );
    }

    #[test]
    fn test_oversized_stat_rejected_at_load() {
        let mut data = raw("a");
        data.atk = 4_000_000_000;
        data.def = 1_000_000_000;
        let err = Character::from_data(&data, 0).unwrap_err();
        assert_eq!(
            err,
            DuelError::InvalidStat {
                character: "a".to_string(),
                stat: "atk",
                value: 4_000_000_000
            }
        );

        data.atk = i64::from(MAX_STAT);
        data.def = i64::from(MAX_STAT);
        assert!(Character::from_data(&data, 0).is_ok());
    }

    #[test]
    fn test_delta_above_ceiling_rejected() {
        let mut data = raw("a");
        data.atk = i64::from(MAX_STAT);
        let c = Character::from_data(&data, 0).unwrap();
        let err = c
            .with_delta(&StatDelta::default().with(StatKind::Atk, 1))
            .unwrap_err();
        assert!(matches!(err, DuelError::InvalidStat { stat: "atk", .. }));
    }

    #[test]
    fn test_total_saturates() {
        let s = Stats {
            atk: u32::MAX,
            def: u32::MAX,
            hp: 1,
            ..Stats::default()
        };
        assert_eq!(s.total(), u32::MAX);
    }

    #[test]
    fn test_missing_id_uses_position() {
        let err = Character::from_data(&raw(" "), 7).unwrap_err();
        assert_eq!(
            err,
            DuelError::MissingField {
                character: "#7".to_string(),
                field: "id"
            }
        );
    }

    #[test]
    fn test_zero_hp_rejected() {
        let mut data = raw("a");
        data.hp = 0;
        assert!(Character::from_data(&data, 0).is_err());
    }

    #[test]
    fn test_delta_below_zero_rejected() {
        let c = Character::from_data(&raw("a"), 0).unwrap();
        let err = c
            .with_delta(&StatDelta::default().with(StatKind::Atk, -21))
            .unwrap_err();
        assert!(matches!(err, DuelError::InvalidStat { stat: "atk", .. }));
    }

    #[test]
    fn test_delta_changes_listing() {
        let delta = StatDelta::default()
            .with(StatKind::Hp, 2)
            .with(StatKind::Atk, 1);
        assert_eq!(delta.changes(), vec![(StatKind::Atk, 1), (StatKind::Hp, 2)]);
        assert!(!delta.is_zero());
        assert!(StatDelta::default().is_zero());
    }

    #[test]
    fn test_grade_parse() {
        assert_eq!(Grade::parse("특급"), Some(Grade::Special));
        assert_eq!(Grade::parse("semifirst"), Some(Grade::SemiFirst));
        assert_eq!(Grade::parse("nope"), None);
        assert!(Grade::Special < Grade::Third);
    }

    #[test]
    fn test_data_round_trip_preserves_stats() {
        let c = Character::from_data(&raw("a"), 0).unwrap();
        assert_eq!(c.to_data(), raw("a"));
    }
}
