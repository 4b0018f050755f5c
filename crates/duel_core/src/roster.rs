//! Validated, ordered character rosters.
//!
//! A [`Roster`] is the single canonical data source passed explicitly to the
//! batch and tuning layers. Rosters are values: deriving a tuned roster
//! returns a new snapshot and leaves the base untouched.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::character::{Character, Grade, StatDelta};
use crate::data::RosterData;
use crate::error::{DuelError, Result};

/// Sparse per-character stat offsets keyed by character id.
pub type DeltaMap = BTreeMap<String, StatDelta>;

/// An ordered list of characters with unique ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Character>", into = "Vec<Character>")]
pub struct Roster {
    characters: Vec<Character>,
    index: HashMap<String, usize>,
}

impl Roster {
    /// Build a roster, rejecting empty lists and duplicate ids.
    pub fn new(characters: Vec<Character>) -> Result<Self> {
        if characters.is_empty() {
            return Err(DuelError::EmptyRoster);
        }
        let mut index = HashMap::with_capacity(characters.len());
        for (i, c) in characters.iter().enumerate() {
            if index.insert(c.id.clone(), i).is_some() {
                return Err(DuelError::DuplicateCharacter(c.id.clone()));
            }
        }
        Ok(Self { characters, index })
    }

    /// Validate every raw entry and build a roster.
    pub fn from_data(data: &RosterData) -> Result<Self> {
        let characters = data
            .characters
            .iter()
            .enumerate()
            .map(|(i, c)| Character::from_data(c, i))
            .collect::<Result<Vec<_>>>()?;
        Self::new(characters)
    }

    /// Parse and validate RON roster text. `label` names the source in errors.
    pub fn from_ron_str(source: &str, label: &str) -> Result<Self> {
        let data: RosterData = ron::from_str(source).map_err(|e| DuelError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        Self::from_data(&data)
    }

    /// Raw form suitable for writing a roster file.
    #[must_use]
    pub fn to_data(&self) -> RosterData {
        RosterData {
            characters: self.characters.iter().map(Character::to_data).collect(),
        }
    }

    /// Number of characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Always false for a constructed roster; kept for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Characters in roster order.
    #[must_use]
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Iterate characters in roster order.
    pub fn iter(&self) -> std::slice::Iter<'_, Character> {
        self.characters.iter()
    }

    /// Position of `id` in the roster.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Character by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Character> {
        self.index_of(id).map(|i| &self.characters[i])
    }

    /// Character by id, or [`DuelError::UnknownCharacter`].
    pub fn require(&self, id: &str) -> Result<&Character> {
        self.get(id)
            .ok_or_else(|| DuelError::UnknownCharacter(id.to_string()))
    }

    /// Grades present in the roster, highest first.
    #[must_use]
    pub fn grades(&self) -> Vec<Grade> {
        let mut grades: Vec<Grade> = self.characters.iter().map(|c| c.grade).collect();
        grades.sort_unstable();
        grades.dedup();
        grades
    }

    /// Roster positions of the members of `grade`.
    #[must_use]
    pub fn grade_members(&self, grade: Grade) -> Vec<usize> {
        self.characters
            .iter()
            .enumerate()
            .filter(|(_, c)| c.grade == grade)
            .map(|(i, _)| i)
            .collect()
    }

    /// New roster containing only the characters of `grade`.
    pub fn of_grade(&self, grade: Grade) -> Result<Roster> {
        Self::new(
            self.characters
                .iter()
                .filter(|c| c.grade == grade)
                .cloned()
                .collect(),
        )
    }

    /// New roster snapshot with `deltas` applied to the named characters.
    ///
    /// Unknown ids in `deltas` are rejected.
    pub fn with_deltas(&self, deltas: &DeltaMap) -> Result<Roster> {
        for id in deltas.keys() {
            if !self.index.contains_key(id) {
                return Err(DuelError::UnknownCharacter(id.clone()));
            }
        }
        let characters = self
            .characters
            .iter()
            .map(|c| match deltas.get(&c.id) {
                Some(delta) if !delta.is_zero() => c.with_delta(delta),
                _ => Ok(c.clone()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            characters,
            index: self.index.clone(),
        })
    }
}

impl TryFrom<Vec<Character>> for Roster {
    type Error = DuelError;

    fn try_from(characters: Vec<Character>) -> Result<Self> {
        Self::new(characters)
    }
}

impl From<Roster> for Vec<Character> {
    fn from(roster: Roster) -> Self {
        roster.characters
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Character;
    type IntoIter = std::slice::Iter<'a, Character>;

    fn into_iter(self) -> Self::IntoIter {
        self.characters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attribute;
    use crate::character::{StatKind, Stats};

    fn character(id: &str, grade: Grade) -> Character {
        Character::new(
            id,
            id.to_uppercase(),
            grade,
            Attribute::Soul,
            Stats {
                atk: 18,
                def: 15,
                spd: 17,
                ce: 20,
                hp: 85,
                crt: 10,
                tec: 10,
                mnt: 10,
            },
        )
    }

    #[test]
    fn test_empty_roster_rejected() {
        assert_eq!(Roster::new(Vec::new()), Err(DuelError::EmptyRoster));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Roster::new(vec![
            character("a", Grade::First),
            character("a", Grade::First),
        ]);
        assert_eq!(result, Err(DuelError::DuplicateCharacter("a".to_string())));
    }

    #[test]
    fn test_lookup_and_grades() {
        let roster = Roster::new(vec![
            character("a", Grade::SemiFirst),
            character("b", Grade::Special),
            character("c", Grade::SemiFirst),
        ])
        .unwrap();
        assert_eq!(roster.index_of("c"), Some(2));
        assert_eq!(roster.grades(), vec![Grade::Special, Grade::SemiFirst]);
        assert_eq!(roster.grade_members(Grade::SemiFirst), vec![0, 2]);
        assert!(roster.require("zzz").is_err());
        assert_eq!(roster.of_grade(Grade::Special).unwrap().len(), 1);
    }

    #[test]
    fn test_with_deltas_returns_new_snapshot() {
        let base = Roster::new(vec![
            character("a", Grade::First),
            character("b", Grade::First),
        ])
        .unwrap();
        let mut deltas = DeltaMap::new();
        deltas.insert("b".to_string(), StatDelta::default().with(StatKind::Hp, 5));

        let tuned = base.with_deltas(&deltas).unwrap();
        assert_eq!(tuned.require("b").unwrap().stats.hp, 90);
        assert_eq!(base.require("b").unwrap().stats.hp, 85);
        assert_eq!(tuned.require("a").unwrap(), base.require("a").unwrap());
    }

    #[test]
    fn test_with_deltas_unknown_id() {
        let base = Roster::new(vec![character("a", Grade::First)]).unwrap();
        let mut deltas = DeltaMap::new();
        deltas.insert("ghost".to_string(), StatDelta::default().with(StatKind::Atk, 1));
        assert_eq!(
            base.with_deltas(&deltas),
            Err(DuelError::UnknownCharacter("ghost".to_string()))
        );
    }

    #[test]
    fn test_from_ron_str_missing_stat_fails() {
        let source = r#"(characters: [(id: "x", name: "X", grade: First, attribute: BODY,
            atk: 1, def: 1, spd: 1, ce: 1, hp: 10, crt: 1, tec: 1)])"#;
        let err = Roster::from_ron_str(source, "inline").unwrap_err();
        assert!(matches!(err, DuelError::DataParseError { .. }));
    }

    #[test]
    fn test_from_ron_str_negative_stat_fails() {
        let source = r#"(characters: [(id: "x", name: "X", grade: First, attribute: BODY,
            atk: 1, def: 1, spd: -4, ce: 1, hp: 10, crt: 1, tec: 1, mnt: 1)])"#;
        let err = Roster::from_ron_str(source, "inline").unwrap_err();
        assert!(matches!(err, DuelError::InvalidStat { stat: "spd", value: -4, .. }));
    }

    #[test]
    fn test_from_ron_str_oversized_stat_fails() {
        let source = r#"(characters: [(id: "x", name: "X", grade: First, attribute: BODY,
            atk: 4000000000, def: 1000000000, spd: 1, ce: 1, hp: 10, crt: 1, tec: 1, mnt: 1)])"#;
        let err = Roster::from_ron_str(source, "inline").unwrap_err();
        assert!(matches!(err, DuelError::InvalidStat { stat: "atk", value: 4_000_000_000, .. }));
    }
}
