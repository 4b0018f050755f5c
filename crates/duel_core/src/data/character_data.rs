//! Character entries as written in roster files.

use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::character::Grade;

/// One roster entry before validation.
///
/// # Example RON
///
/// ```ron
/// (
///     id: "gojo_satoru",
///     name: "고죠 사토루",
///     grade: Special,
///     attribute: BARRIER,
///     atk: 22, def: 20, spd: 22, ce: 25, hp: 100,
///     crt: 10, tec: 10, mnt: 10,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterData {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Reporting tier.
    pub grade: Grade,
    /// Attribute category.
    pub attribute: Attribute,
    /// Attack.
    pub atk: i64,
    /// Defense.
    pub def: i64,
    /// Speed.
    pub spd: i64,
    /// Cursed energy.
    pub ce: i64,
    /// Hit points.
    pub hp: i64,
    /// Critical.
    pub crt: i64,
    /// Technique.
    pub tec: i64,
    /// Mental.
    pub mnt: i64,
}

/// A roster file: an ordered list of entries.
///
/// # Example RON
///
/// ```ron
/// RosterData(
///     characters: [ ... ],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterData {
    /// Entries in roster order.
    pub characters: Vec<CharacterData>,
}
