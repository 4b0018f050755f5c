//! Test fixtures and helpers.
//!
//! Pre-built characters and rosters for consistent testing.

use duel_core::attributes::Attribute;
use duel_core::character::{Character, Grade, StatDelta, StatKind, Stats};
use duel_core::roster::Roster;

/// Stats with the conventional 10/10/10 secondary stats.
#[must_use]
pub fn stats(atk: u32, def: u32, spd: u32, ce: u32, hp: u32) -> Stats {
    Stats {
        atk,
        def,
        spd,
        ce,
        hp,
        crt: 10,
        tec: 10,
        mnt: 10,
    }
}

/// Character with its id doubling as display name.
#[must_use]
pub fn character(id: &str, grade: Grade, attribute: Attribute, stats: Stats) -> Character {
    Character::new(id, id, grade, attribute, stats)
}

/// The six 특급 characters of the canonical roster.
///
/// # Panics
///
/// Never in practice: the fixture ids are unique.
#[must_use]
pub fn special_grade_six() -> Roster {
    let grade = Grade::Special;
    Roster::new(vec![
        character("gojo_satoru", grade, Attribute::Barrier, stats(22, 20, 22, 25, 100)),
        character("ryomen_sukuna", grade, Attribute::Curse, stats(25, 18, 22, 24, 100)),
        character("kenjaku", grade, Attribute::Soul, stats(20, 17, 18, 25, 100)),
        character("tsukumo_yuki", grade, Attribute::Body, stats(23, 16, 19, 24, 95)),
        character("okkotsu_yuta", grade, Attribute::Curse, stats(22, 18, 20, 25, 100)),
        character("itadori_final", grade, Attribute::Soul, stats(21, 18, 21, 22, 95)),
    ])
    .expect("fixture ids are unique")
}

/// `n` identical characters sharing one attribute, ids `c0..c{n-1}`.
///
/// # Panics
///
/// Panics if `n` is zero.
#[must_use]
pub fn uniform_roster(n: usize, grade: Grade) -> Roster {
    let characters = (0..n)
        .map(|i| character(&format!("c{i}"), grade, Attribute::Body, stats(20, 16, 18, 20, 90)))
        .collect();
    Roster::new(characters).expect("uniform roster needs at least one character")
}

/// `roster` plus a copy of `id` with `atk_bonus` extra attack, named `{id}_plus`.
///
/// # Panics
///
/// Panics if `id` is not in `roster`.
#[must_use]
pub fn with_attack_twin(roster: &Roster, id: &str, atk_bonus: i32) -> Roster {
    let base = roster.require(id).expect("twin source must exist");
    let mut twin = base
        .with_delta(&StatDelta::default().with(StatKind::Atk, atk_bonus))
        .expect("attack bonus keeps stats valid");
    twin.id = format!("{id}_plus");
    twin.name = format!("{} +{atk_bonus}", base.name);

    let mut characters = roster.characters().to_vec();
    characters.push(twin);
    Roster::new(characters).expect("twin id is fresh")
}

/// Replace the stats of `id` in `roster`.
///
/// # Panics
///
/// Panics if `id` is not in `roster`.
#[must_use]
pub fn with_stats(roster: &Roster, id: &str, stats: Stats) -> Roster {
    assert!(roster.get(id).is_some(), "unknown fixture id {id}");
    let characters = roster
        .iter()
        .map(|c| {
            let mut c = c.clone();
            if c.id == id {
                c.stats = stats;
            }
            c
        })
        .collect();
    Roster::new(characters).expect("ids unchanged")
}
