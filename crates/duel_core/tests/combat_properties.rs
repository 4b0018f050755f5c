//! Property tests for the damage resolver and battle state machine.

use duel_core::attributes::{advantage_multiplier, Attribute};
use duel_core::battle::BattleMode;
use duel_core::character::Stats;
use duel_core::config::{AttributeMultipliers, BalanceConfig, DamageCoefficients};
use duel_core::damage::{
    cursed_energy_multiplier, pre_variance_damage, resolve_strike, PipelineStages, StrikeProfile,
};
use duel_core::rng::battle_rng;
use duel_core::simulator::{simulate_seeded, MatchOptions};
use duel_test_utils::determinism::strategies::{arb_attribute, arb_character, arb_stats};
use duel_test_utils::fixtures::{character, stats};
use duel_test_utils::proptest::prelude::*;

fn profile(attribute: Attribute, stats: Stats) -> StrikeProfile {
    StrikeProfile {
        stats,
        attribute,
        total: stats.total(),
    }
}

proptest! {
    /// Damage never drops below the minimum, before or after the multipliers.
    #[test]
    fn prop_damage_respects_minimum(
        attacker in arb_stats(),
        defender in arb_stats(),
        attr_a in arb_attribute(),
        attr_b in arb_attribute(),
        force_ultimate in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let config = BalanceConfig::default();
        let a = profile(attr_a, attacker);
        let d = profile(attr_b, defender);
        let breakdown = pre_variance_damage(&a, &d, &config, true);
        prop_assert!(breakdown.floored >= 5);

        let mut rng = battle_rng(seed);
        let out = resolve_strike(&a, &d, force_ultimate, PipelineStages::default(), &config, &mut rng);
        prop_assert!(out.damage >= 5);
    }

    /// The advantage multiplier never applies in both directions.
    #[test]
    fn prop_advantage_is_one_directional(a in arb_attribute(), b in arb_attribute()) {
        let m = AttributeMultipliers::default();
        if advantage_multiplier(a, b, &m) == m.advantage {
            prop_assert_ne!(advantage_multiplier(b, a, &m), m.advantage);
            prop_assert_eq!(advantage_multiplier(b, a, &m), m.disadvantage);
        }
    }

    /// CE0 always gets the flat bonus, whatever the other stats are.
    #[test]
    fn prop_ce0_gets_flat_bonus(mut attacker in arb_stats(), defender in arb_stats()) {
        attacker.ce = 0;
        let config = BalanceConfig::default();
        let a = profile(Attribute::Body, attacker);
        let d = profile(Attribute::Body, defender);
        let b = pre_variance_damage(&a, &d, &config, false);
        let expected = (b.after_attribute as f64 * 1.12 + 0.5).floor() as i64;
        prop_assert_eq!(b.after_cursed_energy, expected);
        prop_assert_eq!(cursed_energy_multiplier(0, &DamageCoefficients::default()), 1.12);
    }

    /// Battles end within the turn cap for any positive HP.
    #[test]
    fn prop_battle_terminates(
        a in arb_character("a"),
        b in arb_character("b"),
        seed in any::<u64>(),
    ) {
        let config = BalanceConfig::default();
        let result = simulate_seeded(&a, &b, &MatchOptions::new(), &config, seed);
        prop_assert!(result.turns <= 30);
        prop_assert!(result.turns >= 1);

        let team = simulate_seeded(
            &a,
            &b,
            &MatchOptions::new().with_mode(BattleMode::Team),
            &config,
            seed,
        );
        prop_assert!(team.turns <= 200);
    }
}

#[test]
fn test_reference_scenario_is_reproducible() {
    // atk 22 / ce 25 on the advantaged side against def 20 / mnt 10
    let attacker = profile(
        Attribute::Barrier,
        Stats {
            atk: 22,
            def: 20,
            spd: 22,
            ce: 25,
            hp: 100,
            crt: 10,
            tec: 10,
            mnt: 10,
        },
    );
    let defender = profile(
        Attribute::Curse,
        Stats {
            atk: 25,
            def: 20,
            spd: 22,
            ce: 24,
            hp: 100,
            crt: 10,
            tec: 10,
            mnt: 10,
        },
    );
    let config = BalanceConfig::default();

    let breakdown = pre_variance_damage(&attacker, &defender, &config, true);
    // Totals 189 vs 191: factor 0.998, 14 * 0.998 = 13.97
    assert_eq!(breakdown.after_cursed_energy, 14);
    assert_eq!(breakdown.equalized, 14);

    let strike = |seed| {
        resolve_strike(
            &attacker,
            &defender,
            false,
            PipelineStages::default(),
            &config,
            &mut battle_rng(seed),
        )
    };
    assert_eq!(strike(2024), strike(2024));
}

#[test]
fn test_equal_fighters_with_no_defense_finish_in_cap() {
    let a = character(
        "a",
        duel_core::character::Grade::Special,
        Attribute::Body,
        stats(20, 0, 20, 20, 100),
    );
    let b = character(
        "b",
        duel_core::character::Grade::Special,
        Attribute::Body,
        stats(20, 0, 20, 20, 100),
    );
    let config = BalanceConfig::default();
    for seed in 0..200 {
        let result = simulate_seeded(&a, &b, &MatchOptions::new(), &config, seed);
        assert!(result.turns <= 30);
    }
}
