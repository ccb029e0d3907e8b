//! Integration tests for the status pipeline and turn dispatch
//!
//! These tests drive full dispatched turns through the public API and check
//! the mitigation ordering, single-use guards and extra-turn bounds.

use battlesim::combatant::{Combatant, Controller, StatBlock};
use battlesim::dispatch::take_turn;
use battlesim::effects::modify_incoming_damage;
use battlesim::rules::{load_rules, RulesTable};
use battlesim::{
    CombatEvent, CombatEventKind, CombatLog, EffectKind, GameRng, PassiveId, SkillId, StatusEffect,
};

fn rules() -> RulesTable {
    load_rules(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/assets/config/rules.ron"
    ))
    .expect("shipped rules table must load")
}

fn grunt(name: &str, team: u8, health: i32) -> Combatant {
    let mut c = Combatant::new(
        name,
        team,
        1,
        health,
        StatBlock {
            strength: 10,
            agility: 10,
            intelligence: 0,
            defense: 0.0,
        },
        Controller::Monster {
            species: "GOBLIN".into(),
        },
    );
    c.accuracy = 1.0;
    c.dodge_chance = 0.0;
    c.crit_chance = 0.0;
    c
}

#[test]
fn test_evade_blocks_exactly_one_hit() {
    let mut log = CombatLog::default();
    let mut c = grunt("Rogue", 1, 100);
    c.effects.push(StatusEffect::Evade { turns: 1 });

    assert_eq!(modify_incoming_damage(&mut c, 40, &mut log), 0);
    assert!(!c.has_effect(EffectKind::Evade));
    assert_eq!(modify_incoming_damage(&mut c, 40, &mut log), 40);
}

#[test]
fn test_shield_accounts_for_cumulative_capacity() {
    let mut log = CombatLog::default();
    let mut c = grunt("Mage", 1, 100);
    c.effects.push(StatusEffect::MagicShield {
        capacity: 25,
        absorbed: 0,
    });

    assert_eq!(modify_incoming_damage(&mut c, 10, &mut log), 0);
    assert_eq!(modify_incoming_damage(&mut c, 10, &mut log), 0);
    // 5 capacity left: 15 of 20 passes through, shield is gone
    assert_eq!(modify_incoming_damage(&mut c, 20, &mut log), 15);
    assert!(!c.has_effect(EffectKind::MagicShield));
}

#[test]
fn test_survive_fatal_fires_once_per_encounter() {
    let r = rules();
    let mut log = CombatLog::default();
    let mut cs = vec![grunt("Champ", 1, 30), grunt("Ogre", 2, 500)];
    cs[0].passives.push(PassiveId::LastStand);
    cs[1].stats.strength = 100;

    // Champ's turn grants the marker
    let mut rng = GameRng::scripted([0.0, 1.0, 0.99]);
    take_turn(&mut cs, &r, &mut rng, &mut log, 0).unwrap();
    assert!(cs[0].has_effect(EffectKind::SurviveFatal));

    // Ogre's lethal swing pins the champ at 1
    let mut rng = GameRng::scripted([0.0, 1.0, 0.99]);
    take_turn(&mut cs, &r, &mut rng, &mut log, 1).unwrap();
    assert_eq!(cs[0].health, 1);
    assert!(cs[0].last_stand_used);

    // The marker is never re-granted, so the next hit kills
    let mut rng = GameRng::scripted([0.0, 1.0, 0.99]);
    take_turn(&mut cs, &r, &mut rng, &mut log, 0).unwrap();
    assert!(!cs[0].has_effect(EffectKind::SurviveFatal));
    let mut rng = GameRng::scripted([0.0, 1.0, 0.99]);
    take_turn(&mut cs, &r, &mut rng, &mut log, 1).unwrap();
    assert_eq!(cs[0].health, 0);
}

#[test]
fn test_stun_cancels_action_without_cost_but_ticks_apply() {
    let r = rules();
    let mut log = CombatLog::default();
    let mut stunned = grunt("Goblin", 2, 100).with_mana(30, 0);
    stunned.effects.push(StatusEffect::Stun { turns: 1 });
    stunned.effects.push(StatusEffect::Burn { turns: 2 });
    let mut cs = vec![stunned, grunt("Hero", 1, 100)];

    take_turn(&mut cs, &r, &mut GameRng::from_seed(5), &mut log, 0).unwrap();

    assert_eq!(cs[1].health, 100, "no damage dealt while stunned");
    assert_eq!(cs[0].mana, 30, "no mana spent");
    assert!(cs[0].cooldowns.is_empty(), "no cooldown consumed");
    // Burn ticked at both turn boundaries: 2 x 5% of 100
    assert_eq!(cs[0].health, 90);
    assert!(!cs[0].has_effect(EffectKind::Stun), "stun expired at end of turn");
}

#[test]
fn test_one_extra_turn_marker_one_repeat() {
    let r = rules();
    let mut log = CombatLog::default();
    let mut cs = vec![grunt("Hasted", 1, 100), grunt("Dummy", 2, 10_000)];
    cs[0].effects.push(StatusEffect::ExtraTurn);

    let mut rng = GameRng::scripted([0.0, 1.0, 0.99, 0.0, 1.0, 0.99]);
    take_turn(&mut cs, &r, &mut rng, &mut log, 0).unwrap();

    let swings = log.filter_by_kind(CombatEventKind::Damage).len();
    assert_eq!(swings, 2, "base turn plus exactly one repeat");
    assert!(!cs[0].has_effect(EffectKind::ExtraTurn));
}

#[test]
fn test_mage_picks_meteor_against_three_enemies() {
    let r = rules();
    let mut log = CombatLog::default();
    let mut mage = Combatant::new(
        "Mage",
        1,
        5,
        120,
        StatBlock {
            strength: 6,
            agility: 60,
            intelligence: 28,
            defense: 3.0,
        },
        Controller::Player {
            archetype: battlesim::Archetype::Mage,
        },
    )
    .with_mana(80, 8)
    .with_rates(1.0, 0.0, 0.0)
    .with_skills(vec![
        SkillId::Fireball,
        SkillId::MagicBarrier,
        SkillId::ChainLightning,
        SkillId::ManaDrain,
        SkillId::Meteor,
        SkillId::TimeWarp,
    ]);
    mage.crit_chance = 0.0;
    let mut cs = vec![
        mage,
        grunt("A", 2, 60),
        grunt("B", 2, 60),
        grunt("C", 2, 60),
    ];

    // Per enemy: success gate, hit roll, variance, crit roll
    let mut rng = GameRng::scripted([
        0.0, 0.0, 1.0, 0.99, 0.0, 0.0, 1.0, 0.99, 0.0, 0.0, 1.0, 0.99,
    ]);
    take_turn(&mut cs, &r, &mut rng, &mut log, 0).unwrap();

    let used: Vec<_> = log
        .entries
        .iter()
        .filter_map(|e| match &e.event {
            CombatEvent::SkillUsed { skill, .. } => Some(*skill),
            _ => None,
        })
        .collect();
    assert_eq!(used, vec![SkillId::Meteor]);
    assert!(cs[1].health < 60);
    assert!(cs[2].health < 60);
    assert!(cs[3].health < 60);
    assert_eq!(cs[0].mana, 80 - 40);
}

#[test]
fn test_health_and_mana_stay_in_bounds_over_long_fights() {
    let r = rules();
    for seed in [1_u64, 7, 42, 1337] {
        let mut log = CombatLog::default();
        let mut rng = GameRng::from_seed(seed);
        let mut cs = vec![
            grunt("A1", 1, 80).with_mana(30, 5),
            grunt("A2", 1, 80),
            grunt("B1", 2, 80),
            grunt("B2", 2, 80),
        ];
        for turn in 0..200 {
            let actor = turn % cs.len();
            take_turn(&mut cs, &r, &mut rng, &mut log, actor).unwrap();
            for c in &cs {
                assert!(c.health >= 0 && c.health <= c.max_health);
                assert!(c.mana >= 0 && c.mana <= c.max_mana);
            }
        }
    }
}
