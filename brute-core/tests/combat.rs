//! Combat engine properties over many seeded fights.

use brute_core::battle_log::{BattleLog, EndReason, FightStep, StepType};
use brute_core::combat::{simulate, BattleConfig};
use brute_core::equipment::{EffectKind, EquipmentSlot, Item, SpecialEffect};
use brute_core::fighter::{Fighter, FighterClass, Stats};
use brute_core::fighter_builder::FighterBuilder;
use brute_core::items::find_item;

fn fighter(name: &str, class: FighterClass, experience: u32) -> Fighter {
    FighterBuilder::new()
        .owner(format!("0x{name}"))
        .name(name)
        .class(class)
        .with_experience(experience)
        .build()
        .expect("Should build successfully")
}

fn zeroed(strength: u32) -> Stats {
    Stats {
        strength,
        agility: 0,
        intelligence: 0,
        defense: 0,
        crit_chance: 0,
        crit_damage: 100,
        block_rate: 0,
        magic_find: 0,
    }
}

fn check_log_shape(log: &BattleLog, a: &Fighter, b: &Fighter) {
    let end = log.last_step().expect("log is never empty");
    assert_eq!(end.step_type, StepType::End);
    assert_eq!(
        log.steps.iter().filter(|s| s.step_type == StepType::End).count(),
        1
    );

    let mut pair = [log.outcome.winner, log.outcome.loser];
    pair.sort();
    let mut expected = [a.id, b.id];
    expected.sort();
    assert_eq!(pair, expected);
    assert_eq!(end.attacker, log.outcome.winner);
    assert_eq!(end.defender, log.outcome.loser);

    let [pa, pb] = &log.participants;
    for step in &log.steps {
        if let Some(hp) = step.hp {
            assert!(hp.fighter_a <= pa.max_hp);
            assert!(hp.fighter_b <= pb.max_hp);
        }
    }
}

#[test]
fn test_every_fight_terminates_with_end_step() {
    let config = BattleConfig::default();
    let classes = FighterClass::all();
    for (i, &class_a) in classes.iter().enumerate() {
        for &class_b in classes {
            let a = fighter("Ada", class_a, 0);
            let b = fighter("Bo", class_b, 1_500);
            for seed in 0..10 {
                let log = simulate(&a, &b, &config, seed + i as u64 * 100);
                assert!(log.outcome.turns <= config.turn_cap);
                check_log_shape(&log, &a, &b);
            }
        }
    }
}

#[test]
fn test_knockout_leaves_loser_at_zero() {
    let a = fighter("Ada", FighterClass::Warrior, 3_000);
    let b = fighter("Bo", FighterClass::Mage, 0);
    for seed in 0..20 {
        let log = simulate(&a, &b, &BattleConfig::default(), seed);
        if log.outcome.reason != EndReason::Knockout {
            continue;
        }
        let hp = log.last_step().and_then(|s| s.hp).unwrap();
        let loser_hp = if log.outcome.loser == a.id {
            hp.fighter_a
        } else {
            hp.fighter_b
        };
        assert_eq!(loser_hp, 0);
    }
}

#[test]
fn test_xp_summary_precedes_end() {
    let a = fighter("Ada", FighterClass::Rogue, 0);
    let b = fighter("Bo", FighterClass::Cleric, 0);
    let log = simulate(&a, &b, &BattleConfig::default(), 5);

    let n = log.steps.len();
    let summaries: Vec<_> = log
        .steps
        .iter()
        .filter(|s| s.step_type == StepType::Special && s.description.contains("XP"))
        .collect();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].attacker, log.outcome.winner);
    assert!(summaries[0].description.contains(&log.outcome.winner_reward.xp.to_string()));
    assert_eq!(log.steps[n - 1].step_type, StepType::End);
}

#[test]
fn test_level_up_step_when_reward_crosses_threshold() {
    // 95 XP banked: any reward crosses the level 1 threshold.
    let a = fighter("Ada", FighterClass::Warrior, 95);
    let b = fighter("Bo", FighterClass::Warrior, 95);
    let log = simulate(&a, &b, &BattleConfig::default(), 9);

    assert_eq!(log.outcome.winner_reward.levels_gained, 1);
    assert_eq!(log.outcome.loser_reward.levels_gained, 1);
    let level_ups = log
        .steps
        .iter()
        .filter(|s| s.step_type == StepType::LevelUp)
        .count();
    assert_eq!(level_ups, 2);
}

#[test]
fn test_weaker_opponent_knocked_out_by_first_hit() {
    let x = FighterBuilder::new()
        .owner("0xx")
        .name("X")
        .class(FighterClass::Warrior)
        .with_stats(zeroed(10))
        .build()
        .unwrap();
    let y = FighterBuilder::new()
        .owner("0xy")
        .name("Y")
        .class(FighterClass::Warrior)
        .with_stats(zeroed(0))
        .with_current_hp(1)
        .build()
        .unwrap();

    for seed in 0..25 {
        let log = simulate(&x, &y, &BattleConfig::default(), seed);
        assert_eq!(log.outcome.winner, x.id, "seed {seed}");
        assert_eq!(log.outcome.reason, EndReason::Knockout);

        let hits: Vec<_> = log.actions().filter(|s| s.attacker == x.id).collect();
        assert_eq!(hits.len(), 1, "seed {seed}");
        assert!(hits[0].damage > 0);
        assert_eq!(hits[0].hp.unwrap().fighter_b, 0);
        assert!(log.actions().all(|s| s.attacker == x.id || s.damage == 0));
    }
}

#[test]
fn test_seeded_fights_replay_exactly() {
    let a = fighter("Ada", FighterClass::Ranged, 700);
    let mut b = fighter("Bo", FighterClass::Cleric, 700);
    b.equip(EquipmentSlot::Weapon, find_item("sun_mace").unwrap())
        .unwrap();
    let config = BattleConfig::default();

    for seed in [0, 1, 42, 9_999, u64::MAX] {
        let first = simulate(&a, &b, &config, seed);
        let second = simulate(&a, &b, &config, seed);
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(first.seed, Some(seed));
    }
}

#[test]
fn test_starting_hp_taken_from_snapshot() {
    let a = fighter("Ada", FighterClass::Warrior, 0);
    let mut b = fighter("Bo", FighterClass::Mage, 0);
    b.hp.current = 17;
    let log = simulate(&a, &b, &BattleConfig::default(), 3);
    assert_eq!(log.participants[1].starting_hp, 17);
    assert_eq!(log.participants[0].starting_hp, a.hp.maximum);
}

#[test]
fn test_equipment_hp_bonus_reached_from_full_health() {
    let mut a = fighter("Ada", FighterClass::Warrior, 0);
    a.equip(EquipmentSlot::Ring1, find_item("ring of might").unwrap())
        .unwrap();
    let b = fighter("Bo", FighterClass::Mage, 0);

    let log = simulate(&a, &b, &BattleConfig::default(), 4);
    let entry = &log.participants[0];
    // Three strength at three HP per point.
    assert_eq!(entry.max_hp, a.hp.maximum + 9);
    assert_eq!(entry.starting_hp, entry.max_hp);

    a.hp.current = a.hp.maximum - 20;
    let log = simulate(&a, &b, &BattleConfig::default(), 4);
    let entry = &log.participants[0];
    assert_eq!(entry.starting_hp, entry.max_hp - 20);
}

#[test]
fn test_life_steal_reported_on_every_damaging_hit() {
    let leech = Item::weapon("leech", "Leech Fang", 1, 3)
        .with_effect(SpecialEffect::on_hit(EffectKind::LifeSteal, 100, 50));
    let a = FighterBuilder::new()
        .owner("0xa")
        .name("Ada")
        .class(FighterClass::Warrior)
        .with_item(EquipmentSlot::Weapon, leech)
        .with_current_hp(40)
        .build()
        .unwrap();
    let b = fighter("Bo", FighterClass::Warrior, 0);

    let log = simulate(&a, &b, &BattleConfig::default(), 21);
    let mut damaging = 0;
    for step in log.actions().filter(|s| s.attacker == a.id && s.damage > 0) {
        damaging += 1;
        let effect = step.special_effect.as_deref().unwrap_or_default();
        assert!(effect.contains("Leech Fang drains"), "{effect}");
    }
    assert!(damaging > 0);
}

// =============================================================================
// Damage pipeline
// =============================================================================

/// No skills and no damage variance, so every hit is exact.
fn exact() -> BattleConfig {
    BattleConfig::new()
        .with_skill_chance(0)
        .with_damage_variance(1.0, 1.0)
}

fn duelist(name: &str, stats: Stats) -> Fighter {
    FighterBuilder::new()
        .owner(format!("0x{name}"))
        .name(name)
        .class(FighterClass::Warrior)
        .with_stats(stats)
        .build()
        .unwrap()
}

fn first_action<'a>(log: &'a BattleLog, attacker: &Fighter) -> &'a FightStep {
    log.actions()
        .find(|s| s.attacker == attacker.id)
        .expect("attacker should act at least once")
}

#[test]
fn test_plain_attack_adds_weapon_roll() {
    let mut x = duelist("X", zeroed(10));
    x.equip(EquipmentSlot::Weapon, Item::weapon("club", "Club", 4, 4))
        .unwrap();
    let y = duelist("Y", zeroed(0));

    let log = simulate(&x, &y, &exact(), 1);
    let hit = first_action(&log, &x);
    assert_eq!(hit.step_type, StepType::Attack);
    assert_eq!(hit.damage, 14);
    assert_eq!(
        hit.hp.unwrap().fighter_b,
        log.participants[1].starting_hp - 14
    );
}

#[test]
fn test_defense_reduces_damage_proportionally() {
    let x = duelist("X", zeroed(14));
    let mut y = duelist("Y", zeroed(0));
    y.stats.defense = 50;
    let log = simulate(&x, &y, &exact(), 2);
    assert_eq!(first_action(&log, &x).damage, 7);

    // 10 * 0.75 rounds down.
    let x = duelist("X", zeroed(10));
    y.stats.defense = 25;
    let log = simulate(&x, &y, &exact(), 2);
    assert_eq!(first_action(&log, &x).damage, 7);
}

#[test]
fn test_defense_at_cap_negates_all_damage() {
    let x = duelist("X", zeroed(50));
    for defense in [100, 250] {
        let mut y = duelist("Y", zeroed(0));
        y.stats.defense = defense;
        let log = simulate(&x, &y, &exact(), 3);
        assert!(log.actions().any(|s| s.attacker == x.id));
        assert!(log
            .actions()
            .filter(|s| s.attacker == x.id)
            .all(|s| s.damage == 0));
    }
}

#[test]
fn test_critical_multiplies_by_crit_damage() {
    let mut x = duelist("X", zeroed(10));
    x.stats.crit_chance = 100;
    x.stats.crit_damage = 150;
    let y = duelist("Y", zeroed(0));

    let log = simulate(&x, &y, &exact(), 4);
    let hit = first_action(&log, &x);
    assert_eq!(hit.step_type, StepType::Critical);
    assert_eq!(hit.damage, 15);
}

#[test]
fn test_block_halves_damage() {
    let x = duelist("X", zeroed(10));
    let mut y = duelist("Y", zeroed(0));
    y.stats.block_rate = 100;

    let log = simulate(&x, &y, &exact(), 5);
    let hit = first_action(&log, &x);
    assert_eq!(hit.step_type, StepType::Block);
    assert_eq!(hit.damage, 5);

    // A blocked critical is halved after the multiplier.
    let mut x = x;
    x.stats.crit_chance = 100;
    x.stats.crit_damage = 200;
    let log = simulate(&x, &y, &exact(), 5);
    let hit = first_action(&log, &x);
    assert_eq!(hit.step_type, StepType::Block);
    assert_eq!(hit.damage, 10);
}

#[test]
fn test_skill_applies_its_multiplier() {
    let x = duelist("X", zeroed(10));
    let y = duelist("Y", zeroed(0));
    let config = exact().with_skill_chance(100);

    let log = simulate(&x, &y, &config, 6);
    let hit = first_action(&log, &x);
    assert_eq!(hit.step_type, StepType::Skill);
    assert_eq!(hit.skill.as_deref(), Some("Power Strike"));
    assert_eq!(hit.damage, 15);
}

#[test]
fn test_bonus_damage_added_on_hit() {
    let spiked = Item::weapon("spiked", "Spiked Club", 2, 2)
        .with_effect(SpecialEffect::on_hit(EffectKind::BonusDamage, 100, 5));
    let mut x = duelist("X", zeroed(10));
    x.equip(EquipmentSlot::Weapon, spiked).unwrap();
    let y = duelist("Y", zeroed(0));

    let log = simulate(&x, &y, &exact(), 7);
    let hit = first_action(&log, &x);
    assert_eq!(hit.damage, 17);
    let effect = hit.special_effect.as_deref().unwrap_or_default();
    assert!(effect.contains("Spiked Club deals 5 bonus damage"), "{effect}");
}

#[test]
fn test_dodge_zeroes_damage() {
    let x = duelist("X", zeroed(10));
    let mut y = duelist("Y", zeroed(0));
    // Capped at a 40% dodge chance.
    y.stats.agility = 200;

    let mut dodges = 0;
    for seed in 0..10 {
        let log = simulate(&x, &y, &exact(), seed);
        for step in log.steps.iter().filter(|s| s.step_type == StepType::Dodge) {
            assert_eq!(step.defender, y.id);
            assert_eq!(step.damage, 0);
            dodges += 1;
        }
    }
    assert!(dodges > 0);
}
