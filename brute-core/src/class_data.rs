//! Per-class progression data.
//!
//! Every progression class is described by one `ClassData` entry: its
//! primary stat, HP scaling, starting stats and ability list. Adding a class
//! means adding a table entry here.

use crate::fighter::{Ability, AbilityEffect, AbilityType, ProgressionClass, StatKind, Stats};

/// Class-specific data for creation and leveling.
pub struct ClassData {
    /// Stat raised by one on every level-up.
    pub primary_stat: StatKind,
    /// HP at level 0 with no primary stat.
    pub base_hp: u32,
    /// HP gained per level.
    pub level_coefficient: u32,
    /// HP gained per point of primary stat.
    pub stat_coefficient: u32,
    /// Stats at level 1.
    pub starting_stats: Stats,
    /// Abilities in unlock order, all locked.
    pub abilities: Vec<Ability>,
}

fn strike(scaling: StatKind, multiplier: u32, energy_cost: u32) -> AbilityEffect {
    AbilityEffect::Strike {
        scaling,
        multiplier,
        energy_cost,
    }
}

fn bonus(stat: StatKind, amount: u32) -> AbilityEffect {
    AbilityEffect::StatBonus { stat, amount }
}

impl ProgressionClass {
    /// Get the data table entry for this class.
    pub fn data(&self) -> ClassData {
        match self {
            ProgressionClass::Fighter => ClassData {
                primary_stat: StatKind::Strength,
                base_hp: 120,
                level_coefficient: 12,
                stat_coefficient: 3,
                starting_stats: Stats {
                    strength: 10,
                    agility: 5,
                    intelligence: 3,
                    defense: 5,
                    crit_chance: 5,
                    block_rate: 10,
                    ..Stats::default()
                },
                abilities: vec![
                    Ability::new(
                        "power_strike",
                        "Power Strike",
                        AbilityType::Active,
                        1,
                        strike(StatKind::Strength, 150, 20),
                    ),
                    Ability::new(
                        "iron_skin",
                        "Iron Skin",
                        AbilityType::Passive,
                        3,
                        bonus(StatKind::Defense, 5),
                    ),
                    Ability::new(
                        "whirlwind",
                        "Whirlwind",
                        AbilityType::Active,
                        5,
                        strike(StatKind::Strength, 130, 25),
                    ),
                    Ability::new(
                        "berserker_rage",
                        "Berserker Rage",
                        AbilityType::Ultimate,
                        10,
                        strike(StatKind::Strength, 220, 50),
                    ),
                    Ability::new(
                        "unbreakable",
                        "Unbreakable",
                        AbilityType::Passive,
                        15,
                        bonus(StatKind::BlockRate, 10),
                    ),
                ],
            },
            ProgressionClass::Ranger => ClassData {
                primary_stat: StatKind::Agility,
                base_hp: 100,
                level_coefficient: 9,
                stat_coefficient: 2,
                starting_stats: Stats {
                    strength: 6,
                    agility: 10,
                    intelligence: 4,
                    defense: 3,
                    crit_chance: 10,
                    block_rate: 5,
                    ..Stats::default()
                },
                abilities: vec![
                    Ability::new(
                        "quick_shot",
                        "Quick Shot",
                        AbilityType::Active,
                        1,
                        strike(StatKind::Agility, 80, 10),
                    ),
                    Ability::new(
                        "keen_eye",
                        "Keen Eye",
                        AbilityType::Passive,
                        3,
                        bonus(StatKind::CritChance, 5),
                    ),
                    Ability::new(
                        "volley",
                        "Volley",
                        AbilityType::Active,
                        5,
                        strike(StatKind::Agility, 130, 25),
                    ),
                    Ability::new(
                        "rain_of_arrows",
                        "Rain of Arrows",
                        AbilityType::Ultimate,
                        10,
                        strike(StatKind::Agility, 200, 50),
                    ),
                    Ability::new(
                        "evasion",
                        "Evasion",
                        AbilityType::Passive,
                        15,
                        bonus(StatKind::Agility, 10),
                    ),
                ],
            },
            ProgressionClass::Mage => ClassData {
                primary_stat: StatKind::Intelligence,
                base_hp: 80,
                level_coefficient: 6,
                stat_coefficient: 1,
                starting_stats: Stats {
                    strength: 3,
                    agility: 5,
                    intelligence: 10,
                    defense: 2,
                    crit_chance: 5,
                    crit_damage: 175,
                    ..Stats::default()
                },
                abilities: vec![
                    Ability::new(
                        "arcane_bolt",
                        "Arcane Bolt",
                        AbilityType::Active,
                        1,
                        strike(StatKind::Intelligence, 120, 15),
                    ),
                    Ability::new(
                        "mana_shield",
                        "Mana Shield",
                        AbilityType::Passive,
                        3,
                        bonus(StatKind::Defense, 4),
                    ),
                    Ability::new(
                        "fireball",
                        "Fireball",
                        AbilityType::Active,
                        5,
                        strike(StatKind::Intelligence, 160, 30),
                    ),
                    Ability::new(
                        "meteor",
                        "Meteor",
                        AbilityType::Ultimate,
                        10,
                        strike(StatKind::Intelligence, 250, 60),
                    ),
                    Ability::new(
                        "arcane_mastery",
                        "Arcane Mastery",
                        AbilityType::Passive,
                        15,
                        bonus(StatKind::Intelligence, 10),
                    ),
                ],
            },
        }
    }
}
