//! Combat engine.
//!
//! Simulates one complete battle between two fighter snapshots and produces
//! an ordered [`BattleLog`]. The engine works on private per-fight copies of
//! each combatant's HP and energy and never mutates its inputs, so the same
//! fighter can be simulated in several fights at once.
//!
//! All randomness goes through the injected RNG. [`simulate`] seeds a
//! `StdRng`, and the same seed always replays the same fight.

use crate::battle_log::{
    BattleLog, BattleOutcome, EndReason, FightStep, HpSnapshot, Participant, Reward, StepType,
};
use crate::dice::{coin_flip, roll_multiplier, roll_percent};
use crate::equipment::EffectKind;
use crate::fighter::{
    Ability, AbilityEffect, AbilityType, Fighter, FighterId, HitPoints, StatKind, Stats,
};
use crate::progression::{experience_to_next_level, levels_gained, max_energy_for, max_hp_for};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, trace};

/// Dodge chance never exceeds this percentage.
pub const MAX_DODGE_CHANCE: u32 = 40;

/// Defense at or above this value negates all damage.
pub const MAX_DEFENSE: u32 = 100;

// ============================================================================
// Configuration
// ============================================================================

/// Tunables for a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleConfig {
    /// Maximum number of actions before the fight is decided on remaining HP.
    pub turn_cap: u32,

    /// Percent chance an attacker tries a skill instead of a plain attack.
    pub skill_chance: u32,

    /// Energy each fighter regains at the start of its turn.
    pub energy_regen: u32,

    /// Low and high bounds of the random damage multiplier.
    pub damage_variance: (f64, f64),
}

impl BattleConfig {
    pub fn new() -> Self {
        Self {
            turn_cap: 100,
            skill_chance: 30,
            energy_regen: 10,
            damage_variance: (1.0, 1.5),
        }
    }

    pub fn with_turn_cap(mut self, turn_cap: u32) -> Self {
        self.turn_cap = turn_cap;
        self
    }

    pub fn with_skill_chance(mut self, skill_chance: u32) -> Self {
        self.skill_chance = skill_chance.min(100);
        self
    }

    pub fn with_energy_regen(mut self, energy_regen: u32) -> Self {
        self.energy_regen = energy_regen;
        self
    }

    pub fn with_damage_variance(mut self, low: f64, high: f64) -> Self {
        self.damage_variance = (low, high.max(low));
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Fighter data the engine refuses to simulate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Fighter {0} cannot fight itself")]
    SameFighter(FighterId),

    #[error("Fighter {0} has level 0")]
    InvalidLevel(FighterId),

    #[error("Fighter {fighter} has {experience} XP but levels up at {threshold}")]
    ExperienceOverflow {
        fighter: FighterId,
        experience: u32,
        threshold: u32,
    },

    #[error("Fighter {0} has no hit points left")]
    NoHitPoints(FighterId),

    #[error("Fighter {fighter} has {current} HP, above its maximum of {maximum}")]
    HpAboveMaximum {
        fighter: FighterId,
        current: u32,
        maximum: u32,
    },

    #[error("Fighter {fighter} has crit damage {crit_damage}%, below 100%")]
    CritDamageTooLow { fighter: FighterId, crit_damage: u32 },

    #[error("Fighter {fighter} has ability {ability} with an unlock flag that does not match its level")]
    AbilityLockMismatch { fighter: FighterId, ability: String },

    #[error("{item} is equipped in the {slot} slot, which it does not fit")]
    ItemInWrongSlot { item: String, slot: String },

    #[error("{item} has damage range {min}-{max}")]
    InvalidDamageRange { item: String, min: u32, max: u32 },

    #[error("{item} has an effect with trigger chance {chance}%")]
    InvalidEffectChance { item: String, chance: u32 },
}

/// Check a single fighter before it is handed to the engine.
pub fn validate_fighter(fighter: &Fighter) -> Result<(), ValidationError> {
    let id = fighter.id;
    if fighter.level == 0 {
        return Err(ValidationError::InvalidLevel(id));
    }

    let threshold = experience_to_next_level(fighter.level);
    if fighter.experience >= threshold {
        return Err(ValidationError::ExperienceOverflow {
            fighter: id,
            experience: fighter.experience,
            threshold,
        });
    }

    if fighter.hp.current == 0 {
        return Err(ValidationError::NoHitPoints(id));
    }
    if fighter.hp.current > fighter.hp.maximum {
        return Err(ValidationError::HpAboveMaximum {
            fighter: id,
            current: fighter.hp.current,
            maximum: fighter.hp.maximum,
        });
    }

    if fighter.stats.crit_damage < 100 {
        return Err(ValidationError::CritDamageTooLow {
            fighter: id,
            crit_damage: fighter.stats.crit_damage,
        });
    }

    for ability in &fighter.abilities {
        if ability.is_unlocked != (fighter.level >= ability.unlock_level) {
            return Err(ValidationError::AbilityLockMismatch {
                fighter: id,
                ability: ability.id.clone(),
            });
        }
    }

    for (slot, item) in fighter.equipment.items() {
        if !item.kind.fits(slot) {
            return Err(ValidationError::ItemInWrongSlot {
                item: item.name.clone(),
                slot: slot.to_string(),
            });
        }
        if let Some(damage) = item.damage {
            if !damage.is_valid() {
                return Err(ValidationError::InvalidDamageRange {
                    item: item.name.clone(),
                    min: damage.min,
                    max: damage.max,
                });
            }
        }
        if let Some(effect) = item.effects.iter().find(|e| e.chance > 100) {
            return Err(ValidationError::InvalidEffectChance {
                item: item.name.clone(),
                chance: effect.chance,
            });
        }
    }

    Ok(())
}

/// Check both fighters and that they are distinct.
pub fn validate_matchup(a: &Fighter, b: &Fighter) -> Result<(), ValidationError> {
    if a.id == b.id {
        return Err(ValidationError::SameFighter(a.id));
    }
    validate_fighter(a)?;
    validate_fighter(b)
}

// ============================================================================
// Formulas
// ============================================================================

/// Dodge chance in percent: half of agility, capped.
pub fn dodge_chance(agility: u32) -> u32 {
    (agility / 2).min(MAX_DODGE_CHANCE)
}

/// XP for the winner and the loser: `50 + loser_level * 10` and `20 + winner_level * 5`.
pub fn experience_rewards(winner_level: u32, loser_level: u32) -> (u32, u32) {
    (
        50u32.saturating_add(loser_level.saturating_mul(10)),
        20u32.saturating_add(winner_level.saturating_mul(5)),
    )
}

fn reward_for(fighter: &Fighter, xp: u32) -> Reward {
    Reward {
        fighter: fighter.id,
        xp,
        levels_gained: levels_gained(fighter.level, fighter.experience, xp),
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Per-fight state of one fighter.
struct Combatant<'a> {
    fighter: &'a Fighter,
    stats: Stats,
    hp: HitPoints,
    energy: u32,
    max_energy: u32,
    ultimates_used: Vec<&'a str>,
}

impl<'a> Combatant<'a> {
    /// Bonus HP from equipment and passives is granted on top of the stored
    /// HP; damage the snapshot already carries stays missing.
    fn new(fighter: &'a Fighter) -> Self {
        let stats = fighter.combat_stats();
        let max_hp = max_hp_for(fighter.progression_class(), fighter.level, &stats);
        let max_energy = max_energy_for(fighter.level, &stats);
        let missing = fighter.hp.maximum.saturating_sub(fighter.hp.current);
        Self {
            fighter,
            hp: HitPoints {
                current: max_hp.saturating_sub(missing).max(1),
                maximum: max_hp,
            },
            stats,
            energy: max_energy,
            max_energy,
            ultimates_used: Vec::new(),
        }
    }

    fn participant(&self) -> Participant {
        Participant {
            id: self.fighter.id,
            name: self.fighter.name.clone(),
            level: self.fighter.level,
            max_hp: self.hp.maximum,
            starting_hp: self.hp.current,
        }
    }

    /// Unlocked skills this combatant can afford right now.
    fn available_skills(&self) -> Vec<&'a Ability> {
        let fighter: &'a Fighter = self.fighter;
        fighter
            .unlocked_abilities()
            .filter(|ability| match ability.effect {
                AbilityEffect::Strike { energy_cost, .. } => {
                    energy_cost <= self.energy
                        && !(ability.ability_type == AbilityType::Ultimate
                            && self.ultimates_used.contains(&ability.id.as_str()))
                }
                AbilityEffect::StatBonus { .. } => false,
            })
            .collect()
    }

    /// Pay for a skill.
    fn spend(&mut self, ability: &'a Ability) {
        if let AbilityEffect::Strike { energy_cost, .. } = ability.effect {
            self.energy = self.energy.saturating_sub(energy_cost);
        }
        if ability.ability_type == AbilityType::Ultimate {
            self.ultimates_used.push(ability.id.as_str());
        }
    }
}

fn pair_mut<'c, 'a>(
    combatants: &'c mut [Combatant<'a>; 2],
    attacker: usize,
) -> (&'c mut Combatant<'a>, &'c mut Combatant<'a>) {
    let (first, second) = combatants.split_at_mut(1);
    if attacker == 0 {
        (&mut first[0], &mut second[0])
    } else {
        (&mut second[0], &mut first[0])
    }
}

fn snapshot(combatants: &[Combatant<'_>; 2]) -> HpSnapshot {
    HpSnapshot {
        fighter_a: combatants[0].hp.current,
        fighter_b: combatants[1].hp.current,
    }
}

/// Higher agility starts; a tie is a coin flip.
fn initiative<R: Rng>(combatants: &[Combatant<'_>; 2], rng: &mut R) -> usize {
    let (a, b) = (combatants[0].stats.agility, combatants[1].stats.agility);
    if a > b {
        0
    } else if b > a {
        1
    } else if coin_flip(rng) {
        0
    } else {
        1
    }
}

/// Decide a fight that reached the turn cap.
fn resolve_turn_cap<R: Rng>(combatants: &[Combatant<'_>; 2], rng: &mut R) -> (usize, EndReason) {
    let (a, b) = (combatants[0].hp.current, combatants[1].hp.current);
    if a > b {
        (0, EndReason::HpLead)
    } else if b > a {
        (1, EndReason::HpLead)
    } else if coin_flip(rng) {
        (0, EndReason::CoinFlip)
    } else {
        (1, EndReason::CoinFlip)
    }
}

/// With `skill_chance`, pick one affordable skill uniformly and pay for it.
fn choose_skill<'a, R: Rng>(
    attacker: &mut Combatant<'a>,
    config: &BattleConfig,
    rng: &mut R,
) -> Option<&'a Ability> {
    if !roll_percent(rng, config.skill_chance) {
        return None;
    }
    let skills = attacker.available_skills();
    if skills.is_empty() {
        return None;
    }
    let skill = skills[rng.gen_range(0..skills.len())];
    attacker.spend(skill);
    Some(skill)
}

/// Resolve one action by `attacker_idx` against the other combatant.
fn take_turn<R: Rng>(
    combatants: &mut [Combatant<'_>; 2],
    attacker_idx: usize,
    config: &BattleConfig,
    rng: &mut R,
) -> FightStep {
    let (attacker, defender) = pair_mut(combatants, attacker_idx);
    attacker.energy = attacker
        .energy
        .saturating_add(config.energy_regen)
        .min(attacker.max_energy);

    // 1. Action selection
    let skill = choose_skill(attacker, config, rng);
    let (scaling, multiplier) = match skill.map(|s| &s.effect) {
        Some(AbilityEffect::Strike {
            scaling,
            multiplier,
            ..
        }) => (*scaling, *multiplier),
        _ => (StatKind::Strength, 100),
    };

    // 2. Base damage
    let variance = roll_multiplier(rng, config.damage_variance.0, config.damage_variance.1);
    let weapon_roll = match attacker.fighter.equipment.weapon().and_then(|w| w.damage) {
        Some(range) => range.roll_with_rng(rng),
        None => 0,
    };
    let base = (attacker.stats.get(scaling) as f64 * variance + weapon_roll as f64)
        * multiplier as f64
        / 100.0;

    // 3. Defense reduction
    let defense = defender.stats.defense.min(MAX_DEFENSE) as f64;
    let mut damage = (base * (1.0 - defense / 100.0)).floor().max(0.0) as u32;

    // 4. Outcome roll: crit first, then dodge or block on the result
    let mut step_type = if skill.is_some() {
        StepType::Skill
    } else {
        StepType::Attack
    };
    if roll_percent(rng, attacker.stats.crit_chance) {
        damage = (damage as u64 * attacker.stats.crit_damage as u64 / 100).min(u32::MAX as u64)
            as u32;
        step_type = StepType::Critical;
    }
    if roll_percent(rng, dodge_chance(defender.stats.agility)) {
        damage = 0;
        step_type = StepType::Dodge;
    } else if roll_percent(rng, defender.stats.block_rate) {
        damage /= 2;
        step_type = StepType::Block;
    }

    // 5. On-hit effects
    let attacker_fighter = attacker.fighter;
    let defender_fighter = defender.fighter;
    let mut effects = Vec::new();
    if damage > 0 {
        for (item, effect) in attacker_fighter.equipment.on_hit_effects() {
            if !roll_percent(rng, effect.chance) {
                continue;
            }
            match effect.kind {
                EffectKind::LifeSteal => {
                    let amount = (damage as u64 * effect.magnitude as u64 / 100) as u32;
                    let healed = attacker.hp.heal(amount);
                    effects.push(format!("{} drains {} HP", item.name, healed));
                }
                EffectKind::BonusDamage => {
                    damage = damage.saturating_add(effect.magnitude);
                    effects.push(format!(
                        "{} deals {} bonus damage",
                        item.name, effect.magnitude
                    ));
                }
            }
        }
    }

    // 6. Apply damage
    defender.hp.take_damage(damage);

    let attacker_name = &attacker_fighter.name;
    let defender_name = &defender_fighter.name;
    let action = match skill {
        Some(s) => s.name.clone(),
        None => "attack".to_string(),
    };
    let description = match step_type {
        StepType::Critical => format!(
            "{attacker_name} lands a critical {action} on {defender_name} for {damage} damage"
        ),
        StepType::Skill => {
            format!("{attacker_name} uses {action} on {defender_name} for {damage} damage")
        }
        StepType::Dodge => format!("{defender_name} dodges {attacker_name}'s {action}"),
        StepType::Block => format!(
            "{defender_name} blocks {attacker_name}'s {action}, taking {damage} damage"
        ),
        _ => format!("{attacker_name} attacks {defender_name} for {damage} damage"),
    };

    // 7. Emit step
    FightStep {
        step_type,
        attacker: attacker_fighter.id,
        defender: defender_fighter.id,
        damage,
        skill: skill.map(|s| s.name.clone()),
        description,
        hp: Some(snapshot(combatants)),
        special_effect: if effects.is_empty() {
            None
        } else {
            Some(effects.join("; "))
        },
    }
}

/// Simulate a fight with a seeded RNG.
pub fn simulate(a: &Fighter, b: &Fighter, config: &BattleConfig, seed: u64) -> BattleLog {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut log = simulate_with_rng(a, b, config, &mut rng);
    log.seed = Some(seed);
    log
}

/// Simulate a fight with a caller-provided RNG.
///
/// Inputs are assumed valid; see [`validate_matchup`].
pub fn simulate_with_rng<R: Rng>(
    a: &Fighter,
    b: &Fighter,
    config: &BattleConfig,
    rng: &mut R,
) -> BattleLog {
    let mut combatants = [Combatant::new(a), Combatant::new(b)];
    let participants = [combatants[0].participant(), combatants[1].participant()];
    debug!(
        fighter_a = %a.id,
        fighter_b = %b.id,
        hp_a = participants[0].starting_hp,
        hp_b = participants[1].starting_hp,
        "fight started"
    );

    let mut attacker = initiative(&combatants, rng);
    let mut steps = Vec::new();
    let mut turns = 0;
    let mut knockout = None;

    while turns < config.turn_cap {
        turns += 1;
        let step = take_turn(&mut combatants, attacker, config, rng);
        trace!(turn = turns, kind = %step.step_type, damage = step.damage, "{}", step.description);
        steps.push(step);

        // 8. Termination check
        let defender = 1 - attacker;
        if combatants[defender].hp.is_defeated() {
            knockout = Some(attacker);
            break;
        }
        attacker = defender;
    }

    let (winner_idx, reason) = match knockout {
        Some(winner) => (winner, EndReason::Knockout),
        None => resolve_turn_cap(&combatants, rng),
    };
    let winner = combatants[winner_idx].fighter;
    let loser = combatants[1 - winner_idx].fighter;

    let (winner_xp, loser_xp) = experience_rewards(winner.level, loser.level);
    let winner_reward = reward_for(winner, winner_xp);
    let loser_reward = reward_for(loser, loser_xp);

    for (fighter, other, reward) in [
        (winner, loser, winner_reward),
        (loser, winner, loser_reward),
    ] {
        steps.push(FightStep {
            step_type: StepType::Special,
            attacker: fighter.id,
            defender: other.id,
            damage: 0,
            skill: None,
            description: format!("{} gains {} XP", fighter.name, reward.xp),
            hp: None,
            special_effect: None,
        });
        if reward.levels_up() {
            steps.push(FightStep {
                step_type: StepType::LevelUp,
                attacker: fighter.id,
                defender: other.id,
                damage: 0,
                skill: None,
                description: format!(
                    "{} reaches level {}",
                    fighter.name,
                    fighter.level + reward.levels_gained
                ),
                hp: None,
                special_effect: None,
            });
        }
    }

    let description = match reason {
        EndReason::Knockout => format!("{} defeats {}", winner.name, loser.name),
        EndReason::HpLead => format!(
            "{} outlasts {} after {} turns",
            winner.name, loser.name, turns
        ),
        EndReason::CoinFlip => format!(
            "{} and {} are evenly matched after {} turns; {} takes the win",
            winner.name, loser.name, turns, winner.name
        ),
    };
    steps.push(FightStep {
        step_type: StepType::End,
        attacker: winner.id,
        defender: loser.id,
        damage: 0,
        skill: None,
        description,
        hp: Some(snapshot(&combatants)),
        special_effect: None,
    });

    debug!(winner = %winner.id, loser = %loser.id, turns, ?reason, "fight finished");

    BattleLog {
        participants,
        steps,
        outcome: BattleOutcome {
            winner: winner.id,
            loser: loser.id,
            reason,
            turns,
            winner_reward,
            loser_reward,
        },
        seed: None,
    }
}
