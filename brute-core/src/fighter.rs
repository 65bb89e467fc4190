//! Fighter snapshot types.
//!
//! Contains the types that describe one combatant: identifiers, the two
//! class vocabularies, stats, hit points, abilities and the fighter record.

use crate::equipment::Equipment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for fighters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FighterId(pub Uuid);

impl FighterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for FighterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FighterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FighterId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Every stat a fighter carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKind {
    Strength,
    Agility,
    Intelligence,
    Defense,
    CritChance,
    CritDamage,
    BlockRate,
    MagicFind,
}

impl StatKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatKind::Strength => "Strength",
            StatKind::Agility => "Agility",
            StatKind::Intelligence => "Intelligence",
            StatKind::Defense => "Defense",
            StatKind::CritChance => "Crit Chance",
            StatKind::CritDamage => "Crit Damage",
            StatKind::BlockRate => "Block Rate",
            StatKind::MagicFind => "Magic Find",
        }
    }

    pub fn all() -> &'static [StatKind] {
        &[
            StatKind::Strength,
            StatKind::Agility,
            StatKind::Intelligence,
            StatKind::Defense,
            StatKind::CritChance,
            StatKind::CritDamage,
            StatKind::BlockRate,
            StatKind::MagicFind,
        ]
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Partial stat mapping contributed by an item or passive ability.
pub type StatBonuses = BTreeMap<StatKind, u32>;

/// Crit damage multiplier every fighter starts with, in percent.
pub const BASE_CRIT_DAMAGE: u32 = 150;

/// A full stat block.
///
/// `crit_chance` and `block_rate` are percentages out of 100. `crit_damage`
/// is a percent multiplier, so 150 means a critical hit deals 1.5× damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub strength: u32,
    pub agility: u32,
    pub intelligence: u32,
    pub defense: u32,
    pub crit_chance: u32,
    pub crit_damage: u32,
    pub block_rate: u32,
    pub magic_find: u32,
}

impl Stats {
    pub fn get(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Strength => self.strength,
            StatKind::Agility => self.agility,
            StatKind::Intelligence => self.intelligence,
            StatKind::Defense => self.defense,
            StatKind::CritChance => self.crit_chance,
            StatKind::CritDamage => self.crit_damage,
            StatKind::BlockRate => self.block_rate,
            StatKind::MagicFind => self.magic_find,
        }
    }

    pub fn get_mut(&mut self, kind: StatKind) -> &mut u32 {
        match kind {
            StatKind::Strength => &mut self.strength,
            StatKind::Agility => &mut self.agility,
            StatKind::Intelligence => &mut self.intelligence,
            StatKind::Defense => &mut self.defense,
            StatKind::CritChance => &mut self.crit_chance,
            StatKind::CritDamage => &mut self.crit_damage,
            StatKind::BlockRate => &mut self.block_rate,
            StatKind::MagicFind => &mut self.magic_find,
        }
    }

    pub fn add(&mut self, kind: StatKind, amount: u32) {
        let stat = self.get_mut(kind);
        *stat = stat.saturating_add(amount);
    }

    /// Returns a copy of these stats with every bonus added on top.
    pub fn with_bonuses(&self, bonuses: &StatBonuses) -> Stats {
        let mut total = self.clone();
        for (&kind, &amount) in bonuses {
            total.add(kind, amount);
        }
        total
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            strength: 0,
            agility: 0,
            intelligence: 0,
            defense: 0,
            crit_chance: 0,
            crit_damage: BASE_CRIT_DAMAGE,
            block_rate: 0,
            magic_find: 0,
        }
    }
}

/// The stats a player may spend free points on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocatableStat {
    Strength,
    Agility,
    Intelligence,
}

impl AllocatableStat {
    pub fn stat_kind(&self) -> StatKind {
        match self {
            AllocatableStat::Strength => StatKind::Strength,
            AllocatableStat::Agility => StatKind::Agility,
            AllocatableStat::Intelligence => StatKind::Intelligence,
        }
    }

    pub fn from_name(name: &str) -> Option<AllocatableStat> {
        match name.to_lowercase().as_str() {
            "strength" | "str" => Some(AllocatableStat::Strength),
            "agility" | "agi" => Some(AllocatableStat::Agility),
            "intelligence" | "int" => Some(AllocatableStat::Intelligence),
            _ => None,
        }
    }
}

// ============================================================================
// Hit Points
// ============================================================================

/// Hit points tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: u32,
    pub maximum: u32,
}

impl HitPoints {
    pub fn new(maximum: u32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Subtracts damage, flooring at zero. Returns true if this dropped HP to zero.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.current = self.current.saturating_sub(amount);
        self.current == 0
    }

    /// Heals up to the maximum. Returns the amount actually healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let old = self.current;
        self.current = self.current.saturating_add(amount).min(self.maximum);
        self.current - old
    }

    /// Changes the maximum. Growth is added to current HP; current HP is
    /// clamped to the new maximum either way.
    pub fn set_maximum(&mut self, maximum: u32) {
        let growth = maximum.saturating_sub(self.maximum);
        self.maximum = maximum;
        self.current = self.current.saturating_add(growth).min(maximum);
    }

    pub fn restore(&mut self) {
        self.current = self.maximum;
    }

    pub fn is_defeated(&self) -> bool {
        self.current == 0
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Combat-facing fighter class, used for equipment and matchmaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FighterClass {
    Warrior,
    Ranged,
    Mage,
    Rogue,
    Cleric,
}

impl FighterClass {
    pub fn name(&self) -> &'static str {
        match self {
            FighterClass::Warrior => "Warrior",
            FighterClass::Ranged => "Ranged",
            FighterClass::Mage => "Mage",
            FighterClass::Rogue => "Rogue",
            FighterClass::Cleric => "Cleric",
        }
    }

    /// Maps onto the progression vocabulary.
    ///
    /// Rogue and Cleric have no progression track of their own and share
    /// the Ranger and Mage tracks respectively.
    pub fn progression_class(&self) -> ProgressionClass {
        match self {
            FighterClass::Warrior => ProgressionClass::Fighter,
            FighterClass::Ranged | FighterClass::Rogue => ProgressionClass::Ranger,
            FighterClass::Mage | FighterClass::Cleric => ProgressionClass::Mage,
        }
    }

    pub fn all() -> &'static [FighterClass] {
        &[
            FighterClass::Warrior,
            FighterClass::Ranged,
            FighterClass::Mage,
            FighterClass::Rogue,
            FighterClass::Cleric,
        ]
    }

    pub fn from_name(name: &str) -> Option<FighterClass> {
        match name.to_lowercase().as_str() {
            "warrior" | "fighter" => Some(FighterClass::Warrior),
            "ranged" | "ranger" | "archer" => Some(FighterClass::Ranged),
            "mage" => Some(FighterClass::Mage),
            "rogue" => Some(FighterClass::Rogue),
            "cleric" => Some(FighterClass::Cleric),
            _ => None,
        }
    }
}

impl fmt::Display for FighterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Progression class, used for leveling, abilities and sprites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgressionClass {
    Fighter,
    Ranger,
    Mage,
}

impl ProgressionClass {
    pub fn name(&self) -> &'static str {
        match self {
            ProgressionClass::Fighter => "Fighter",
            ProgressionClass::Ranger => "Ranger",
            ProgressionClass::Mage => "Mage",
        }
    }

    /// Name used in sprite file names. Deliberately not the class label.
    pub fn sprite_name(&self) -> &'static str {
        match self {
            ProgressionClass::Fighter => "warrior",
            ProgressionClass::Ranger => "archer",
            ProgressionClass::Mage => "mage",
        }
    }
}

impl fmt::Display for ProgressionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Abilities
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityType {
    Passive,
    Active,
    Ultimate,
}

/// What an ability does once unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AbilityEffect {
    /// A damaging skill. `multiplier` is a percentage applied to base damage.
    #[serde(rename_all = "camelCase")]
    Strike {
        scaling: StatKind,
        multiplier: u32,
        energy_cost: u32,
    },
    /// A permanent bonus added to combat stats.
    #[serde(rename_all = "camelCase")]
    StatBonus { stat: StatKind, amount: u32 },
}

/// A class ability with its unlock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ability {
    pub id: String,
    pub name: String,
    pub ability_type: AbilityType,
    pub unlock_level: u32,
    pub is_unlocked: bool,
    pub effect: AbilityEffect,
}

impl Ability {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ability_type: AbilityType,
        unlock_level: u32,
        effect: AbilityEffect,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ability_type,
            unlock_level,
            is_unlocked: false,
            effect,
        }
    }

    /// True for abilities that can be chosen as a combat action.
    pub fn is_skill(&self) -> bool {
        matches!(self.effect, AbilityEffect::Strike { .. })
    }
}

// ============================================================================
// Fighter
// ============================================================================

/// The full mutable state of one combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fighter {
    pub id: FighterId,
    pub owner: String,
    pub name: String,
    pub class: FighterClass,
    pub level: u32,
    pub experience: u32,
    pub free_points: u32,
    pub stats: Stats,
    pub hp: HitPoints,
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub equipment: Equipment,
}

impl Fighter {
    /// Create a level 1 fighter with the class's starting stats and abilities.
    pub fn new(owner: impl Into<String>, name: impl Into<String>, class: FighterClass) -> Self {
        let data = class.progression_class().data();
        let mut fighter = Self {
            id: FighterId::new(),
            owner: owner.into(),
            name: name.into(),
            class,
            level: 1,
            experience: 0,
            free_points: 0,
            stats: data.starting_stats,
            hp: HitPoints::new(0),
            abilities: data.abilities,
            equipment: Equipment::new(),
        };
        fighter.refresh_abilities();
        fighter.hp = HitPoints::new(fighter.calculate_max_hp());
        fighter
    }

    pub fn progression_class(&self) -> ProgressionClass {
        self.class.progression_class()
    }

    pub fn ability(&self, id: &str) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.id == id)
    }

    pub fn unlocked_abilities(&self) -> impl Iterator<Item = &Ability> {
        self.abilities.iter().filter(|a| a.is_unlocked)
    }

    /// Base stats plus every equipped item's bonuses.
    pub fn total_stats(&self) -> Stats {
        self.equipment.total_stats(&self.stats)
    }

    /// Total stats plus the bonuses of unlocked passive abilities.
    pub fn combat_stats(&self) -> Stats {
        let mut stats = self.total_stats();
        for ability in self.unlocked_abilities() {
            if let AbilityEffect::StatBonus { stat, amount } = ability.effect {
                stats.add(stat, amount);
            }
        }
        stats
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner.eq_ignore_ascii_case(owner)
    }
}
