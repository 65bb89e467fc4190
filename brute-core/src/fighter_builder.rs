//! Fighter builder.
//!
//! Step-by-step construction of fighters with the class's starting stats and
//! abilities. Tests and the arena use it to set up fighters at any level.

use crate::equipment::{EquipError, EquipmentSlot, Item};
use crate::fighter::{Fighter, FighterClass, FighterId, Stats};
use crate::generator::normalize_owner;
use thiserror::Error;

/// Error from fighter building.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("Fighter owner is required")]
    MissingOwner,

    #[error("Fighter name is required")]
    MissingName,

    #[error("Class selection is required")]
    MissingClass,

    #[error("Starting HP {current} is outside 1..={maximum}")]
    InvalidHitPoints { current: u32, maximum: u32 },

    #[error(transparent)]
    Equip(#[from] EquipError),
}

/// Builder for creating fighters.
#[derive(Debug, Clone, Default)]
pub struct FighterBuilder {
    id: Option<FighterId>,
    owner: Option<String>,
    name: Option<String>,
    class: Option<FighterClass>,
    stats: Option<Stats>,
    experience: u32,
    current_hp: Option<u32>,
    items: Vec<(EquipmentSlot, Item)>,
}

impl FighterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed id instead of a random one.
    pub fn with_id(mut self, id: FighterId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn class(mut self, class: FighterClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Replace the class starting stats.
    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Grant experience after creation, leveling the fighter up as usual.
    pub fn with_experience(mut self, experience: u32) -> Self {
        self.experience = experience;
        self
    }

    /// Start below full health.
    pub fn with_current_hp(mut self, hp: u32) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn with_item(mut self, slot: EquipmentSlot, item: Item) -> Self {
        self.items.push((slot, item));
        self
    }

    /// Build the fighter, returning an error if any required field is missing.
    ///
    /// The owner is stored normalized, the same way owner lookups match it.
    pub fn build(self) -> Result<Fighter, BuilderError> {
        let owner = self.owner.ok_or(BuilderError::MissingOwner)?;
        let name = self.name.ok_or(BuilderError::MissingName)?;
        let class = self.class.ok_or(BuilderError::MissingClass)?;
        let owner = normalize_owner(&owner);
        if owner.is_empty() {
            return Err(BuilderError::MissingOwner);
        }
        if name.trim().is_empty() {
            return Err(BuilderError::MissingName);
        }

        let mut fighter = Fighter::new(owner, name, class);
        if let Some(id) = self.id {
            fighter.id = id;
        }
        if let Some(stats) = self.stats {
            fighter.stats = stats;
            fighter.recalculate_max_hp();
        }
        if self.experience > 0 {
            fighter.gain_xp(self.experience);
        }
        fighter.hp.restore();

        for (slot, item) in self.items {
            fighter.equip(slot, item)?;
        }

        if let Some(current) = self.current_hp {
            if current == 0 || current > fighter.hp.maximum {
                return Err(BuilderError::InvalidHitPoints {
                    current,
                    maximum: fighter.hp.maximum,
                });
            }
            fighter.hp.current = current;
        }

        Ok(fighter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::find_item;

    #[test]
    fn test_build_basic_fighter() {
        let fighter = FighterBuilder::new()
            .owner("0xabc")
            .name("Grok")
            .class(FighterClass::Warrior)
            .build()
            .expect("Should build successfully");

        assert_eq!(fighter.level, 1);
        assert_eq!(fighter.stats.strength, 10);
        assert_eq!(fighter.hp.current, fighter.hp.maximum);
        assert!(fighter.ability("power_strike").unwrap().is_unlocked);
        assert!(!fighter.ability("iron_skin").unwrap().is_unlocked);
    }

    #[test]
    fn test_missing_fields() {
        let result = FighterBuilder::new().name("Grok").build();
        assert_eq!(result, Err(BuilderError::MissingOwner));

        let result = FighterBuilder::new().owner("0xabc").name("  ").build();
        assert_eq!(result, Err(BuilderError::MissingName));

        let result = FighterBuilder::new().owner("0xabc").name("Grok").build();
        assert_eq!(result, Err(BuilderError::MissingClass));
    }

    #[test]
    fn test_owner_normalized() {
        let fighter = FighterBuilder::new()
            .owner(" 0xAB ")
            .name("Grok")
            .class(FighterClass::Mage)
            .build()
            .unwrap();
        assert_eq!(fighter.owner, "0xab");

        let result = FighterBuilder::new()
            .owner("   ")
            .name("Grok")
            .class(FighterClass::Mage)
            .build();
        assert_eq!(result, Err(BuilderError::MissingOwner));
    }

    #[test]
    fn test_experience_levels_up() {
        let fighter = FighterBuilder::new()
            .owner("0xabc")
            .name("Vel")
            .class(FighterClass::Ranged)
            .with_experience(600)
            .build()
            .unwrap();

        assert_eq!(fighter.level, 4);
        assert_eq!(fighter.experience, 0);
        assert_eq!(fighter.hp.current, fighter.hp.maximum);
    }

    #[test]
    fn test_current_hp_bounds() {
        let result = FighterBuilder::new()
            .owner("0xabc")
            .name("Vel")
            .class(FighterClass::Mage)
            .with_current_hp(0)
            .build();
        assert!(matches!(
            result,
            Err(BuilderError::InvalidHitPoints { current: 0, .. })
        ));

        let fighter = FighterBuilder::new()
            .owner("0xabc")
            .name("Vel")
            .class(FighterClass::Mage)
            .with_current_hp(5)
            .build()
            .unwrap();
        assert_eq!(fighter.hp.current, 5);
    }

    #[test]
    fn test_restricted_item_rejected() {
        let result = FighterBuilder::new()
            .owner("0xabc")
            .name("Vel")
            .class(FighterClass::Mage)
            .with_item(EquipmentSlot::Weapon, find_item("battle_axe").unwrap())
            .build();
        assert!(matches!(
            result,
            Err(BuilderError::Equip(EquipError::ClassRestricted { .. }))
        ));
    }
}
