//! Equipment slots, items and loadouts.
//!
//! A loadout is an immutable value. Equipping or unequipping returns a new
//! `Equipment` and leaves the original untouched, so a fighter's snapshot
//! can be shared with a running simulation while a new loadout is built.

use crate::dice::DamageRange;
use crate::fighter::{Fighter, FighterClass, StatBonuses, StatKind, Stats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors from changing a loadout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquipError {
    #[error("{item} cannot be equipped in the {slot} slot")]
    WrongSlot { item: String, slot: EquipmentSlot },

    #[error("{item} can only be used by a {class}")]
    ClassRestricted { item: String, class: FighterClass },
}

// ============================================================================
// Slots
// ============================================================================

/// Slots on a fighter's loadout, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentSlot {
    Weapon,
    Head,
    Chest,
    Hands,
    Legs,
    Feet,
    Ring1,
    Ring2,
    Amulet,
    Trinket,
}

impl EquipmentSlot {
    pub fn name(&self) -> &'static str {
        match self {
            EquipmentSlot::Weapon => "weapon",
            EquipmentSlot::Head => "head",
            EquipmentSlot::Chest => "chest",
            EquipmentSlot::Hands => "hands",
            EquipmentSlot::Legs => "legs",
            EquipmentSlot::Feet => "feet",
            EquipmentSlot::Ring1 => "ring 1",
            EquipmentSlot::Ring2 => "ring 2",
            EquipmentSlot::Amulet => "amulet",
            EquipmentSlot::Trinket => "trinket",
        }
    }

    pub fn all() -> &'static [EquipmentSlot] {
        &[
            EquipmentSlot::Weapon,
            EquipmentSlot::Head,
            EquipmentSlot::Chest,
            EquipmentSlot::Hands,
            EquipmentSlot::Legs,
            EquipmentSlot::Feet,
            EquipmentSlot::Ring1,
            EquipmentSlot::Ring2,
            EquipmentSlot::Amulet,
            EquipmentSlot::Trinket,
        ]
    }

    /// Parse a slot name; `ring1`, `ring-1` and `ring 1` all work.
    pub fn from_name(name: &str) -> Option<EquipmentSlot> {
        let normalized: String = name
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        EquipmentSlot::all()
            .iter()
            .copied()
            .find(|slot| slot.name().replace(' ', "") == normalized)
    }

    /// The kind of item this slot takes.
    pub fn item_kind(&self) -> ItemKind {
        match self {
            EquipmentSlot::Weapon => ItemKind::Weapon,
            EquipmentSlot::Head => ItemKind::Head,
            EquipmentSlot::Chest => ItemKind::Chest,
            EquipmentSlot::Hands => ItemKind::Hands,
            EquipmentSlot::Legs => ItemKind::Legs,
            EquipmentSlot::Feet => ItemKind::Feet,
            EquipmentSlot::Ring1 | EquipmentSlot::Ring2 => ItemKind::Ring,
            EquipmentSlot::Amulet => ItemKind::Amulet,
            EquipmentSlot::Trinket => ItemKind::Trinket,
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What kind of slot an item goes into. Rings fit either ring slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Weapon,
    Head,
    Chest,
    Hands,
    Legs,
    Feet,
    Ring,
    Amulet,
    Trinket,
}

impl ItemKind {
    pub fn fits(&self, slot: EquipmentSlot) -> bool {
        matches!(
            (self, slot),
            (ItemKind::Weapon, EquipmentSlot::Weapon)
                | (ItemKind::Head, EquipmentSlot::Head)
                | (ItemKind::Chest, EquipmentSlot::Chest)
                | (ItemKind::Hands, EquipmentSlot::Hands)
                | (ItemKind::Legs, EquipmentSlot::Legs)
                | (ItemKind::Feet, EquipmentSlot::Feet)
                | (ItemKind::Ring, EquipmentSlot::Ring1)
                | (ItemKind::Ring, EquipmentSlot::Ring2)
                | (ItemKind::Amulet, EquipmentSlot::Amulet)
                | (ItemKind::Trinket, EquipmentSlot::Trinket)
        )
    }
}

// ============================================================================
// Special Effects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectTrigger {
    OnHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    /// Heal the attacker by `magnitude` percent of the damage dealt.
    LifeSteal,
    /// Deal `magnitude` extra damage.
    BonusDamage,
}

/// A chance-based effect carried by an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialEffect {
    pub trigger: EffectTrigger,
    /// Trigger chance in percent.
    pub chance: u32,
    pub kind: EffectKind,
    pub magnitude: u32,
}

impl SpecialEffect {
    pub fn on_hit(kind: EffectKind, chance: u32, magnitude: u32) -> Self {
        Self {
            trigger: EffectTrigger::OnHit,
            chance,
            kind,
            magnitude,
        }
    }
}

// ============================================================================
// Items
// ============================================================================

/// An equippable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub bonuses: StatBonuses,
    #[serde(default)]
    pub damage: Option<DamageRange>,
    #[serde(default)]
    pub effects: Vec<SpecialEffect>,
    #[serde(default)]
    pub class_restriction: Option<FighterClass>,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            bonuses: StatBonuses::new(),
            damage: None,
            effects: Vec::new(),
            class_restriction: None,
        }
    }

    /// A weapon with a damage range.
    pub fn weapon(id: impl Into<String>, name: impl Into<String>, min: u32, max: u32) -> Self {
        Self::new(id, name, ItemKind::Weapon).with_damage(min, max)
    }

    pub fn with_damage(mut self, min: u32, max: u32) -> Self {
        self.damage = Some(DamageRange::new(min, max));
        self
    }

    pub fn with_bonus(mut self, stat: StatKind, amount: u32) -> Self {
        *self.bonuses.entry(stat).or_insert(0) += amount;
        self
    }

    pub fn with_effect(mut self, effect: SpecialEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn restricted_to(mut self, class: FighterClass) -> Self {
        self.class_restriction = Some(class);
        self
    }

    pub fn usable_by(&self, class: FighterClass) -> bool {
        self.class_restriction.map_or(true, |c| c == class)
    }
}

// ============================================================================
// Loadout
// ============================================================================

/// The items a fighter has equipped, keyed by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, Item>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: EquipmentSlot) -> Option<&Item> {
        self.slots.get(&slot)
    }

    pub fn weapon(&self) -> Option<&Item> {
        self.get(EquipmentSlot::Weapon)
    }

    /// Equipped items in slot order.
    pub fn items(&self) -> impl Iterator<Item = (EquipmentSlot, &Item)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns a new loadout with `item` in `slot`, replacing whatever was there.
    pub fn with_item(&self, slot: EquipmentSlot, item: Item) -> Result<Equipment, EquipError> {
        if !item.kind.fits(slot) {
            return Err(EquipError::WrongSlot {
                item: item.name,
                slot,
            });
        }
        let mut slots = self.slots.clone();
        slots.insert(slot, item);
        Ok(Equipment { slots })
    }

    /// Returns a new loadout with `slot` emptied, plus the item that was in it.
    pub fn without(&self, slot: EquipmentSlot) -> (Equipment, Option<Item>) {
        let mut slots = self.slots.clone();
        let removed = slots.remove(&slot);
        (Equipment { slots }, removed)
    }

    /// Sum of every equipped item's stat bonuses.
    pub fn bonuses(&self) -> StatBonuses {
        let mut total = StatBonuses::new();
        for item in self.slots.values() {
            for (&stat, &amount) in &item.bonuses {
                let entry = total.entry(stat).or_insert(0);
                *entry = entry.saturating_add(amount);
            }
        }
        total
    }

    /// Base stats plus equipment bonuses. `base` is not modified.
    pub fn total_stats(&self, base: &Stats) -> Stats {
        base.with_bonuses(&self.bonuses())
    }

    /// On-hit effects of every equipped item, in slot order.
    pub fn on_hit_effects(&self) -> impl Iterator<Item = (&Item, &SpecialEffect)> {
        self.slots.values().flat_map(|item| {
            item.effects
                .iter()
                .filter(|e| e.trigger == EffectTrigger::OnHit)
                .map(move |e| (item, e))
        })
    }
}

impl Fighter {
    /// Equip an item, checking the slot and class restriction.
    pub fn equip(&mut self, slot: EquipmentSlot, item: Item) -> Result<(), EquipError> {
        if let Some(class) = item.class_restriction {
            if class != self.class {
                return Err(EquipError::ClassRestricted {
                    item: item.name,
                    class,
                });
            }
        }
        self.equipment = self.equipment.with_item(slot, item)?;
        Ok(())
    }

    /// Remove the item in a slot, returning it.
    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<Item> {
        let (equipment, removed) = self.equipment.without(slot);
        self.equipment = equipment;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Item {
        Item::new("ring", "Ring of Might", ItemKind::Ring).with_bonus(StatKind::Strength, 3)
    }

    #[test]
    fn test_slot_from_name() {
        assert_eq!(EquipmentSlot::from_name("Ring-1"), Some(EquipmentSlot::Ring1));
        assert_eq!(EquipmentSlot::from_name("ring 2"), Some(EquipmentSlot::Ring2));
        assert_eq!(EquipmentSlot::from_name("WEAPON"), Some(EquipmentSlot::Weapon));
        assert_eq!(EquipmentSlot::from_name("tail"), None);
    }

    #[test]
    fn test_slot_item_kind_fits_slot() {
        for &slot in EquipmentSlot::all() {
            assert!(slot.item_kind().fits(slot), "{slot}");
        }
    }

    #[test]
    fn test_with_item_leaves_original_untouched() {
        let empty = Equipment::new();
        let equipped = empty.with_item(EquipmentSlot::Ring1, ring()).unwrap();
        assert!(empty.is_empty());
        assert!(equipped.get(EquipmentSlot::Ring1).is_some());
    }

    #[test]
    fn test_wrong_slot_rejected() {
        let result = Equipment::new().with_item(EquipmentSlot::Head, ring());
        assert!(matches!(result, Err(EquipError::WrongSlot { .. })));
    }

    #[test]
    fn test_rings_fit_both_ring_slots() {
        let equipment = Equipment::new()
            .with_item(EquipmentSlot::Ring1, ring())
            .unwrap()
            .with_item(EquipmentSlot::Ring2, ring())
            .unwrap();
        assert_eq!(equipment.bonuses().get(&StatKind::Strength), Some(&6));
    }

    #[test]
    fn test_total_stats_missing_keys_contribute_zero() {
        let base = Stats {
            strength: 10,
            agility: 4,
            ..Stats::default()
        };
        let equipment = Equipment::new()
            .with_item(EquipmentSlot::Ring1, ring())
            .unwrap();
        let total = equipment.total_stats(&base);
        assert_eq!(total.strength, 13);
        assert_eq!(total.agility, 4);
        assert_eq!(base.strength, 10);
    }

    #[test]
    fn test_without_returns_removed_item() {
        let equipment = Equipment::new()
            .with_item(EquipmentSlot::Ring1, ring())
            .unwrap();
        let (after, removed) = equipment.without(EquipmentSlot::Ring1);
        assert!(after.is_empty());
        assert_eq!(removed.map(|i| i.id), Some("ring".to_string()));
        assert!(equipment.get(EquipmentSlot::Ring1).is_some());
    }

    #[test]
    fn test_equip_does_not_touch_base_stats() {
        let mut fighter = Fighter::new("0x1", "Test", FighterClass::Warrior);
        let base = fighter.stats.clone();
        fighter.equip(EquipmentSlot::Ring1, ring()).unwrap();
        assert_eq!(fighter.stats, base);
        assert_eq!(fighter.total_stats().strength, base.strength + 3);

        fighter.unequip(EquipmentSlot::Ring1);
        assert_eq!(fighter.total_stats(), base);
    }

    #[test]
    fn test_class_restriction() {
        let mut mage = Fighter::new("0x1", "Test", FighterClass::Mage);
        let bow = Item::weapon("bow", "Longbow", 3, 6).restricted_to(FighterClass::Ranged);
        let err = mage.equip(EquipmentSlot::Weapon, bow).unwrap_err();
        assert_eq!(
            err,
            EquipError::ClassRestricted {
                item: "Longbow".to_string(),
                class: FighterClass::Ranged,
            }
        );
        assert!(mage.equipment.is_empty());
    }

    #[test]
    fn test_on_hit_effects_in_slot_order() {
        let fang = Item::new("fang", "Fang", ItemKind::Amulet)
            .with_effect(SpecialEffect::on_hit(EffectKind::LifeSteal, 20, 25));
        let blade = Item::weapon("blade", "Blade", 1, 2)
            .with_effect(SpecialEffect::on_hit(EffectKind::BonusDamage, 10, 4));
        let equipment = Equipment::new()
            .with_item(EquipmentSlot::Amulet, fang)
            .unwrap()
            .with_item(EquipmentSlot::Weapon, blade)
            .unwrap();
        let names: Vec<_> = equipment
            .on_hit_effects()
            .map(|(item, _)| item.name.as_str())
            .collect();
        assert_eq!(names, vec!["Blade", "Fang"]);
    }
}
