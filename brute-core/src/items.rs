//! Standard item database.
//!
//! Contains the predefined weapons, armor and jewelry that fighters can be
//! equipped with, looked up by name or id.

use crate::equipment::{EffectKind, Item, ItemKind, SpecialEffect};
use crate::fighter::{FighterClass, StatKind};

/// Get a standard item by name or id (case-insensitive).
pub fn find_item(name: &str) -> Option<Item> {
    let name_lower = name.to_lowercase();
    ITEMS
        .iter()
        .find(|i| i.name.to_lowercase() == name_lower || i.id == name_lower)
        .cloned()
}

/// All standard items of one kind.
pub fn items_of_kind(kind: ItemKind) -> Vec<Item> {
    ITEMS.iter().filter(|i| i.kind == kind).cloned().collect()
}

/// All standard weapons a class may wield.
pub fn weapons_for(class: FighterClass) -> Vec<Item> {
    ITEMS
        .iter()
        .filter(|i| i.kind == ItemKind::Weapon && i.usable_by(class))
        .cloned()
        .collect()
}

lazy_static::lazy_static! {
    /// Standard items.
    pub static ref ITEMS: Vec<Item> = vec![
        // Weapons
        Item::weapon("rusty_sword", "Rusty Sword", 2, 5),
        Item::weapon("battle_axe", "Battle Axe", 4, 9)
            .with_bonus(StatKind::Strength, 2)
            .restricted_to(FighterClass::Warrior),
        Item::weapon("war_hammer", "War Hammer", 6, 12)
            .with_bonus(StatKind::CritDamage, 25)
            .restricted_to(FighterClass::Warrior),
        Item::weapon("short_bow", "Short Bow", 3, 6)
            .with_bonus(StatKind::Agility, 2)
            .restricted_to(FighterClass::Ranged),
        Item::weapon("longbow", "Longbow", 5, 10)
            .with_bonus(StatKind::CritChance, 5)
            .restricted_to(FighterClass::Ranged),
        Item::weapon("twin_daggers", "Twin Daggers", 2, 7)
            .with_bonus(StatKind::Agility, 3)
            .with_effect(SpecialEffect::on_hit(EffectKind::BonusDamage, 25, 3))
            .restricted_to(FighterClass::Rogue),
        Item::weapon("oak_staff", "Oak Staff", 1, 4)
            .with_bonus(StatKind::Intelligence, 3)
            .restricted_to(FighterClass::Mage),
        Item::weapon("sun_mace", "Sun Mace", 3, 7)
            .with_effect(SpecialEffect::on_hit(EffectKind::LifeSteal, 30, 30))
            .restricted_to(FighterClass::Cleric),
        Item::weapon("vampire_blade", "Vampire Blade", 4, 8)
            .with_effect(SpecialEffect::on_hit(EffectKind::LifeSteal, 20, 50)),

        // Armor
        Item::new("leather_cap", "Leather Cap", ItemKind::Head)
            .with_bonus(StatKind::Defense, 2),
        Item::new("iron_helm", "Iron Helm", ItemKind::Head)
            .with_bonus(StatKind::Defense, 4)
            .with_bonus(StatKind::BlockRate, 2),
        Item::new("chainmail", "Chainmail", ItemKind::Chest)
            .with_bonus(StatKind::Defense, 8),
        Item::new("mage_robe", "Mage Robe", ItemKind::Chest)
            .with_bonus(StatKind::Defense, 2)
            .with_bonus(StatKind::Intelligence, 4),
        Item::new("leather_gloves", "Leather Gloves", ItemKind::Hands)
            .with_bonus(StatKind::Agility, 1)
            .with_bonus(StatKind::Defense, 1),
        Item::new("greaves", "Greaves", ItemKind::Legs)
            .with_bonus(StatKind::Defense, 3),
        Item::new("swift_boots", "Swift Boots", ItemKind::Feet)
            .with_bonus(StatKind::Agility, 3),

        // Jewelry
        Item::new("ring_of_might", "Ring of Might", ItemKind::Ring)
            .with_bonus(StatKind::Strength, 3),
        Item::new("ring_of_fortune", "Ring of Fortune", ItemKind::Ring)
            .with_bonus(StatKind::MagicFind, 10)
            .with_bonus(StatKind::CritChance, 2),
        Item::new("fang_amulet", "Fang Amulet", ItemKind::Amulet)
            .with_effect(SpecialEffect::on_hit(EffectKind::LifeSteal, 15, 25)),
        Item::new("spiked_charm", "Spiked Charm", ItemKind::Trinket)
            .with_effect(SpecialEffect::on_hit(EffectKind::BonusDamage, 20, 5)),
        Item::new("tower_shield_charm", "Tower Shield Charm", ItemKind::Trinket)
            .with_bonus(StatKind::BlockRate, 8),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_item_case_insensitive() {
        let item = find_item("vampire blade").unwrap();
        assert_eq!(item.id, "vampire_blade");
        assert!(find_item("VAMPIRE_BLADE").is_some());
        assert!(find_item("excalibur").is_none());
    }

    #[test]
    fn test_item_ids_unique() {
        let mut ids: Vec<_> = ITEMS.iter().map(|i| i.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ITEMS.len());
    }

    #[test]
    fn test_weapons_have_valid_ranges() {
        for weapon in items_of_kind(ItemKind::Weapon) {
            let damage = weapon.damage.expect("weapons carry damage");
            assert!(damage.is_valid(), "{}", weapon.name);
        }
    }

    #[test]
    fn test_every_class_has_a_weapon() {
        for &class in FighterClass::all() {
            assert!(!weapons_for(class).is_empty(), "{class}");
        }
    }
}
