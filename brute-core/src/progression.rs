//! Character progression: experience, leveling, stat allocation and sprites.
//!
//! All XP thresholds go through [`experience_to_next_level`]. The combat
//! engine's reward preview calls the same function, so the two can never
//! disagree about when a level-up happens.

use crate::fighter::{AllocatableStat, Fighter, ProgressionClass, Stats};
use tracing::info;

/// XP needed per level, multiplied by the current level.
pub const XP_PER_LEVEL: u32 = 100;

/// Free stat points granted for every level gained.
pub const STAT_POINTS_PER_LEVEL: u32 = 3;

/// XP needed to go from `level` to `level + 1`. Level 0 is treated as level 1.
pub fn experience_to_next_level(level: u32) -> u32 {
    level.max(1).saturating_mul(XP_PER_LEVEL)
}

/// How many levels a grant of `amount` XP would give, without mutating anything.
pub fn levels_gained(level: u32, experience: u32, amount: u32) -> u32 {
    let mut level = level;
    let mut experience = u64::from(experience) + u64::from(amount);
    let mut gained = 0;
    while experience >= u64::from(experience_to_next_level(level)) {
        experience -= u64::from(experience_to_next_level(level));
        level += 1;
        gained += 1;
    }
    gained
}

/// Class HP formula: `base + level * level_coefficient + primary * stat_coefficient`.
pub fn max_hp_for(class: ProgressionClass, level: u32, stats: &Stats) -> u32 {
    let data = class.data();
    let primary = stats.get(data.primary_stat);
    data.base_hp
        .saturating_add(level.saturating_mul(data.level_coefficient))
        .saturating_add(primary.saturating_mul(data.stat_coefficient))
}

/// Energy pool: `50 + level * 5 + intelligence * 2`.
pub fn max_energy_for(level: u32, stats: &Stats) -> u32 {
    50u32
        .saturating_add(level.saturating_mul(5))
        .saturating_add(stats.intelligence.saturating_mul(2))
}

/// Visual tier for a level. Tiers only change at fixed breakpoints.
pub fn sprite_tier(level: u32) -> u32 {
    match level {
        0..=4 => 1,
        5..=9 => 5,
        10..=14 => 10,
        15..=94 => 15,
        95..=99 => 95,
        _ => 100,
    }
}

impl Fighter {
    /// Add experience, leveling up as many times as it covers.
    ///
    /// Returns true if at least one level was gained.
    pub fn gain_xp(&mut self, amount: u32) -> bool {
        // Summed wide so a grant near u32::MAX is never cut short.
        let mut experience = u64::from(self.experience) + u64::from(amount);
        let primary = self.progression_class().data().primary_stat;
        let starting_level = self.level;

        while experience >= u64::from(experience_to_next_level(self.level)) {
            experience -= u64::from(experience_to_next_level(self.level));
            self.level += 1;
            self.free_points = self.free_points.saturating_add(STAT_POINTS_PER_LEVEL);
            self.stats.add(primary, 1);
            self.recalculate_max_hp();
            self.refresh_abilities();
        }
        // Below one level's threshold, so it always fits.
        self.experience = u32::try_from(experience).unwrap_or(u32::MAX);

        let leveled_up = self.level > starting_level;
        if leveled_up {
            info!(
                fighter = %self.id,
                from = starting_level,
                to = self.level,
                "fighter leveled up"
            );
        }
        leveled_up
    }

    /// Spend free points on a stat.
    ///
    /// Fails with no mutation if `points` is not positive or exceeds the
    /// available free points.
    pub fn allocate_stat(&mut self, stat: AllocatableStat, points: i32) -> bool {
        if points <= 0 {
            return false;
        }
        let points = points as u32;
        if points > self.free_points {
            return false;
        }

        self.stats.add(stat.stat_kind(), points);
        self.free_points -= points;
        self.recalculate_max_hp();
        true
    }

    /// Max HP from level and base stats.
    pub fn calculate_max_hp(&self) -> u32 {
        max_hp_for(self.progression_class(), self.level, &self.stats)
    }

    pub fn max_energy(&self) -> u32 {
        max_energy_for(self.level, &self.stats)
    }

    pub fn experience_to_next_level(&self) -> u32 {
        experience_to_next_level(self.level)
    }

    /// Sprite file for the class and level tier, e.g. `archer10.png`.
    pub fn sprite_url(&self) -> String {
        format!(
            "{}{}.png",
            self.progression_class().sprite_name(),
            sprite_tier(self.level)
        )
    }

    pub(crate) fn recalculate_max_hp(&mut self) {
        let maximum = self.calculate_max_hp();
        self.hp.set_maximum(maximum);
    }

    /// Unlock every ability the current level reaches. Never re-locks.
    pub(crate) fn refresh_abilities(&mut self) {
        for ability in &mut self.abilities {
            ability.is_unlocked = ability.is_unlocked || self.level >= ability.unlock_level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fighter::FighterClass;

    fn fighter(class: FighterClass) -> Fighter {
        Fighter::new("0xabc", "Test", class)
    }

    #[test]
    fn test_threshold_formula() {
        assert_eq!(experience_to_next_level(1), 100);
        assert_eq!(experience_to_next_level(2), 200);
        assert_eq!(experience_to_next_level(7), 700);
    }

    #[test]
    fn test_gain_xp_below_threshold() {
        let mut f = fighter(FighterClass::Warrior);
        assert!(!f.gain_xp(99));
        assert_eq!(f.level, 1);
        assert_eq!(f.experience, 99);
        assert_eq!(f.free_points, 0);
    }

    #[test]
    fn test_gain_xp_exact_threshold() {
        let mut f = fighter(FighterClass::Warrior);
        let strength = f.stats.strength;
        assert!(f.gain_xp(100));
        assert_eq!(f.level, 2);
        assert_eq!(f.experience, 0);
        assert_eq!(f.free_points, STAT_POINTS_PER_LEVEL);
        assert_eq!(f.stats.strength, strength + 1);
    }

    #[test]
    fn test_level_up_raises_primary_stat_per_class() {
        let mut mage = fighter(FighterClass::Mage);
        let intelligence = mage.stats.intelligence;
        mage.gain_xp(100);
        assert_eq!(mage.stats.intelligence, intelligence + 1);

        let mut ranger = fighter(FighterClass::Ranged);
        let agility = ranger.stats.agility;
        ranger.gain_xp(100);
        assert_eq!(ranger.stats.agility, agility + 1);
    }

    #[test]
    fn test_levels_gained_preview_matches_gain_xp() {
        for amount in [0, 50, 100, 299, 300, 600, 1500] {
            let mut f = fighter(FighterClass::Rogue);
            f.gain_xp(40);
            let preview = levels_gained(f.level, f.experience, amount);
            let before = f.level;
            f.gain_xp(amount);
            assert_eq!(f.level - before, preview, "amount {amount}");
        }
    }

    #[test]
    fn test_huge_grant_keeps_every_point() {
        let mut f = fighter(FighterClass::Warrior);
        f.gain_xp(50);
        let preview = levels_gained(f.level, f.experience, u32::MAX);
        f.gain_xp(u32::MAX);

        assert_eq!(f.level, 1 + preview);
        let spent: u64 = (1..f.level)
            .map(|level| u64::from(experience_to_next_level(level)))
            .sum();
        assert_eq!(spent + u64::from(f.experience), 50 + u64::from(u32::MAX));
        assert!(f.experience < f.experience_to_next_level());
    }

    #[test]
    fn test_allocate_recalculates_hp() {
        let mut f = fighter(FighterClass::Warrior);
        f.gain_xp(100);
        let max = f.hp.maximum;
        assert!(f.allocate_stat(AllocatableStat::Strength, 2));
        assert_eq!(f.hp.maximum, max + 2 * 3);
        assert_eq!(f.hp.maximum, f.calculate_max_hp());
    }

    #[test]
    fn test_allocate_non_primary_keeps_hp() {
        let mut f = fighter(FighterClass::Warrior);
        f.gain_xp(100);
        let max = f.hp.maximum;
        assert!(f.allocate_stat(AllocatableStat::Intelligence, 1));
        assert_eq!(f.hp.maximum, max);
    }

    #[test]
    fn test_sprite_tier_breakpoints() {
        let cases = [
            (1, 1),
            (4, 1),
            (5, 5),
            (9, 5),
            (10, 10),
            (14, 10),
            (15, 15),
            (94, 15),
            (95, 95),
            (99, 95),
            (100, 100),
            (250, 100),
        ];
        for (level, tier) in cases {
            assert_eq!(sprite_tier(level), tier, "level {level}");
        }
    }

    #[test]
    fn test_sprite_url_uses_display_name() {
        let mut f = fighter(FighterClass::Ranged);
        assert_eq!(f.sprite_url(), "archer1.png");
        f.level = 10;
        assert_eq!(f.sprite_url(), "archer10.png");

        let w = fighter(FighterClass::Warrior);
        assert_eq!(w.sprite_url(), "warrior1.png");
    }

    #[test]
    fn test_max_energy_scales_with_intelligence() {
        let warrior = fighter(FighterClass::Warrior);
        let mage = fighter(FighterClass::Mage);
        assert!(mage.max_energy() > warrior.max_energy());
        assert_eq!(mage.max_energy(), 50 + 5 + 10 * 2);
    }
}
