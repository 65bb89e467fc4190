//! Random rolls used by combat and matchmaking.
//!
//! Every roll takes the RNG explicitly. Fights stay replayable from a seed
//! and tests can pass a seeded `StdRng`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Roll a percentage chance. 0 never succeeds, 100 or more always does.
///
/// Certain outcomes do not consume randomness.
pub fn roll_percent<R: Rng>(rng: &mut R, chance: u32) -> bool {
    match chance {
        0 => false,
        c if c >= 100 => true,
        c => rng.gen_range(0..100) < c,
    }
}

/// Roll a multiplier uniformly in `[low, high)`. A degenerate band returns `low`.
pub fn roll_multiplier<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high <= low {
        low
    } else {
        rng.gen_range(low..high)
    }
}

pub fn coin_flip<R: Rng>(rng: &mut R) -> bool {
    rng.gen_bool(0.5)
}

/// An inclusive damage range carried by weapons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRange {
    pub min: u32,
    pub max: u32,
}

impl DamageRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Roll uniformly within the range.
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> u32 {
        if self.min >= self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

impl fmt::Display for DamageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}
