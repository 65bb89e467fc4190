//! Deterministic fighter generation from an owner address.
//!
//! The same owner always gets the same fighter: the SHA-256 of the
//! normalized address fixes the id, class, name and a small stat jitter.

use crate::fighter::{Fighter, FighterClass, FighterId, StatKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

const NAME_PREFIXES: &[&str] = &[
    "Bor", "Kra", "Gru", "Vel", "Thar", "Mor", "Zin", "Dra", "Fen", "Rok", "Sal", "Ul",
];

const NAME_SUFFIXES: &[&str] = &[
    "gar", "nak", "mir", "dok", "ra", "th", "zul", "ven", "ix", "os", "ka", "rin",
];

/// Stats that receive the random jitter.
const JITTER_STATS: &[StatKind] = &[
    StatKind::Strength,
    StatKind::Agility,
    StatKind::Intelligence,
    StatKind::Defense,
];

/// Upper bound (inclusive) of the jitter added to each stat.
const MAX_JITTER: u32 = 2;

/// Lowercased, trimmed owner address.
pub fn normalize_owner(owner: &str) -> String {
    owner.trim().to_lowercase()
}

/// Seed bytes for an owner.
pub fn owner_seed(owner: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(normalize_owner(owner).as_bytes());
    hasher.finalize().into()
}

/// Generate the starting fighter for an owner.
pub fn generate_fighter(owner: &str) -> Fighter {
    let seed = owner_seed(owner);
    let mut id_bytes = [0u8; 16];
    id_bytes.copy_from_slice(&seed[..16]);

    let mut rng = StdRng::from_seed(seed);
    let classes = FighterClass::all();
    let class = classes[rng.gen_range(0..classes.len())];
    let name = generate_name(&mut rng);

    let mut fighter = Fighter::new(normalize_owner(owner), name, class);
    fighter.id = FighterId::from_bytes(id_bytes);
    for &stat in JITTER_STATS {
        fighter.stats.add(stat, rng.gen_range(0..=MAX_JITTER));
    }
    fighter.recalculate_max_hp();
    fighter.hp.restore();
    fighter
}

fn generate_name<R: Rng>(rng: &mut R) -> String {
    let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.gen_range(0..NAME_SUFFIXES.len())];
    format!("{prefix}{suffix}")
}
