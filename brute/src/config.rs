//! Environment configuration for the command-line arena.

use brute_core::BattleConfig;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

const DEFAULT_DATA_DIR: &str = "brute-data";

#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Root of the JSON store.
    pub data_dir: PathBuf,
    pub battle: BattleConfig,
}

impl CliConfig {
    /// Read `BRUTE_DATA_DIR`, `BRUTE_TURN_CAP` and `BRUTE_SKILL_CHANCE`.
    ///
    /// Unset variables fall back to defaults; unparsable ones are logged and ignored.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("BRUTE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let mut battle = BattleConfig::default();
        if let Some(turn_cap) = env_number::<u32>("BRUTE_TURN_CAP") {
            battle = battle.with_turn_cap(turn_cap);
        }
        if let Some(skill_chance) = env_number::<u32>("BRUTE_SKILL_CHANCE") {
            battle = battle.with_skill_chance(skill_chance);
        }

        Self { data_dir, battle }
    }
}

fn env_number<T: FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(key, value = %value, "ignoring invalid number in environment");
            None
        }
    }
}
