//! Auto-battler combat engine and character progression.
//!
//! This crate provides:
//! - Fighters with classes, stats, abilities and equipment
//! - Experience, leveling, stat allocation and sprite tiers
//! - A deterministic, seedable combat simulator producing replayable logs
//! - Fighter and fight persistence behind an async store trait
//! - An arena that matchmakes, fights and persists results
//!
//! # Quick Start
//!
//! ```ignore
//! use brute_core::{Arena, BattleConfig, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let arena = Arena::new(MemoryStore::new(), BattleConfig::default());
//!
//!     let mine = arena.fighter_for_owner("0xabc").await?;
//!     let theirs = arena.fighter_for_owner("0xdef").await?;
//!
//!     let report = arena.fight(mine.id, theirs.id, 42).await?;
//!     for step in &report.log().steps {
//!         println!("{}", step.description);
//!     }
//!     Ok(())
//! }
//! ```

pub mod arena;
pub mod battle_log;
pub mod class_data;
pub mod combat;
pub mod dice;
pub mod equipment;
pub mod fighter;
pub mod fighter_builder;
pub mod generator;
pub mod items;
pub mod persist;
pub mod progression;

// Primary public API
pub use arena::{Arena, ArenaError, FightReport};
pub use battle_log::{BattleLog, BattleOutcome, EndReason, FightStep, StepType};
pub use combat::{simulate, simulate_with_rng, validate_matchup, BattleConfig, ValidationError};
pub use equipment::{Equipment, EquipmentSlot, Item};
pub use fighter::{AllocatableStat, Fighter, FighterClass, FighterId, ProgressionClass, Stats};
pub use fighter_builder::{BuilderError, FighterBuilder};
pub use generator::generate_fighter;
pub use persist::{FightId, FightRecord, FighterStore, JsonStore, MemoryStore, PersistError};
pub use progression::{experience_to_next_level, sprite_tier};
