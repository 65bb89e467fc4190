//! Arena - the primary public API for running fights.
//!
//! The arena ties the store, the combat engine and progression together.
//! It loads fighters, simulates, applies the earned experience, persists
//! the results and records the fight log. Fighters taking part in a fight
//! are locked for its whole duration, always in id order, so concurrent
//! fights sharing a fighter are serialized and never deadlock.

use crate::battle_log::BattleLog;
use crate::combat::{simulate, validate_matchup, BattleConfig, ValidationError};
use crate::equipment::{EquipError, EquipmentSlot};
use crate::fighter::{AllocatableStat, Fighter, FighterId};
use crate::generator::generate_fighter;
use crate::items::find_item;
use crate::persist::{FightId, FightRecord, FighterStore, PersistError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

/// Errors from arena operations.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("Storage error: {0}")]
    Persist(#[from] PersistError),

    #[error("Invalid fighter: {0}")]
    Validation(#[from] ValidationError),

    #[error("Equipment error: {0}")]
    Equip(#[from] EquipError),

    #[error("No opponent available for fighter {0}")]
    NoOpponent(FighterId),

    #[error("Fighter {fighter} is not owned by {owner}")]
    NotOwner { fighter: FighterId, owner: String },

    #[error("Cannot allocate {requested} points with {available} available")]
    InvalidAllocation { requested: i32, available: u32 },

    #[error("Unknown item: {0}")]
    UnknownItem(String),
}

/// Result of an arena fight, with both fighters as saved afterwards.
#[derive(Debug, Clone)]
pub struct FightReport {
    pub record: FightRecord,
    pub fighter_a: Fighter,
    pub fighter_b: Fighter,
}

impl FightReport {
    pub fn fight_id(&self) -> FightId {
        self.record.id
    }

    pub fn log(&self) -> &BattleLog {
        &self.record.log
    }

    pub fn winner(&self) -> &Fighter {
        if self.fighter_a.id == self.record.winner {
            &self.fighter_a
        } else {
            &self.fighter_b
        }
    }

    pub fn loser(&self) -> &Fighter {
        if self.fighter_a.id == self.record.winner {
            &self.fighter_b
        } else {
            &self.fighter_a
        }
    }
}

type LockTable = SyncMutex<HashMap<FighterId, Arc<Mutex<()>>>>;

/// Exclusive hold on one fighter. Its table entry is removed on release
/// once no other task holds or waits for it.
struct FighterGuard<'a> {
    table: &'a LockTable,
    id: FighterId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FighterGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.id);
        }
    }
}

/// Fight orchestration over a [`FighterStore`].
pub struct Arena<S: FighterStore> {
    store: S,
    config: BattleConfig,
    locks: LockTable,
    matchmaking: Mutex<StdRng>,
}

impl<S: FighterStore> Arena<S> {
    pub fn new(store: S, config: BattleConfig) -> Self {
        Self {
            store,
            config,
            locks: SyncMutex::new(HashMap::new()),
            matchmaking: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Make opponent selection reproducible.
    pub fn with_matchmaking_seed(mut self, seed: u64) -> Self {
        self.matchmaking = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    async fn lock(&self, id: FighterId) -> FighterGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(id).or_default().clone()
        };
        FighterGuard {
            table: &self.locks,
            id,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Lock two distinct fighters in id order.
    async fn lock_pair(&self, a: FighterId, b: FighterId) -> (FighterGuard<'_>, FighterGuard<'_>) {
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first = self.lock(first).await;
        let second = self.lock(second).await;
        (first, second)
    }

    async fn load_owned(&self, owner: &str, id: FighterId) -> Result<Fighter, ArenaError> {
        let fighter = self.store.load_fighter(id).await?;
        if !fighter.is_owned_by(owner.trim()) {
            return Err(ArenaError::NotOwner {
                fighter: id,
                owner: owner.to_string(),
            });
        }
        Ok(fighter)
    }

    /// The owner's fighter, generating and saving one on first visit.
    pub async fn fighter_for_owner(&self, owner: &str) -> Result<Fighter, ArenaError> {
        if let Some(fighter) = self.store.find_by_owner(owner).await? {
            return Ok(fighter);
        }

        let fighter = generate_fighter(owner);
        self.store.save_fighter(&fighter).await?;
        info!(
            fighter = %fighter.id,
            owner = %fighter.owner,
            class = %fighter.class,
            "created fighter"
        );
        Ok(fighter)
    }

    /// Pick a random stored fighter other than `requester`.
    pub async fn find_opponent(&self, requester: FighterId) -> Result<Fighter, ArenaError> {
        let mut candidates: Vec<Fighter> = self
            .store
            .list_fighters()
            .await?
            .into_iter()
            .filter(|f| f.id != requester)
            .collect();
        if candidates.is_empty() {
            return Err(ArenaError::NoOpponent(requester));
        }

        let index = self.matchmaking.lock().await.gen_range(0..candidates.len());
        Ok(candidates.swap_remove(index))
    }

    /// Run a fight between two stored fighters and persist the outcome.
    ///
    /// Both fighters gain their experience and are restored to full HP.
    pub async fn fight(
        &self,
        a: FighterId,
        b: FighterId,
        seed: u64,
    ) -> Result<FightReport, ArenaError> {
        if a == b {
            return Err(ValidationError::SameFighter(a).into());
        }
        let _guards = self.lock_pair(a, b).await;

        let mut fighter_a = self.store.load_fighter(a).await?;
        let mut fighter_b = self.store.load_fighter(b).await?;
        validate_matchup(&fighter_a, &fighter_b)?;

        let log = simulate(&fighter_a, &fighter_b, &self.config, seed);
        let outcome = log.outcome.clone();

        for fighter in [&mut fighter_a, &mut fighter_b] {
            let reward = if fighter.id == outcome.winner {
                outcome.winner_reward
            } else {
                outcome.loser_reward
            };
            let before = fighter.level;
            fighter.gain_xp(reward.xp);
            if fighter.level - before != reward.levels_gained {
                warn!(
                    fighter = %fighter.id,
                    previewed = reward.levels_gained,
                    applied = fighter.level - before,
                    "level-up preview disagrees with applied experience"
                );
            }
            fighter.hp.restore();
        }

        let record = self
            .store
            .commit_fight([&fighter_a, &fighter_b], log)
            .await?;

        info!(
            fight = %record.id,
            winner = %outcome.winner,
            loser = %outcome.loser,
            reason = ?outcome.reason,
            turns = outcome.turns,
            "arena fight recorded"
        );

        Ok(FightReport {
            record,
            fighter_a,
            fighter_b,
        })
    }

    /// Matchmake an owned fighter against a random opponent and fight.
    pub async fn challenge(
        &self,
        owner: &str,
        fighter: FighterId,
        seed: u64,
    ) -> Result<FightReport, ArenaError> {
        self.load_owned(owner, fighter).await?;
        let opponent = self.find_opponent(fighter).await?;
        self.fight(fighter, opponent.id, seed).await
    }

    /// Spend free points on an owned fighter.
    pub async fn allocate(
        &self,
        owner: &str,
        fighter: FighterId,
        stat: AllocatableStat,
        points: i32,
    ) -> Result<Fighter, ArenaError> {
        let _guard = self.lock(fighter).await;
        let mut loaded = self.load_owned(owner, fighter).await?;
        if !loaded.allocate_stat(stat, points) {
            return Err(ArenaError::InvalidAllocation {
                requested: points,
                available: loaded.free_points,
            });
        }
        self.store.save_fighter(&loaded).await?;
        Ok(loaded)
    }

    /// Equip a named item from the item database on an owned fighter.
    pub async fn equip(
        &self,
        owner: &str,
        fighter: FighterId,
        slot: EquipmentSlot,
        item: &str,
    ) -> Result<Fighter, ArenaError> {
        let found = find_item(item).ok_or_else(|| ArenaError::UnknownItem(item.to_string()))?;
        let _guard = self.lock(fighter).await;
        let mut loaded = self.load_owned(owner, fighter).await?;
        loaded.equip(slot, found)?;
        self.store.save_fighter(&loaded).await?;
        Ok(loaded)
    }

    /// Load a recorded fight for replay.
    pub async fn replay(&self, fight: FightId) -> Result<FightRecord, ArenaError> {
        Ok(self.store.load_fight(fight).await?)
    }
}
