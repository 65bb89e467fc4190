//! Fighter and fight persistence.
//!
//! [`FighterStore`] is the storage seam used by the arena. [`MemoryStore`]
//! keeps everything in process and suits tests; [`JsonStore`] writes one
//! pretty-printed JSON file per fighter and per fight record:
//!
//! ```text
//! <root>/fighters/<fighter-id>.json
//! <root>/fights/<fight-id>.json
//! ```
//!
//! Every file carries a format version and loading a file with a different
//! version fails with [`PersistError::VersionMismatch`].

use crate::battle_log::BattleLog;
use crate::fighter::{Fighter, FighterId};
use crate::generator::normalize_owner;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fighter {0} not found")]
    FighterNotFound(FighterId),

    #[error("Fight {0} not found")]
    FightNotFound(FightId),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current store file version.
pub const STORE_VERSION: u32 = 1;

/// Unique identifier for a recorded fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FightId(pub Uuid);

impl FightId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FightId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FightId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A stored fight with its full log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightRecord {
    pub id: FightId,
    pub fighter_a: FighterId,
    pub fighter_b: FighterId,
    pub winner: FighterId,
    /// Seconds since the Unix epoch.
    pub recorded_at: u64,
    pub log: BattleLog,
}

impl FightRecord {
    pub fn new(log: BattleLog) -> Self {
        Self {
            id: FightId::new(),
            fighter_a: log.participants[0].id,
            fighter_b: log.participants[1].id,
            winner: log.outcome.winner,
            recorded_at: unix_now(),
            log,
        }
    }

    pub fn involves(&self, fighter: FighterId) -> bool {
        self.fighter_a == fighter || self.fighter_b == fighter
    }
}

fn unix_now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Storage for fighters and fight records.
#[async_trait]
pub trait FighterStore: Send + Sync {
    async fn load_fighter(&self, id: FighterId) -> Result<Fighter, PersistError>;

    /// Insert or replace a fighter.
    async fn save_fighter(&self, fighter: &Fighter) -> Result<(), PersistError>;

    /// The fighter owned by `owner`, matched case-insensitively.
    async fn find_by_owner(&self, owner: &str) -> Result<Option<Fighter>, PersistError>;

    /// All fighters, ordered by id.
    async fn list_fighters(&self) -> Result<Vec<Fighter>, PersistError>;

    /// Record a finished fight.
    async fn append_fight(&self, log: BattleLog) -> Result<FightRecord, PersistError>;

    async fn load_fight(&self, id: FightId) -> Result<FightRecord, PersistError>;

    /// Save both fighters of a finished fight and record its log as one unit.
    ///
    /// On error none of the writes remain. The default saves one record at a
    /// time and puts back the previous fighters if a later write fails.
    async fn commit_fight(
        &self,
        fighters: [&Fighter; 2],
        log: BattleLog,
    ) -> Result<FightRecord, PersistError> {
        let mut saved: Vec<Fighter> = Vec::with_capacity(2);
        for fighter in fighters {
            let previous = self.load_fighter(fighter.id).await?;
            if let Err(e) = self.save_fighter(fighter).await {
                restore_fighters(self, &saved).await;
                return Err(e);
            }
            saved.push(previous);
        }

        match self.append_fight(log).await {
            Ok(record) => Ok(record),
            Err(e) => {
                restore_fighters(self, &saved).await;
                Err(e)
            }
        }
    }
}

/// Put back fighters saved by a failed [`FighterStore::commit_fight`].
async fn restore_fighters<S: FighterStore + ?Sized>(store: &S, previous: &[Fighter]) {
    for fighter in previous.iter().rev() {
        if let Err(e) = store.save_fighter(fighter).await {
            warn!(fighter = %fighter.id, error = %e, "failed to roll back fighter");
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    fighters: RwLock<HashMap<FighterId, Fighter>>,
    fights: RwLock<HashMap<FightId, FightRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored fight involving a fighter, oldest first.
    pub async fn fights_for(&self, fighter: FighterId) -> Vec<FightRecord> {
        let fights = self.fights.read().await;
        let mut records: Vec<_> = fights
            .values()
            .filter(|r| r.involves(fighter))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.recorded_at, r.id));
        records
    }
}

#[async_trait]
impl FighterStore for MemoryStore {
    async fn load_fighter(&self, id: FighterId) -> Result<Fighter, PersistError> {
        self.fighters
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(PersistError::FighterNotFound(id))
    }

    async fn save_fighter(&self, fighter: &Fighter) -> Result<(), PersistError> {
        self.fighters
            .write()
            .await
            .insert(fighter.id, fighter.clone());
        Ok(())
    }

    async fn find_by_owner(&self, owner: &str) -> Result<Option<Fighter>, PersistError> {
        let owner = normalize_owner(owner);
        let fighters = self.fighters.read().await;
        let mut owned: Vec<_> = fighters.values().filter(|f| f.is_owned_by(&owner)).collect();
        owned.sort_by_key(|f| f.id);
        Ok(owned.first().map(|f| (*f).clone()))
    }

    async fn list_fighters(&self) -> Result<Vec<Fighter>, PersistError> {
        let mut fighters: Vec<_> = self.fighters.read().await.values().cloned().collect();
        fighters.sort_by_key(|f| f.id);
        Ok(fighters)
    }

    async fn append_fight(&self, log: BattleLog) -> Result<FightRecord, PersistError> {
        let record = FightRecord::new(log);
        self.fights.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn load_fight(&self, id: FightId) -> Result<FightRecord, PersistError> {
        self.fights
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(PersistError::FightNotFound(id))
    }

    async fn commit_fight(
        &self,
        fighters: [&Fighter; 2],
        log: BattleLog,
    ) -> Result<FightRecord, PersistError> {
        let mut stored = self.fighters.write().await;
        let mut fights = self.fights.write().await;
        let record = FightRecord::new(log);
        for fighter in fighters {
            stored.insert(fighter.id, fighter.clone());
        }
        fights.insert(record.id, record.clone());
        Ok(record)
    }
}

// ============================================================================
// JSON file store
// ============================================================================

#[derive(Serialize, Deserialize)]
struct Versioned<T> {
    version: u32,
    data: T,
}

/// One JSON file per fighter and per fight under a root directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `root`, creating its directories if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, PersistError> {
        let store = Self {
            root: root.as_ref().to_path_buf(),
        };
        fs::create_dir_all(store.fighters_dir()).await?;
        fs::create_dir_all(store.fights_dir()).await?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn fighters_dir(&self) -> PathBuf {
        self.root.join("fighters")
    }

    fn fights_dir(&self) -> PathBuf {
        self.root.join("fights")
    }

    fn fighter_path(&self, id: FighterId) -> PathBuf {
        self.fighters_dir().join(format!("{id}.json"))
    }

    fn fight_path(&self, id: FightId) -> PathBuf {
        self.fights_dir().join(format!("{id}.json"))
    }
}

/// A fully written temporary file waiting to replace its target.
struct Staged {
    tmp: PathBuf,
    target: PathBuf,
}

impl Staged {
    async fn commit(self) -> Result<(), PersistError> {
        fs::rename(&self.tmp, &self.target).await?;
        Ok(())
    }

    async fn discard(self) {
        if let Err(e) = fs::remove_file(&self.tmp).await {
            warn!(path = %self.tmp.display(), error = %e, "failed to remove staged file");
        }
    }
}

async fn stage_versioned<T: Serialize>(path: &Path, data: &T) -> Result<Staged, PersistError> {
    let content = serde_json::to_string_pretty(&Versioned {
        version: STORE_VERSION,
        data,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).await?;
    Ok(Staged {
        tmp,
        target: path.to_path_buf(),
    })
}

/// Write through a temporary file so readers never see a partial record.
async fn write_versioned<T: Serialize>(path: &Path, data: &T) -> Result<(), PersistError> {
    stage_versioned(path, data).await?.commit().await
}

/// Read a versioned file. A missing file is `Ok(None)`.
async fn read_versioned<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let stored: Versioned<T> = serde_json::from_str(&content)?;
    if stored.version != STORE_VERSION {
        return Err(PersistError::VersionMismatch {
            expected: STORE_VERSION,
            found: stored.version,
        });
    }
    Ok(Some(stored.data))
}

#[async_trait]
impl FighterStore for JsonStore {
    async fn load_fighter(&self, id: FighterId) -> Result<Fighter, PersistError> {
        read_versioned(&self.fighter_path(id))
            .await?
            .ok_or(PersistError::FighterNotFound(id))
    }

    async fn save_fighter(&self, fighter: &Fighter) -> Result<(), PersistError> {
        write_versioned(&self.fighter_path(fighter.id), fighter).await
    }

    async fn find_by_owner(&self, owner: &str) -> Result<Option<Fighter>, PersistError> {
        let owner = normalize_owner(owner);
        Ok(self
            .list_fighters()
            .await?
            .into_iter()
            .find(|f| f.is_owned_by(&owner)))
    }

    async fn list_fighters(&self) -> Result<Vec<Fighter>, PersistError> {
        let mut fighters = Vec::new();
        let mut entries = fs::read_dir(self.fighters_dir()).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(fighter) = read_versioned::<Fighter>(&path).await? {
                    fighters.push(fighter);
                }
            }
        }

        fighters.sort_by_key(|f| f.id);
        Ok(fighters)
    }

    async fn append_fight(&self, log: BattleLog) -> Result<FightRecord, PersistError> {
        let record = FightRecord::new(log);
        write_versioned(&self.fight_path(record.id), &record).await?;
        Ok(record)
    }

    async fn load_fight(&self, id: FightId) -> Result<FightRecord, PersistError> {
        read_versioned(&self.fight_path(id))
            .await?
            .ok_or(PersistError::FightNotFound(id))
    }

    /// Every file is written out before any of them replaces its target.
    async fn commit_fight(
        &self,
        fighters: [&Fighter; 2],
        log: BattleLog,
    ) -> Result<FightRecord, PersistError> {
        let record = FightRecord::new(log);
        let mut staged = Vec::with_capacity(3);
        for fighter in fighters {
            match stage_versioned(&self.fighter_path(fighter.id), fighter).await {
                Ok(file) => staged.push(file),
                Err(e) => {
                    discard_all(staged).await;
                    return Err(e);
                }
            }
        }
        match stage_versioned(&self.fight_path(record.id), &record).await {
            Ok(file) => staged.push(file),
            Err(e) => {
                discard_all(staged).await;
                return Err(e);
            }
        }

        for file in staged {
            file.commit().await?;
        }
        Ok(record)
    }
}

async fn discard_all(staged: Vec<Staged>) {
    for file in staged {
        file.discard().await;
    }
}
