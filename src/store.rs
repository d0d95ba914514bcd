use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::activity::ActivityService;
use crate::db::{CachedRepository, IndexedDb, Repository};
use crate::model::{Activity, ActivityCategory, Competition, Fixture, Team};
use crate::storage::{InMemoryStorage, KeyValueStorage, LocalStorage};
use crate::sync::ActivitySyncEngine;

pub const DEFAULT_KEY_PREFIX: &str = "rosterdb.";

/// Which substrate the repositories sit on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Key/value snapshots held in process memory.
    #[default]
    Memory,
    /// Key/value snapshots written as one JSON file per collection.
    Local { path: PathBuf },
    /// SQLite tables in an in-memory database.
    IndexedMemory,
    /// SQLite tables in the database file at `path`.
    Indexed { path: PathBuf },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendConfig,
    /// Prepended to each collection's snapshot key. Unused by the indexed
    /// backends.
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Memory,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

/// One repository per entity type, all on the same backend.
#[derive(Clone)]
pub struct Store {
    pub teams: Arc<dyn Repository<Team>>,
    pub competitions: Arc<dyn Repository<Competition>>,
    pub fixtures: Arc<dyn Repository<Fixture>>,
    pub categories: Arc<dyn Repository<ActivityCategory>>,
    pub activities: Arc<dyn Repository<Activity>>,
}

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    pub fn open(config: &StoreConfig) -> Result<Self> {
        log::info!("STORE OPEN: backend={:?}", config.backend);
        match &config.backend {
            BackendConfig::Memory => Ok(Self::cached(Arc::new(InMemoryStorage::new()), &config.key_prefix)),
            BackendConfig::Local { path } => Ok(Self::cached(Arc::new(LocalStorage::new(path.clone())), &config.key_prefix)),
            BackendConfig::IndexedMemory => Self::indexed(IndexedDb::open_memory()?),
            BackendConfig::Indexed { path } => Self::indexed(
                IndexedDb::open(path).with_context(|| format!("Failed to open store at {}", path.display()))?,
            ),
        }
    }

    fn cached(storage: Arc<dyn KeyValueStorage>, key_prefix: &str) -> Self {
        Store {
            teams: Arc::new(CachedRepository::new(storage.clone(), key_prefix)),
            competitions: Arc::new(CachedRepository::new(storage.clone(), key_prefix)),
            fixtures: Arc::new(CachedRepository::new(storage.clone(), key_prefix)),
            categories: Arc::new(CachedRepository::new(storage.clone(), key_prefix)),
            activities: Arc::new(CachedRepository::new(storage, key_prefix)),
        }
    }

    fn indexed(db: IndexedDb) -> Result<Self> {
        Ok(Store {
            teams: Arc::new(db.table::<Team>()?),
            competitions: Arc::new(db.table::<Competition>()?),
            fixtures: Arc::new(db.table::<Fixture>()?),
            categories: Arc::new(db.table::<ActivityCategory>()?),
            activities: Arc::new(db.table::<Activity>()?),
        })
    }

    pub fn activity_service(&self) -> ActivityService {
        ActivityService::new(self.activities.clone())
    }

    pub fn activity_sync(&self) -> ActivitySyncEngine {
        ActivitySyncEngine::new(
            self.activities.clone(),
            self.categories.clone(),
            self.competitions.clone(),
            self.fixtures.clone(),
            self.teams.clone(),
        )
    }
}

enum Backend {
    Config(BackendConfig),
    Storage(Arc<dyn KeyValueStorage>),
}

#[derive(Default)]
pub struct StoreBuilder {
    backend: Option<Backend>,
    key_prefix: Option<String>,
}

impl StoreBuilder {
    pub fn in_memory(mut self) -> Self {
        self.backend = Some(Backend::Config(BackendConfig::Memory));
        self
    }

    pub fn local(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.backend = Some(Backend::Config(BackendConfig::Local { path: base_path.into() }));
        self
    }

    pub fn indexed_memory(mut self) -> Self {
        self.backend = Some(Backend::Config(BackendConfig::IndexedMemory));
        self
    }

    pub fn indexed(mut self, path: impl Into<PathBuf>) -> Self {
        self.backend = Some(Backend::Config(BackendConfig::Indexed { path: path.into() }));
        self
    }

    /// Key/value backend over caller-supplied storage.
    pub fn storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.backend = Some(Backend::Storage(storage));
        self
    }

    pub fn key_prefix(mut self, key_prefix: &str) -> Self {
        self.key_prefix = Some(key_prefix.to_string());
        self
    }

    pub fn build(self) -> Result<Store> {
        let key_prefix = self.key_prefix.unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());
        match self.backend {
            Some(Backend::Storage(storage)) => Ok(Store::cached(storage, &key_prefix)),
            Some(Backend::Config(backend)) => Store::open(&StoreConfig { backend, key_prefix }),
            None => Store::open(&StoreConfig {
                key_prefix,
                ..Default::default()
            }),
        }
    }
}
