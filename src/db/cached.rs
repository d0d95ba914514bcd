use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};

use crate::db::query::{field_equals, sort_and_paginate};
use crate::db::types::{Entity, Page, QueryOptions, RecordMeta};
use crate::db::Repository;
use crate::error::{RepoError, RepoResult};
use crate::storage::KeyValueStorage;

/// Repository backend holding a collection in process memory and
/// snapshotting it to a [`KeyValueStorage`] under one key.
///
/// The snapshot is loaded on first use and rewritten wholesale after every
/// mutation. Mutations are applied to a copy and only become visible once
/// the snapshot write succeeded, so a failed write has no side effects.
pub struct CachedRepository<E: Entity> {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    records: RwLock<Option<Vec<E>>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> CachedRepository<E> {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key_prefix: &str) -> Self {
        Self {
            storage,
            key: format!("{}{}", key_prefix, E::COLLECTION),
            records: RwLock::new(None),
            _entity: PhantomData,
        }
    }

    fn load(&self) -> Result<Vec<E>> {
        log::debug!("CACHE LOAD: key='{}'", self.key);
        match self.storage.get(&self.key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to decode snapshot '{}'", self.key)),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self, records: &[E]) -> Result<()> {
        let bytes = serde_json::to_vec(records)
            .with_context(|| format!("Failed to encode snapshot '{}'", self.key))?;
        self.storage.put(&self.key, &bytes)
    }

    fn read<R>(&self, f: impl FnOnce(&[E]) -> R) -> Result<R> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire cache lock"))?;
        if guard.is_none() {
            *guard = Some(self.load()?);
        }
        let records = guard.get_or_insert_with(Vec::new);
        Ok(f(records))
    }

    /// Runs `f` against a copy of the collection. `None` means nothing
    /// changed and skips the snapshot write.
    fn write<R>(&self, f: impl FnOnce(&mut Vec<E>) -> Option<R>) -> Result<Option<R>> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire cache lock"))?;
        if guard.is_none() {
            *guard = Some(self.load()?);
        }
        let records = guard.get_or_insert_with(Vec::new);

        let mut next = records.clone();
        let Some(result) = f(&mut next) else {
            return Ok(None);
        };
        self.persist(&next)?;
        *records = next;
        Ok(Some(result))
    }
}

impl<E: Entity> Repository<E> for CachedRepository<E> {
    fn find_all(&self, options: &QueryOptions) -> RepoResult<Page<E>> {
        let records = self
            .read(|records| records.to_vec())
            .map_err(|e| RepoError::storage("find_all", e))?;
        Ok(sort_and_paginate(records, options))
    }

    fn find_by_id(&self, id: &str) -> RepoResult<E> {
        self.read(|records| records.iter().find(|r| r.id() == id).cloned())
            .map_err(|e| RepoError::storage("find_by_id", e))?
            .ok_or_else(|| RepoError::not_found(E::COLLECTION, id))
    }

    fn find_by_ids(&self, ids: &[String]) -> RepoResult<Vec<E>> {
        self.read(|records| {
            ids.iter()
                .filter_map(|id| records.iter().find(|r| r.id() == id).cloned())
                .collect()
        })
        .map_err(|e| RepoError::storage("find_by_ids", e))
    }

    fn find_where(&self, field: &str, value: &str) -> RepoResult<Vec<E>> {
        self.read(|records| {
            records
                .iter()
                .filter(|r| field_equals(*r, field, value))
                .cloned()
                .collect()
        })
        .map_err(|e| RepoError::storage("find_where", e))
    }

    fn create(&self, input: E::Create) -> RepoResult<E> {
        let entity = E::build(RecordMeta::new(E::ID_PREFIX), input);
        self.write(|records| {
            records.push(entity.clone());
            Some(())
        })
        .map_err(|e| RepoError::storage("create", e))?;
        log::debug!("CREATE: {} '{}'", E::COLLECTION, entity.id());
        Ok(entity)
    }

    fn update(&self, id: &str, patch: E::Patch) -> RepoResult<E> {
        self.write(|records| {
            let record = records.iter_mut().find(|r| r.id() == id)?;
            record.apply(patch);
            record.meta_mut().touch();
            Some(record.clone())
        })
        .map_err(|e| RepoError::storage("update", e))?
        .ok_or_else(|| RepoError::not_found(E::COLLECTION, id))
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<bool> {
        self.write(|records| {
            let index = records.iter().position(|r| r.id() == id)?;
            records.remove(index);
            Some(true)
        })
        .map_err(|e| RepoError::storage("delete_by_id", e))?
        .ok_or_else(|| RepoError::not_found(E::COLLECTION, id))
    }

    fn delete_by_ids(&self, ids: &[String]) -> RepoResult<usize> {
        let removed = self
            .write(|records| {
                let before = records.len();
                records.retain(|r| !ids.iter().any(|id| id == r.id()));
                let removed = before - records.len();
                (removed > 0).then_some(removed)
            })
            .map_err(|e| RepoError::storage("delete_by_ids", e))?;
        Ok(removed.unwrap_or(0))
    }

    fn count(&self) -> RepoResult<usize> {
        self.read(|records| records.len())
            .map_err(|e| RepoError::storage("count", e))
    }
}
