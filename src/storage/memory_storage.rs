use std::{collections::HashMap, sync::{Arc, RwLock}};

use anyhow::Result;

use super::KeyValueStorage;

/// Process-local storage. Clones share the same map, which lets tests
/// reopen a store over the same durable state.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        log::debug!("STORAGE GET: key='{}'", key);
        let data = self
            .data
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire read lock"))?;
        let content = data.get(key).cloned();
        match &content {
            Some(bytes) => log::debug!("STORAGE GET RESULT: {} bytes", bytes.len()),
            None => log::debug!("STORAGE GET RESULT: missing"),
        }
        Ok(content)
    }

    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        log::debug!("STORAGE PUT: key='{}', size={} bytes", key, content.len());
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire write lock"))?;
        data.insert(key.to_string(), content.to_vec());
        log::debug!("STORAGE PUT RESULT: success");
        Ok(())
    }
}
