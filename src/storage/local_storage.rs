use std::{fs, io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};

use super::KeyValueStorage;

/// File-backed storage: one `<key>.json` file per key under `base_path`.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        log::debug!("STORAGE GET: key='{}'", key);
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(content) => {
                log::debug!("STORAGE GET RESULT: {} bytes", content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("STORAGE GET RESULT: missing");
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        log::debug!("STORAGE PUT: key='{}', size={} bytes", key, content.len());
        let path = self.path_for(key);
        // Keys may contain '/', so create the snapshot's own directory.
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        // Readers never observe a partially written snapshot.
        let staging = self.base_path.join(format!("{}.json.tmp", key));
        fs::write(&staging, content)
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        fs::rename(&staging, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        log::debug!("STORAGE PUT RESULT: success");
        Ok(())
    }
}
