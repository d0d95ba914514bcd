use anyhow::Result;

/// Durable key/value substrate behind the cached repository backend. Each
/// collection snapshot lives under a single key.
pub trait KeyValueStorage: Send + Sync {
    /// Returns `None` when nothing has been stored under `key` yet.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, content: &[u8]) -> Result<()>;
}
