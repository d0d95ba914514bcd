mod key_value_storage;
mod local_storage;
mod memory_storage;

pub use key_value_storage::KeyValueStorage;
pub use local_storage::LocalStorage;
pub use memory_storage::InMemoryStorage;
