// Re-export all public items from the db modules
pub use cached::CachedRepository;
pub use filter::{Filter, FilterExt};
pub use indexed::{IndexedDb, TableRepository};
pub use repository::Repository;
pub use types::*;

pub mod cached;
pub mod filter;
pub mod indexed;
pub mod query;
pub mod repository;
pub mod types;
