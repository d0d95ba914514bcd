pub mod activity;
pub mod db;
pub mod error;
pub mod model;
pub mod storage;
pub mod store;
pub mod sync;

pub use activity::ActivityService;
pub use db::{Entity, Filter, FilterExt, Page, QueryOptions, Repository, SortDirection};
pub use error::{PaginatedResult, RepoError, RepoResult, ResultEnvelope};
pub use store::{BackendConfig, Store, StoreBuilder, StoreConfig};
pub use sync::{ActivitySyncEngine, SyncReport};
pub use rusqlite;
