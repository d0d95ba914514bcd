// Re-export all public items from the sync modules
pub use sync_engine::*;
pub use types::SyncReport;

pub mod sync_engine;
pub mod types;
