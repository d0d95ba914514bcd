use crate::db::types::{Entity, Page, QueryOptions};
use crate::error::RepoResult;

/// CRUD and query contract shared by every backend. Consumers hold an
/// `Arc<dyn Repository<E>>` and never know which substrate is underneath.
pub trait Repository<E: Entity>: Send + Sync {
    /// Every record, sorted then paginated per `options`.
    fn find_all(&self, options: &QueryOptions) -> RepoResult<Page<E>>;

    /// Fails with `NotFound` when no record has this id.
    fn find_by_id(&self, id: &str) -> RepoResult<E>;

    /// Records in the order of `ids`; ids with no match are skipped.
    fn find_by_ids(&self, ids: &[String]) -> RepoResult<Vec<E>>;

    /// Records whose top-level string `field` equals `value`, in insertion
    /// order.
    fn find_where(&self, field: &str, value: &str) -> RepoResult<Vec<E>>;

    fn create(&self, input: E::Create) -> RepoResult<E>;

    /// Merges `patch` onto the stored record and rewrites `updated_at`.
    fn update(&self, id: &str, patch: E::Patch) -> RepoResult<E>;

    fn delete_by_id(&self, id: &str) -> RepoResult<bool>;

    /// Best-effort; returns how many of `ids` existed and were removed.
    fn delete_by_ids(&self, ids: &[String]) -> RepoResult<usize>;

    fn count(&self) -> RepoResult<usize>;
}
