use crate::db::query::sort_and_paginate;
use crate::db::types::{Entity, Page, QueryOptions};
use crate::db::Repository;
use crate::error::RepoResult;

/// Per-entity predicate set. Every field is optional; `apply` narrows the
/// collection with one pass per present field, in declaration order.
pub trait Filter<E> {
    fn apply(&self, items: Vec<E>) -> Vec<E>;
}

/// `find_by_filter` for every repository, whatever its backend.
pub trait FilterExt<E: Entity> {
    fn find_by_filter<F: Filter<E>>(&self, filter: &F, options: &QueryOptions) -> RepoResult<Page<E>>;
}

impl<E: Entity, R: Repository<E> + ?Sized> FilterExt<E> for R {
    fn find_by_filter<F: Filter<E>>(&self, filter: &F, options: &QueryOptions) -> RepoResult<Page<E>> {
        let everything = self.find_all(&QueryOptions::default())?;
        let narrowed = filter.apply(everything.items);
        Ok(sort_and_paginate(narrowed, options))
    }
}

/// Retains items whose text contains `needle`, ignoring case.
pub fn retain_containing<E>(items: &mut Vec<E>, needle: &Option<String>, field: impl Fn(&E) -> &str) {
    if let Some(needle) = needle {
        let needle = needle.to_lowercase();
        items.retain(|item| field(item).to_lowercase().contains(&needle));
    }
}

/// Retains items whose field equals `wanted` exactly.
pub fn retain_equal<E, T: PartialEq + ?Sized>(items: &mut Vec<E>, wanted: Option<&T>, field: impl Fn(&E) -> &T) {
    if let Some(wanted) = wanted {
        items.retain(|item| field(item) == wanted);
    }
}

/// Retains items whose optional field equals `wanted`; items without the
/// field are dropped.
pub fn retain_equal_opt<E>(items: &mut Vec<E>, wanted: &Option<String>, field: impl Fn(&E) -> Option<&str>) {
    if let Some(wanted) = wanted {
        items.retain(|item| field(item) == Some(wanted.as_str()));
    }
}

/// Retains items whose collection includes `member`.
pub fn retain_including<E>(items: &mut Vec<E>, member: &Option<String>, field: impl Fn(&E) -> &[String]) {
    if let Some(member) = member {
        items.retain(|item| field(item).iter().any(|m| m == member));
    }
}
