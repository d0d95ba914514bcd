use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A persisted record type. The repository engine owns ids and timestamps;
/// each entity supplies how its record is built from a create input and how
/// a typed patch is merged onto it.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name, used as the storage key suffix and the table name.
    const COLLECTION: &'static str;
    /// Prefix of generated ids, e.g. `activity_0190...`.
    const ID_PREFIX: &'static str;
    /// Top-level string fields the indexed backend keeps as indexed columns.
    const INDEXES: &'static [&'static str] = &[];

    type Create;
    type Patch;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;
    fn build(meta: RecordMeta, input: Self::Create) -> Self;
    fn apply(&mut self, patch: Self::Patch);

    fn id(&self) -> &str {
        &self.meta().id
    }
}

/// Base fields every record carries. Flattened into the entity's JSON so
/// `id`, `created_at` and `updated_at` sort and filter like any other field.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct RecordMeta {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl RecordMeta {
    pub fn new(id_prefix: &str) -> Self {
        let now = timestamp();
        Self {
            id: format!("{}_{}", id_prefix, Uuid::now_v7().simple()),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = timestamp();
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct QueryOptions {
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
}

impl QueryOptions {
    pub fn page(page_number: usize, page_size: usize) -> Self {
        Self {
            page_number: Some(page_number),
            page_size: Some(page_size),
            ..Default::default()
        }
    }

    pub fn sorted(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort_by = Some(field.to_string());
        self.sort_direction = direction;
        self
    }

    pub fn is_paginated(&self) -> bool {
        self.page_number.is_some() || self.page_size.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
}
