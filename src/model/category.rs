use serde::{Deserialize, Serialize};

use crate::db::filter::{retain_containing, retain_equal};
use crate::db::{Entity, Filter, RecordMeta};

/// What kind of calendar entry a category groups. The sync engine looks up
/// an organization's `Competition` and `Fixture` categories by this type.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Competition,
    Fixture,
    Training,
    Meeting,
    Social,
    #[default]
    Other,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivityCategory {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub organization_id: String,
    pub category_type: CategoryType,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct NewCategory {
    pub name: String,
    pub organization_id: String,
    pub category_type: CategoryType,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub category_type: Option<CategoryType>,
    pub color: Option<Option<String>>,
}

impl Entity for ActivityCategory {
    const COLLECTION: &'static str = "activity_categories";
    const ID_PREFIX: &'static str = "category";
    const INDEXES: &'static [&'static str] = &["organization_id"];

    type Create = NewCategory;
    type Patch = CategoryPatch;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn build(meta: RecordMeta, input: NewCategory) -> Self {
        ActivityCategory {
            meta,
            name: input.name,
            organization_id: input.organization_id,
            category_type: input.category_type,
            color: input.color,
        }
    }

    fn apply(&mut self, patch: CategoryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category_type) = patch.category_type {
            self.category_type = category_type;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CategoryFilter {
    pub organization_id: Option<String>,
    pub category_type: Option<CategoryType>,
    pub name: Option<String>,
}

impl Filter<ActivityCategory> for CategoryFilter {
    fn apply(&self, mut items: Vec<ActivityCategory>) -> Vec<ActivityCategory> {
        retain_equal(&mut items, self.organization_id.as_deref(), |c| c.organization_id.as_str());
        retain_equal(&mut items, self.category_type.as_ref(), |c| &c.category_type);
        retain_containing(&mut items, &self.name, |c| c.name.as_str());
        items
    }
}
