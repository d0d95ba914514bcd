use serde::{Deserialize, Serialize};

use crate::db::filter::{retain_containing, retain_equal};
use crate::db::{Entity, Filter, RecordMeta};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Team {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub organization_id: String,
    pub short_name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct NewTeam {
    pub name: String,
    pub organization_id: String,
    pub short_name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub short_name: Option<Option<String>>,
}

impl Entity for Team {
    const COLLECTION: &'static str = "teams";
    const ID_PREFIX: &'static str = "team";
    const INDEXES: &'static [&'static str] = &["organization_id"];

    type Create = NewTeam;
    type Patch = TeamPatch;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn build(meta: RecordMeta, input: NewTeam) -> Self {
        Team {
            meta,
            name: input.name,
            organization_id: input.organization_id,
            short_name: input.short_name,
        }
    }

    fn apply(&mut self, patch: TeamPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(short_name) = patch.short_name {
            self.short_name = short_name;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TeamFilter {
    pub organization_id: Option<String>,
    pub name: Option<String>,
}

impl Filter<Team> for TeamFilter {
    fn apply(&self, mut items: Vec<Team>) -> Vec<Team> {
        retain_equal(&mut items, self.organization_id.as_deref(), |t| t.organization_id.as_str());
        retain_containing(&mut items, &self.name, |t| t.name.as_str());
        items
    }
}
