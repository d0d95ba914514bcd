use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::filter::{retain_containing, retain_equal};
use crate::db::{Entity, Filter, RecordMeta};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Competition {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub organization_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub team_ids: Vec<String>,
    #[serde(default)]
    pub status: CompetitionStatus,
}

#[derive(Clone, Debug, Default)]
pub struct NewCompetition {
    pub name: String,
    pub organization_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub team_ids: Vec<String>,
    pub status: CompetitionStatus,
}

#[derive(Clone, Debug, Default)]
pub struct CompetitionPatch {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub location: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub team_ids: Option<Vec<String>>,
    pub status: Option<CompetitionStatus>,
}

impl Entity for Competition {
    const COLLECTION: &'static str = "competitions";
    const ID_PREFIX: &'static str = "competition";
    const INDEXES: &'static [&'static str] = &["organization_id"];

    type Create = NewCompetition;
    type Patch = CompetitionPatch;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn build(meta: RecordMeta, input: NewCompetition) -> Self {
        Competition {
            meta,
            name: input.name,
            organization_id: input.organization_id,
            start_date: input.start_date,
            end_date: input.end_date,
            location: input.location,
            description: input.description,
            team_ids: input.team_ids,
            status: input.status,
        }
    }

    fn apply(&mut self, patch: CompetitionPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(team_ids) = patch.team_ids {
            self.team_ids = team_ids;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

impl Competition {
    /// Last day of the competition; single-day events end on their start.
    pub fn last_day(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }
}

#[derive(Clone, Debug, Default)]
pub struct CompetitionFilter {
    pub organization_id: Option<String>,
    pub name: Option<String>,
    pub status: Option<CompetitionStatus>,
}

impl Filter<Competition> for CompetitionFilter {
    fn apply(&self, mut items: Vec<Competition>) -> Vec<Competition> {
        retain_equal(&mut items, self.organization_id.as_deref(), |c| c.organization_id.as_str());
        retain_containing(&mut items, &self.name, |c| c.name.as_str());
        retain_equal(&mut items, self.status.as_ref(), |c| &c.status);
        items
    }
}
