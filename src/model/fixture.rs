use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::filter::retain_equal;
use crate::db::{Entity, Filter, RecordMeta};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FixtureStatus {
    #[default]
    Scheduled,
    Postponed,
    Cancelled,
    Completed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Fixture {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub competition_id: String,
    pub organization_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub venue_id: Option<String>,
    pub location: Option<String>,
    pub round: Option<String>,
    #[serde(default)]
    pub status: FixtureStatus,
}

#[derive(Clone, Debug, Default)]
pub struct NewFixture {
    pub competition_id: String,
    pub organization_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub venue_id: Option<String>,
    pub location: Option<String>,
    pub round: Option<String>,
    pub status: FixtureStatus,
}

#[derive(Clone, Debug, Default)]
pub struct FixturePatch {
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue_id: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub round: Option<Option<String>>,
    pub status: Option<FixtureStatus>,
}

impl Entity for Fixture {
    const COLLECTION: &'static str = "fixtures";
    const ID_PREFIX: &'static str = "fixture";
    const INDEXES: &'static [&'static str] = &["organization_id", "competition_id"];

    type Create = NewFixture;
    type Patch = FixturePatch;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn build(meta: RecordMeta, input: NewFixture) -> Self {
        Fixture {
            meta,
            competition_id: input.competition_id,
            organization_id: input.organization_id,
            home_team_id: input.home_team_id,
            away_team_id: input.away_team_id,
            scheduled_at: input.scheduled_at,
            venue_id: input.venue_id,
            location: input.location,
            round: input.round,
            status: input.status,
        }
    }

    fn apply(&mut self, patch: FixturePatch) {
        if let Some(home_team_id) = patch.home_team_id {
            self.home_team_id = home_team_id;
        }
        if let Some(away_team_id) = patch.away_team_id {
            self.away_team_id = away_team_id;
        }
        if let Some(scheduled_at) = patch.scheduled_at {
            self.scheduled_at = scheduled_at;
        }
        if let Some(venue_id) = patch.venue_id {
            self.venue_id = venue_id;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(round) = patch.round {
            self.round = round;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FixtureFilter {
    pub organization_id: Option<String>,
    pub competition_id: Option<String>,
    /// Matches either side of the fixture.
    pub team_id: Option<String>,
    pub status: Option<FixtureStatus>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
}

impl Filter<Fixture> for FixtureFilter {
    fn apply(&self, mut items: Vec<Fixture>) -> Vec<Fixture> {
        retain_equal(&mut items, self.organization_id.as_deref(), |f| f.organization_id.as_str());
        retain_equal(&mut items, self.competition_id.as_deref(), |f| f.competition_id.as_str());
        if let Some(team_id) = &self.team_id {
            items.retain(|f| &f.home_team_id == team_id || &f.away_team_id == team_id);
        }
        retain_equal(&mut items, self.status.as_ref(), |f| &f.status);
        if let Some(from) = self.scheduled_from {
            items.retain(|f| f.scheduled_at >= from);
        }
        if let Some(to) = self.scheduled_to {
            items.retain(|f| f.scheduled_at <= to);
        }
        items
    }
}
