use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::filter::{retain_containing, retain_equal, retain_equal_opt, retain_including};
use crate::db::{Entity, Filter, RecordMeta, Repository};
use crate::error::RepoResult;
use crate::model::category::CategoryType;

/// Where an activity came from. `Competition` and `Fixture` activities are
/// derived records owned by the sync engine.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Manual,
    Competition,
    Fixture,
    GoogleCalendar,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Manual => "manual",
            SourceType::Competition => "competition",
            SourceType::Fixture => "fixture",
            SourceType::GoogleCalendar => "google_calendar",
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, SourceType::Competition | SourceType::Fixture)
    }

    pub fn is_user_deletable(&self) -> bool {
        matches!(self, SourceType::Manual)
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Scheduled,
    Postponed,
    Cancelled,
    Completed,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub interval: u32,
    pub until: Option<DateTime<Utc>>,
    pub count: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderMethod {
    Notification,
    Email,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Reminder {
    pub minutes_before: u32,
    pub method: ReminderMethod,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Activity {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub description: Option<String>,
    pub organization_id: String,
    pub category_id: String,
    pub category_type: CategoryType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub location: Option<String>,
    pub venue_id: Option<String>,
    #[serde(default)]
    pub team_ids: Vec<String>,
    pub competition_id: Option<String>,
    pub fixture_id: Option<String>,
    pub source_type: SourceType,
    pub source_id: Option<String>,
    #[serde(default)]
    pub status: ActivityStatus,
    pub recurrence: Option<RecurrencePattern>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub external_calendar_id: Option<String>,
    pub external_event_id: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default)]
pub struct NewActivity {
    pub title: String,
    pub description: Option<String>,
    pub organization_id: String,
    pub category_id: String,
    pub category_type: CategoryType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub location: Option<String>,
    pub venue_id: Option<String>,
    pub team_ids: Vec<String>,
    pub competition_id: Option<String>,
    pub fixture_id: Option<String>,
    pub source_type: SourceType,
    pub source_id: Option<String>,
    pub status: ActivityStatus,
    pub recurrence: Option<RecurrencePattern>,
    pub reminders: Vec<Reminder>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub external_calendar_id: Option<String>,
    pub external_event_id: Option<String>,
}

/// Typed partial update. Provenance (`source_type`, `source_id`) and
/// `organization_id` are fixed at creation and have no patch field.
/// `Some(None)` clears a nullable field.
#[derive(Clone, Debug, Default)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<String>,
    pub category_type: Option<CategoryType>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub is_all_day: Option<bool>,
    pub location: Option<Option<String>>,
    pub venue_id: Option<Option<String>>,
    pub team_ids: Option<Vec<String>>,
    pub competition_id: Option<Option<String>>,
    pub fixture_id: Option<Option<String>>,
    pub status: Option<ActivityStatus>,
    pub recurrence: Option<Option<RecurrencePattern>>,
    pub reminders: Option<Vec<Reminder>>,
    pub color: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub external_calendar_id: Option<Option<String>>,
    pub external_event_id: Option<Option<String>>,
    pub last_synced_at: Option<Option<DateTime<Utc>>>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl Entity for Activity {
    const COLLECTION: &'static str = "activities";
    const ID_PREFIX: &'static str = "activity";
    const INDEXES: &'static [&'static str] = &["organization_id", "source_type", "source_id"];

    type Create = NewActivity;
    type Patch = ActivityPatch;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn build(meta: RecordMeta, input: NewActivity) -> Self {
        Activity {
            meta,
            title: input.title,
            description: input.description,
            organization_id: input.organization_id,
            category_id: input.category_id,
            category_type: input.category_type,
            start: input.start,
            end: input.end,
            is_all_day: input.is_all_day,
            location: input.location,
            venue_id: input.venue_id,
            team_ids: input.team_ids,
            competition_id: input.competition_id,
            fixture_id: input.fixture_id,
            source_type: input.source_type,
            source_id: input.source_id,
            status: input.status,
            recurrence: input.recurrence,
            reminders: input.reminders,
            color: input.color,
            notes: input.notes,
            external_calendar_id: input.external_calendar_id,
            external_event_id: input.external_event_id,
            last_synced_at: None,
        }
    }

    fn apply(&mut self, patch: ActivityPatch) {
        set(&mut self.title, patch.title);
        set(&mut self.description, patch.description);
        set(&mut self.category_id, patch.category_id);
        set(&mut self.category_type, patch.category_type);
        set(&mut self.start, patch.start);
        set(&mut self.end, patch.end);
        set(&mut self.is_all_day, patch.is_all_day);
        set(&mut self.location, patch.location);
        set(&mut self.venue_id, patch.venue_id);
        set(&mut self.team_ids, patch.team_ids);
        set(&mut self.competition_id, patch.competition_id);
        set(&mut self.fixture_id, patch.fixture_id);
        set(&mut self.status, patch.status);
        set(&mut self.recurrence, patch.recurrence);
        set(&mut self.reminders, patch.reminders);
        set(&mut self.color, patch.color);
        set(&mut self.notes, patch.notes);
        set(&mut self.external_calendar_id, patch.external_calendar_id);
        set(&mut self.external_event_id, patch.external_event_id);
        set(&mut self.last_synced_at, patch.last_synced_at);
    }
}

/// Looks up the activity mirroring `(source_type, source_id)` through the
/// indexed `source_id` lookup.
pub fn find_by_source(
    activities: &dyn Repository<Activity>,
    source_type: SourceType,
    source_id: &str,
) -> RepoResult<Option<Activity>> {
    Ok(activities
        .find_where("source_id", source_id)?
        .into_iter()
        .find(|a| a.source_type == source_type))
}

#[derive(Clone, Debug, Default)]
pub struct ActivityFilter {
    pub organization_id: Option<String>,
    pub title: Option<String>,
    pub category_id: Option<String>,
    pub source_type: Option<SourceType>,
    /// Matches activities whose `team_ids` include this team.
    pub team_id: Option<String>,
    pub competition_id: Option<String>,
    pub fixture_id: Option<String>,
    pub status: Option<ActivityStatus>,
    /// With `to`, keeps activities overlapping the window.
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Filter<Activity> for ActivityFilter {
    fn apply(&self, mut items: Vec<Activity>) -> Vec<Activity> {
        retain_equal(&mut items, self.organization_id.as_deref(), |a| a.organization_id.as_str());
        retain_containing(&mut items, &self.title, |a| a.title.as_str());
        retain_equal(&mut items, self.category_id.as_deref(), |a| a.category_id.as_str());
        retain_equal(&mut items, self.source_type.as_ref(), |a| &a.source_type);
        retain_including(&mut items, &self.team_id, |a| a.team_ids.as_slice());
        retain_equal_opt(&mut items, &self.competition_id, |a| a.competition_id.as_deref());
        retain_equal_opt(&mut items, &self.fixture_id, |a| a.fixture_id.as_deref());
        retain_equal(&mut items, self.status.as_ref(), |a| &a.status);
        if let Some(from) = self.from {
            items.retain(|a| a.end >= from);
        }
        if let Some(to) = self.to {
            items.retain(|a| a.start <= to);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn activity(title: &str) -> Activity {
        Activity::build(
            RecordMeta::new(Activity::ID_PREFIX),
            NewActivity {
                title: title.to_string(),
                organization_id: "org_1".to_string(),
                start: Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_serializes_source_type_in_snake_case() -> anyhow::Result<()> {
        let mut a = activity("Cup");
        a.source_type = SourceType::GoogleCalendar;
        let value = serde_json::to_value(&a)?;
        assert_eq!(value["source_type"], "google_calendar");
        assert!(value["id"].as_str().unwrap_or_default().starts_with("activity_"));
        assert_eq!(value["created_at"], value["updated_at"]);
        Ok(())
    }

    #[test]
    fn test_patch_touches_only_present_fields() {
        let mut a = activity("Training");
        a.notes = Some("bring cones".to_string());
        let before = a.clone();

        a.apply(ActivityPatch {
            title: Some("Evening training".to_string()),
            location: Some(Some("Pitch 2".to_string())),
            ..Default::default()
        });

        assert_eq!(a.title, "Evening training");
        assert_eq!(a.location.as_deref(), Some("Pitch 2"));
        assert_eq!(a.notes, before.notes);
        assert_eq!(a.start, before.start);
        assert_eq!(a.source_type, before.source_type);
    }

    #[test]
    fn test_patch_can_clear_nullable_fields() {
        let mut a = activity("Training");
        a.notes = Some("bring cones".to_string());
        a.apply(ActivityPatch {
            notes: Some(None),
            ..Default::default()
        });
        assert_eq!(a.notes, None);
    }

    #[test]
    fn test_window_filter_keeps_overlaps() {
        let early = activity("Early");
        let mut late = activity("Late");
        late.start = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        late.end = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();

        let filter = ActivityFilter {
            from: Some(Utc.with_ymd_and_hms(2026, 4, 1, 11, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2026, 4, 30, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let kept = filter.apply(vec![early, late]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Early");
    }

    #[test]
    fn test_team_filter_is_membership() {
        let mut a = activity("Derby");
        a.team_ids = vec!["team_a".to_string(), "team_b".to_string()];
        let b = activity("Other");
        let filter = ActivityFilter {
            team_id: Some("team_b".to_string()),
            ..Default::default()
        };
        let kept = filter.apply(vec![a, b]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Derby");
    }
}
