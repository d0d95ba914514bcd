use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::db::{Entity, Repository};
use crate::error::{RepoError, RepoResult};
use crate::model::activity::find_by_source;
use crate::model::{
    Activity, ActivityCategory, ActivityPatch, ActivityStatus, CategoryType, Competition,
    CompetitionStatus, Fixture, FixtureStatus, NewActivity, SourceType, Team,
};
use crate::sync::types::{SyncOutcome, SyncReport};

/// Length given to a fixture activity when it is first created.
pub const DEFAULT_FIXTURE_DURATION_HOURS: i64 = 2;

/// Placeholder used in fixture titles when a team cannot be resolved.
pub const UNKNOWN_TEAM: &str = "TBD";

/// Mirrors competitions and fixtures into the activity calendar.
///
/// Every derived activity is keyed by `(source_type, source_id)`. A run
/// looks each source up before creating, rewrites only the fields derived
/// from the source, and deletes activities whose source is gone, so running
/// it again with unchanged inputs is a no-op.
pub struct ActivitySyncEngine {
    activities: Arc<dyn Repository<Activity>>,
    categories: Arc<dyn Repository<ActivityCategory>>,
    competitions: Arc<dyn Repository<Competition>>,
    fixtures: Arc<dyn Repository<Fixture>>,
    teams: Arc<dyn Repository<Team>>,
}

impl ActivitySyncEngine {
    pub fn new(
        activities: Arc<dyn Repository<Activity>>,
        categories: Arc<dyn Repository<ActivityCategory>>,
        competitions: Arc<dyn Repository<Competition>>,
        fixtures: Arc<dyn Repository<Fixture>>,
        teams: Arc<dyn Repository<Team>>,
    ) -> Self {
        Self {
            activities,
            categories,
            competitions,
            fixtures,
            teams,
        }
    }

    pub fn find_activity_by_source(&self, source_type: SourceType, source_id: &str) -> RepoResult<Option<Activity>> {
        find_by_source(self.activities.as_ref(), source_type, source_id)
    }

    pub fn sync_competitions_to_activities(&self, organization_id: &str) -> RepoResult<SyncReport> {
        let category = self.resolve_category(organization_id, CategoryType::Competition)?;
        let competitions = self.competitions.find_where("organization_id", organization_id)?;
        log::debug!("SYNC COMPETITIONS: org='{}', {} sources", organization_id, competitions.len());

        let mut report = SyncReport::default();
        for competition in &competitions {
            match self.sync_competition(competition, &category) {
                Ok(outcome) => report.record(outcome),
                Err(e) => log::warn!("Failed to sync competition '{}': {}", competition.id(), e),
            }
        }

        let live: HashSet<&str> = competitions.iter().map(|c| c.id()).collect();
        report.removed = self.prune(organization_id, SourceType::Competition, None, &live);

        log::info!(
            "SYNC COMPETITIONS RESULT: org='{}', created={}, updated={}, unchanged={}, removed={}",
            organization_id,
            report.created,
            report.updated,
            report.unchanged,
            report.removed
        );
        Ok(report)
    }

    pub fn sync_fixtures_to_activities(
        &self,
        organization_id: &str,
        competition_id: Option<&str>,
    ) -> RepoResult<SyncReport> {
        let category = self.resolve_category(organization_id, CategoryType::Fixture)?;
        let mut fixtures = self.fixtures.find_where("organization_id", organization_id)?;
        if let Some(competition_id) = competition_id {
            fixtures.retain(|f| f.competition_id == competition_id);
        }
        log::debug!(
            "SYNC FIXTURES: org='{}', competition={:?}, {} sources",
            organization_id,
            competition_id,
            fixtures.len()
        );

        let mut team_names = HashMap::new();
        let mut report = SyncReport::default();
        for fixture in &fixtures {
            match self.sync_fixture(fixture, &category, &mut team_names) {
                Ok(outcome) => report.record(outcome),
                Err(e) => log::warn!("Failed to sync fixture '{}': {}", fixture.id(), e),
            }
        }

        let live: HashSet<&str> = fixtures.iter().map(|f| f.id()).collect();
        report.removed = self.prune(organization_id, SourceType::Fixture, competition_id, &live);

        log::info!(
            "SYNC FIXTURES RESULT: org='{}', created={}, updated={}, unchanged={}, removed={}",
            organization_id,
            report.created,
            report.updated,
            report.unchanged,
            report.removed
        );
        Ok(report)
    }

    fn resolve_category(&self, organization_id: &str, category_type: CategoryType) -> RepoResult<ActivityCategory> {
        self.categories
            .find_where("organization_id", organization_id)?
            .into_iter()
            .find(|c| c.category_type == category_type)
            .ok_or_else(|| {
                RepoError::PreconditionFailed(format!(
                    "organization '{}' has no {:?} category",
                    organization_id, category_type
                ))
            })
    }

    fn sync_competition(&self, competition: &Competition, category: &ActivityCategory) -> RepoResult<SyncOutcome> {
        let start = day_start(competition.start_date);
        let end = day_end(competition.last_day());

        match self.find_activity_by_source(SourceType::Competition, competition.id())? {
            Some(existing) => {
                if existing.title == competition.name
                    && existing.start == start
                    && existing.end == end
                    && existing.location == competition.location
                {
                    return Ok(SyncOutcome::Unchanged);
                }
                self.activities.update(
                    existing.id(),
                    ActivityPatch {
                        title: Some(competition.name.clone()),
                        start: Some(start),
                        end: Some(end),
                        location: Some(competition.location.clone()),
                        ..Default::default()
                    },
                )?;
                Ok(SyncOutcome::Updated)
            }
            None => {
                self.activities.create(NewActivity {
                    title: competition.name.clone(),
                    description: competition.description.clone(),
                    organization_id: competition.organization_id.clone(),
                    category_id: category.id().to_string(),
                    category_type: CategoryType::Competition,
                    start,
                    end,
                    is_all_day: true,
                    location: competition.location.clone(),
                    team_ids: competition.team_ids.clone(),
                    competition_id: Some(competition.id().to_string()),
                    source_type: SourceType::Competition,
                    source_id: Some(competition.id().to_string()),
                    status: competition.status.into(),
                    ..Default::default()
                })?;
                Ok(SyncOutcome::Created)
            }
        }
    }

    fn sync_fixture(
        &self,
        fixture: &Fixture,
        category: &ActivityCategory,
        team_names: &mut HashMap<String, String>,
    ) -> RepoResult<SyncOutcome> {
        let title = format!(
            "{} vs {}",
            self.team_name(&fixture.home_team_id, team_names),
            self.team_name(&fixture.away_team_id, team_names)
        );
        let team_ids = vec![fixture.home_team_id.clone(), fixture.away_team_id.clone()];
        let status = ActivityStatus::from(fixture.status);

        match self.find_activity_by_source(SourceType::Fixture, fixture.id())? {
            Some(existing) => {
                let start = fixture.scheduled_at;
                let end = start + (existing.end - existing.start);
                if existing.title == title
                    && existing.start == start
                    && existing.end == end
                    && existing.location == fixture.location
                    && existing.venue_id == fixture.venue_id
                    && existing.team_ids == team_ids
                    && existing.status == status
                {
                    return Ok(SyncOutcome::Unchanged);
                }
                self.activities.update(
                    existing.id(),
                    ActivityPatch {
                        title: Some(title),
                        start: Some(start),
                        end: Some(end),
                        location: Some(fixture.location.clone()),
                        venue_id: Some(fixture.venue_id.clone()),
                        team_ids: Some(team_ids),
                        status: Some(status),
                        ..Default::default()
                    },
                )?;
                Ok(SyncOutcome::Updated)
            }
            None => {
                self.activities.create(NewActivity {
                    title,
                    organization_id: fixture.organization_id.clone(),
                    category_id: category.id().to_string(),
                    category_type: CategoryType::Fixture,
                    start: fixture.scheduled_at,
                    end: fixture.scheduled_at + Duration::hours(DEFAULT_FIXTURE_DURATION_HOURS),
                    location: fixture.location.clone(),
                    venue_id: fixture.venue_id.clone(),
                    team_ids,
                    competition_id: Some(fixture.competition_id.clone()),
                    fixture_id: Some(fixture.id().to_string()),
                    source_type: SourceType::Fixture,
                    source_id: Some(fixture.id().to_string()),
                    status,
                    ..Default::default()
                })?;
                Ok(SyncOutcome::Created)
            }
        }
    }

    fn team_name(&self, team_id: &str, cache: &mut HashMap<String, String>) -> String {
        if let Some(name) = cache.get(team_id) {
            return name.clone();
        }
        let name = match self.teams.find_by_id(team_id) {
            Ok(team) => team.name,
            Err(e) => {
                log::debug!("SYNC TEAM LOOKUP: '{}' unresolved: {}", team_id, e);
                UNKNOWN_TEAM.to_string()
            }
        };
        cache.insert(team_id.to_string(), name.clone());
        name
    }

    /// Orphan removal after the upsert pass. A failure here is logged and
    /// counted as nothing removed; the writes already made still stand.
    fn prune(
        &self,
        organization_id: &str,
        source_type: SourceType,
        competition_id: Option<&str>,
        live: &HashSet<&str>,
    ) -> usize {
        match self.remove_orphans(organization_id, source_type, competition_id, live) {
            Ok(removed) => removed,
            Err(e) => {
                log::warn!("Failed to remove orphaned {} activities for org '{}': {}", source_type, organization_id, e);
                0
            }
        }
    }

    /// Deletes derived activities of `source_type` in scope whose source id
    /// is not in `live`.
    fn remove_orphans(
        &self,
        organization_id: &str,
        source_type: SourceType,
        competition_id: Option<&str>,
        live: &HashSet<&str>,
    ) -> RepoResult<usize> {
        let orphans: Vec<String> = self
            .activities
            .find_where("organization_id", organization_id)?
            .into_iter()
            .filter(|a| a.source_type == source_type)
            .filter(|a| competition_id.is_none() || a.competition_id.as_deref() == competition_id)
            .filter(|a| a.source_id.as_deref().is_some_and(|id| !live.contains(id)))
            .map(|a| a.meta.id)
            .collect();
        if orphans.is_empty() {
            return Ok(0);
        }
        log::debug!("SYNC REMOVE: {} orphaned {} activities", orphans.len(), source_type);
        self.activities.delete_by_ids(&orphans)
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59 UTC on `date`.
fn day_end(date: NaiveDate) -> DateTime<Utc> {
    day_start(date) + Duration::days(1) - Duration::seconds(1)
}

impl From<FixtureStatus> for ActivityStatus {
    fn from(status: FixtureStatus) -> Self {
        match status {
            FixtureStatus::Scheduled => ActivityStatus::Scheduled,
            FixtureStatus::Postponed => ActivityStatus::Postponed,
            FixtureStatus::Cancelled => ActivityStatus::Cancelled,
            FixtureStatus::Completed => ActivityStatus::Completed,
        }
    }
}

impl From<CompetitionStatus> for ActivityStatus {
    fn from(status: CompetitionStatus) -> Self {
        match status {
            CompetitionStatus::Planned | CompetitionStatus::InProgress => ActivityStatus::Scheduled,
            CompetitionStatus::Completed => ActivityStatus::Completed,
            CompetitionStatus::Cancelled => ActivityStatus::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::TimeZone;

    use super::*;
    use crate::db::CachedRepository;
    use crate::model::{CompetitionPatch, FixturePatch, NewCategory, NewCompetition, NewFixture, NewTeam};
    use crate::storage::InMemoryStorage;

    struct Harness {
        engine: ActivitySyncEngine,
        activities: Arc<dyn Repository<Activity>>,
        categories: Arc<dyn Repository<ActivityCategory>>,
        competitions: Arc<dyn Repository<Competition>>,
        fixtures: Arc<dyn Repository<Fixture>>,
        teams: Arc<dyn Repository<Team>>,
    }

    fn harness() -> Harness {
        let storage = Arc::new(InMemoryStorage::new());
        let activities: Arc<dyn Repository<Activity>> = Arc::new(CachedRepository::new(storage.clone(), "t."));
        let categories: Arc<dyn Repository<ActivityCategory>> = Arc::new(CachedRepository::new(storage.clone(), "t."));
        let competitions: Arc<dyn Repository<Competition>> = Arc::new(CachedRepository::new(storage.clone(), "t."));
        let fixtures: Arc<dyn Repository<Fixture>> = Arc::new(CachedRepository::new(storage.clone(), "t."));
        let teams: Arc<dyn Repository<Team>> = Arc::new(CachedRepository::new(storage, "t."));
        Harness {
            engine: ActivitySyncEngine::new(
                activities.clone(),
                categories.clone(),
                competitions.clone(),
                fixtures.clone(),
                teams.clone(),
            ),
            activities,
            categories,
            competitions,
            fixtures,
            teams,
        }
    }

    /// Activity repository that refuses to create one source's activity
    /// and can refuse bulk deletes.
    struct FlakyActivities {
        inner: Arc<dyn Repository<Activity>>,
        reject_source: Option<String>,
        reject_deletes: bool,
    }

    impl Repository<Activity> for FlakyActivities {
        fn find_all(&self, options: &crate::db::QueryOptions) -> RepoResult<crate::db::Page<Activity>> {
            self.inner.find_all(options)
        }

        fn find_by_id(&self, id: &str) -> RepoResult<Activity> {
            self.inner.find_by_id(id)
        }

        fn find_by_ids(&self, ids: &[String]) -> RepoResult<Vec<Activity>> {
            self.inner.find_by_ids(ids)
        }

        fn find_where(&self, field: &str, value: &str) -> RepoResult<Vec<Activity>> {
            self.inner.find_where(field, value)
        }

        fn create(&self, input: NewActivity) -> RepoResult<Activity> {
            if input.source_id.is_some() && input.source_id == self.reject_source {
                return Err(RepoError::storage("create", anyhow::anyhow!("disk full")));
            }
            self.inner.create(input)
        }

        fn update(&self, id: &str, patch: ActivityPatch) -> RepoResult<Activity> {
            self.inner.update(id, patch)
        }

        fn delete_by_id(&self, id: &str) -> RepoResult<bool> {
            self.inner.delete_by_id(id)
        }

        fn delete_by_ids(&self, ids: &[String]) -> RepoResult<usize> {
            if self.reject_deletes {
                return Err(RepoError::storage("delete_by_ids", anyhow::anyhow!("read-only volume")));
            }
            self.inner.delete_by_ids(ids)
        }

        fn count(&self) -> RepoResult<usize> {
            self.inner.count()
        }
    }

    impl Harness {
        fn category(&self, category_type: CategoryType) -> Result<ActivityCategory> {
            Ok(self.categories.create(NewCategory {
                name: format!("{:?}", category_type),
                organization_id: "org_1".to_string(),
                category_type,
                color: None,
            })?)
        }

        fn team(&self, name: &str) -> Result<Team> {
            Ok(self.teams.create(NewTeam {
                name: name.to_string(),
                organization_id: "org_1".to_string(),
                short_name: None,
            })?)
        }

        fn cup(&self) -> Result<Competition> {
            Ok(self.competitions.create(NewCompetition {
                name: "Cup".to_string(),
                organization_id: "org_1".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                end_date: Some(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()),
                location: Some("Central Park".to_string()),
                ..Default::default()
            })?)
        }

        fn engine_over(&self, activities: FlakyActivities) -> ActivitySyncEngine {
            ActivitySyncEngine::new(
                Arc::new(activities),
                self.categories.clone(),
                self.competitions.clone(),
                self.fixtures.clone(),
                self.teams.clone(),
            )
        }

        fn fixture(&self, competition: &Competition, home: &str, away: &str) -> Result<Fixture> {
            Ok(self.fixtures.create(NewFixture {
                competition_id: competition.id().to_string(),
                organization_id: "org_1".to_string(),
                home_team_id: home.to_string(),
                away_team_id: away.to_string(),
                scheduled_at: Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap(),
                ..Default::default()
            })?)
        }
    }

    #[test]
    fn test_competition_becomes_all_day_activity() -> Result<()> {
        let h = harness();
        let category = h.category(CategoryType::Competition)?;
        let cup = h.cup()?;

        let report = h.engine.sync_competitions_to_activities("org_1")?;
        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 0);

        let activity = h
            .engine
            .find_activity_by_source(SourceType::Competition, cup.id())?
            .expect("activity created");
        assert_eq!(activity.title, "Cup");
        assert!(activity.is_all_day);
        assert_eq!(activity.category_id, category.id());
        assert_eq!(activity.competition_id.as_deref(), Some(cup.id()));
        assert_eq!(activity.start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(activity.end, Utc.with_ymd_and_hms(2026, 3, 3, 23, 59, 59).unwrap());
        Ok(())
    }

    #[test]
    fn test_repeated_competition_sync_is_a_noop() -> Result<()> {
        let h = harness();
        h.category(CategoryType::Competition)?;
        h.cup()?;

        h.engine.sync_competitions_to_activities("org_1")?;
        let before = h.activities.find_all(&Default::default())?.items;
        let report = h.engine.sync_competitions_to_activities("org_1")?;

        assert_eq!(report, SyncReport { unchanged: 1, ..Default::default() });
        assert!(!report.has_changes());
        assert_eq!(h.activities.find_all(&Default::default())?.items, before);
        Ok(())
    }

    #[test]
    fn test_competition_update_keeps_user_fields() -> Result<()> {
        let h = harness();
        h.category(CategoryType::Competition)?;
        let cup = h.cup()?;
        h.engine.sync_competitions_to_activities("org_1")?;

        let activity = h
            .engine
            .find_activity_by_source(SourceType::Competition, cup.id())?
            .expect("activity created");
        h.activities.update(
            activity.id(),
            ActivityPatch {
                notes: Some(Some("book the bus".to_string())),
                ..Default::default()
            },
        )?;
        h.competitions.update(
            cup.id(),
            CompetitionPatch {
                name: Some("Spring Cup".to_string()),
                ..Default::default()
            },
        )?;

        let report = h.engine.sync_competitions_to_activities("org_1")?;
        assert_eq!(report.updated, 1);
        let synced = h.activities.find_by_id(activity.id())?;
        assert_eq!(synced.title, "Spring Cup");
        assert_eq!(synced.notes.as_deref(), Some("book the bus"));
        Ok(())
    }

    #[test]
    fn test_missing_category_fails_the_whole_sync() -> Result<()> {
        let h = harness();
        h.cup()?;
        let err = h.engine.sync_competitions_to_activities("org_1").unwrap_err();
        assert!(matches!(err, RepoError::PreconditionFailed(_)));
        assert_eq!(h.activities.count()?, 0);

        let err = h.engine.sync_fixtures_to_activities("org_1", None).unwrap_err();
        assert!(matches!(err, RepoError::PreconditionFailed(_)));
        Ok(())
    }

    #[test]
    fn test_fixture_titles_use_team_names() -> Result<()> {
        let h = harness();
        h.category(CategoryType::Fixture)?;
        let cup = h.cup()?;
        let harriers = h.team("Harriers")?;
        let fixture = h.fixture(&cup, harriers.id(), "team_gone")?;

        let report = h.engine.sync_fixtures_to_activities("org_1", None)?;
        assert_eq!(report.created, 1);

        let activity = h
            .engine
            .find_activity_by_source(SourceType::Fixture, fixture.id())?
            .expect("activity created");
        assert_eq!(activity.title, "Harriers vs TBD");
        assert_eq!(activity.end - activity.start, Duration::hours(2));
        assert_eq!(activity.fixture_id.as_deref(), Some(fixture.id()));
        assert_eq!(activity.team_ids, vec![harriers.id().to_string(), "team_gone".to_string()]);
        assert!(!activity.is_all_day);
        Ok(())
    }

    #[test]
    fn test_rescheduled_fixture_keeps_its_duration() -> Result<()> {
        let h = harness();
        h.category(CategoryType::Fixture)?;
        let cup = h.cup()?;
        let fixture = h.fixture(&cup, "team_a", "team_b")?;
        h.engine.sync_fixtures_to_activities("org_1", None)?;

        let activity = h
            .engine
            .find_activity_by_source(SourceType::Fixture, fixture.id())?
            .expect("activity created");
        h.activities.update(
            activity.id(),
            ActivityPatch {
                end: Some(activity.start + Duration::minutes(90)),
                ..Default::default()
            },
        )?;

        let moved = Utc.with_ymd_and_hms(2026, 3, 8, 10, 0, 0).unwrap();
        h.fixtures.update(
            fixture.id(),
            FixturePatch {
                scheduled_at: Some(moved),
                status: Some(FixtureStatus::Postponed),
                ..Default::default()
            },
        )?;

        let report = h.engine.sync_fixtures_to_activities("org_1", None)?;
        assert_eq!(report.updated, 1);
        let synced = h.activities.find_by_id(activity.id())?;
        assert_eq!(synced.start, moved);
        assert_eq!(synced.end, moved + Duration::minutes(90));
        assert_eq!(synced.status, ActivityStatus::Postponed);
        Ok(())
    }

    #[test]
    fn test_scoped_fixture_sync_leaves_other_competitions_alone() -> Result<()> {
        let h = harness();
        h.category(CategoryType::Fixture)?;
        let cup = h.cup()?;
        let league = h.competitions.create(NewCompetition {
            name: "League".to_string(),
            organization_id: "org_1".to_string(),
            ..Default::default()
        })?;
        h.fixture(&cup, "team_a", "team_b")?;
        let league_fixture = h.fixture(&league, "team_c", "team_d")?;
        h.engine.sync_fixtures_to_activities("org_1", None)?;

        h.fixtures.delete_by_id(league_fixture.id())?;
        let report = h.engine.sync_fixtures_to_activities("org_1", Some(cup.id()))?;
        assert_eq!(report, SyncReport { unchanged: 1, ..Default::default() });
        assert!(h.engine.find_activity_by_source(SourceType::Fixture, league_fixture.id())?.is_some());

        let report = h.engine.sync_fixtures_to_activities("org_1", Some(league.id()))?;
        assert_eq!(report.removed, 1);
        assert!(h.engine.find_activity_by_source(SourceType::Fixture, league_fixture.id())?.is_none());
        Ok(())
    }

    #[test]
    fn test_manual_activities_survive_orphan_removal() -> Result<()> {
        let h = harness();
        h.category(CategoryType::Competition)?;
        let cup = h.cup()?;
        h.engine.sync_competitions_to_activities("org_1")?;
        let manual = h.activities.create(NewActivity {
            title: "Kit wash".to_string(),
            organization_id: "org_1".to_string(),
            ..Default::default()
        })?;

        h.competitions.delete_by_id(cup.id())?;
        let report = h.engine.sync_competitions_to_activities("org_1")?;
        assert_eq!(report.removed, 1);
        assert_eq!(h.activities.count()?, 1);
        assert!(h.activities.find_by_id(manual.id()).is_ok());
        Ok(())
    }

    #[test]
    fn test_failed_record_is_skipped_and_batch_continues() -> Result<()> {
        let h = harness();
        h.category(CategoryType::Fixture)?;
        let cup = h.cup()?;
        let broken = h.fixture(&cup, "team_a", "team_b")?;
        let healthy = h.fixture(&cup, "team_c", "team_d")?;
        let engine = h.engine_over(FlakyActivities {
            inner: h.activities.clone(),
            reject_source: Some(broken.id().to_string()),
            reject_deletes: false,
        });

        let report = engine.sync_fixtures_to_activities("org_1", None)?;
        assert_eq!(report, SyncReport { created: 1, ..Default::default() });
        assert!(engine.find_activity_by_source(SourceType::Fixture, healthy.id())?.is_some());
        assert!(engine.find_activity_by_source(SourceType::Fixture, broken.id())?.is_none());
        assert_eq!(h.activities.count()?, 1);

        // the skipped record is picked up once writes succeed again
        let report = h.engine.sync_fixtures_to_activities("org_1", None)?;
        assert_eq!(report, SyncReport { created: 1, unchanged: 1, ..Default::default() });
        Ok(())
    }

    #[test]
    fn test_failed_orphan_removal_keeps_the_partial_report() -> Result<()> {
        let h = harness();
        h.category(CategoryType::Competition)?;
        let cup = h.cup()?;
        h.engine.sync_competitions_to_activities("org_1")?;
        h.competitions.delete_by_id(cup.id())?;
        let league = h.competitions.create(NewCompetition {
            name: "League".to_string(),
            organization_id: "org_1".to_string(),
            ..Default::default()
        })?;
        let engine = h.engine_over(FlakyActivities {
            inner: h.activities.clone(),
            reject_source: None,
            reject_deletes: true,
        });

        let report = engine.sync_competitions_to_activities("org_1")?;
        assert_eq!(report, SyncReport { created: 1, ..Default::default() });
        assert!(engine.find_activity_by_source(SourceType::Competition, league.id())?.is_some());
        assert!(engine.find_activity_by_source(SourceType::Competition, cup.id())?.is_some());

        let report = h.engine.sync_competitions_to_activities("org_1")?;
        assert_eq!(report, SyncReport { unchanged: 1, removed: 1, ..Default::default() });
        Ok(())
    }
}
