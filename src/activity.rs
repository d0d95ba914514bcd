use std::sync::Arc;

use crate::db::{FilterExt, Page, QueryOptions, Repository};
use crate::error::{RepoError, RepoResult};
use crate::model::{Activity, ActivityFilter, ActivityPatch, NewActivity, SourceType};

/// User-facing activity operations. Activities derived from competitions
/// and fixtures belong to the sync engine and are read-only here.
#[derive(Clone)]
pub struct ActivityService {
    activities: Arc<dyn Repository<Activity>>,
}

impl ActivityService {
    pub fn new(activities: Arc<dyn Repository<Activity>>) -> Self {
        Self { activities }
    }

    pub fn get_activity(&self, id: &str) -> RepoResult<Activity> {
        self.activities.find_by_id(id)
    }

    pub fn find_activities(&self, filter: &ActivityFilter, options: &QueryOptions) -> RepoResult<Page<Activity>> {
        self.activities.find_by_filter(filter, options)
    }

    pub fn create_activity(&self, input: NewActivity) -> RepoResult<Activity> {
        if input.source_type.is_derived() {
            return Err(RepoError::PreconditionFailed(format!(
                "{} activities are created by sync",
                input.source_type
            )));
        }
        if input.title.trim().is_empty() {
            return Err(RepoError::ValidationFailed("title must not be empty".to_string()));
        }
        if input.end < input.start {
            return Err(RepoError::ValidationFailed("end must not be before start".to_string()));
        }
        if input.source_type == SourceType::GoogleCalendar && input.source_id.is_none() {
            return Err(RepoError::ValidationFailed(
                "google_calendar activities need a source_id".to_string(),
            ));
        }
        self.activities.create(input)
    }

    pub fn update_activity(&self, id: &str, patch: ActivityPatch) -> RepoResult<Activity> {
        let existing = self.activities.find_by_id(id)?;
        if existing.source_type.is_derived() {
            return Err(RepoError::PreconditionFailed(format!(
                "activity '{}' is synced from a {} and cannot be edited",
                id, existing.source_type
            )));
        }
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(RepoError::ValidationFailed("title must not be empty".to_string()));
            }
        }
        let start = patch.start.unwrap_or(existing.start);
        let end = patch.end.unwrap_or(existing.end);
        if end < start {
            return Err(RepoError::ValidationFailed("end must not be before start".to_string()));
        }
        self.activities.update(id, patch)
    }

    pub fn delete_activity(&self, id: &str) -> RepoResult<bool> {
        let existing = self.activities.find_by_id(id)?;
        if !existing.source_type.is_user_deletable() {
            return Err(RepoError::PreconditionFailed(format!(
                "activity '{}' has source {} and cannot be deleted",
                id, existing.source_type
            )));
        }
        self.activities.delete_by_id(id)
    }
}
