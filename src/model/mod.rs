pub mod activity;
pub mod category;
pub mod competition;
pub mod fixture;
pub mod team;

pub use activity::{
    Activity, ActivityFilter, ActivityPatch, ActivityStatus, NewActivity, RecurrencePattern,
    Frequency, Reminder, ReminderMethod, SourceType,
};
pub use category::{ActivityCategory, CategoryFilter, CategoryPatch, CategoryType, NewCategory};
pub use competition::{Competition, CompetitionFilter, CompetitionPatch, CompetitionStatus, NewCompetition};
pub use fixture::{Fixture, FixtureFilter, FixturePatch, FixtureStatus, NewFixture};
pub use team::{NewTeam, Team, TeamFilter, TeamPatch};
