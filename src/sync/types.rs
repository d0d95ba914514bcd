use serde::{Deserialize, Serialize};

/// Tally of one sync run. Per-record failures are logged and appear in no
/// counter.
#[derive(Serialize, Deserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl SyncReport {
    pub(crate) fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Whether the run wrote anything.
    pub fn has_changes(&self) -> bool {
        self.created + self.updated + self.removed > 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}
