use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::RankFields;

/// Several events sharing one `(tournament_id, event_type)` pair.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateEventGroup {
    pub tournament_id: Uuid,
    pub event_type: String,
    /// Oldest first.
    pub event_ids: Vec<Uuid>,
    pub first_created: DateTime<Utc>,
    pub last_created: DateTime<Utc>,
    /// Creation spread fits the race window: likely two concurrent inserts.
    pub race_suspected: bool,
}

/// Several score rows for one competitor in one event.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateScoreGroup {
    pub event_id: Uuid,
    pub competitor_id: Uuid,
    /// Most recently updated first.
    pub score_ids: Vec<Uuid>,
}

/// A stored ranking that disagrees with a fresh computation.
#[derive(Debug, Clone, Serialize)]
pub struct RankDrift {
    pub score_id: Uuid,
    pub competitor_id: Uuid,
    pub stored: RankFields,
    pub expected: RankFields,
}

/// A field that did not read back with the value that was written.
#[derive(Debug, Clone, Serialize)]
pub struct FieldMismatch {
    pub row_id: Uuid,
    pub field: String,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRankAudit {
    pub event_id: Uuid,
    pub checked: usize,
    pub drift: Vec<RankDrift>,
    pub duplicates: Vec<DuplicateScoreGroup>,
}

impl EventRankAudit {
    pub fn is_consistent(&self) -> bool {
        self.drift.is_empty() && self.duplicates.is_empty()
    }
}
