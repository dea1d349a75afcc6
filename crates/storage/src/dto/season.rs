use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{JudgeScores, TournamentClass};

/// One finalized result of a competitor, joined with its event and tournament.
/// Derived on read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeasonalPointsRecord {
    pub score_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub event_type: String,
    pub tournament_id: Uuid,
    pub tournament_name: String,
    pub tournament_date: NaiveDate,
    pub tournament_class: TournamentClass,
    pub rank: i32,
    pub points: u32,
    pub competitor_count: usize,
    pub judge_scores: JudgeScores,
    pub total_score: Option<Decimal>,
}

/// Points history of a global profile, most recent tournament first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SeasonalHistory {
    pub profile_id: Uuid,
    /// Calendar year the history is restricted to, if any.
    pub season: Option<i32>,
    pub total_points: u32,
    pub entries: Vec<SeasonalPointsRecord>,
}

impl SeasonalHistory {
    pub fn new(profile_id: Uuid, season: Option<i32>, entries: Vec<SeasonalPointsRecord>) -> Self {
        let total_points = entries.iter().map(|e| e.points).sum();
        Self {
            profile_id,
            season,
            total_points,
            entries,
        }
    }
}
