use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{JudgeScores, Score, TieBreakerStatus};

/// Request payload for entering or editing the three judge scores of a competitor.
/// A slot left empty keeps whatever that judge already recorded; withdrawing the
/// competitor is the way to clear an entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitScoresRequest {
    #[validate(custom(function = "validate_judge_score"))]
    pub judge1: Option<Decimal>,
    #[validate(custom(function = "validate_judge_score"))]
    pub judge2: Option<Decimal>,
    #[validate(custom(function = "validate_judge_score"))]
    pub judge3: Option<Decimal>,
}

impl SubmitScoresRequest {
    pub fn judge_scores(&self) -> JudgeScores {
        JudgeScores::new(self.judge1, self.judge2, self.judge3)
    }
}

impl From<JudgeScores> for SubmitScoresRequest {
    fn from(scores: JudgeScores) -> Self {
        Self {
            judge1: scores.judge1,
            judge2: scores.judge2,
            judge3: scores.judge3,
        }
    }
}

/// Scores are stored as NUMERIC(4,2).
fn validate_judge_score(score: &Decimal) -> Result<(), validator::ValidationError> {
    if score.is_sign_negative() {
        return Err(validator::ValidationError::new("negative_score"));
    }
    if score.normalize().scale() > 2 {
        return Err(validator::ValidationError::new("too_many_decimals"));
    }
    Ok(())
}

/// Organizer's manual ordering of competitors that are currently tied, best first.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResolveTieRequest {
    #[validate(length(min = 1, message = "At least one competitor must be selected"))]
    pub competitor_ids: Vec<Uuid>,
}

/// Ranking of one event as stored after the last recompute.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventStandings {
    pub event_id: Uuid,
    /// Number of competitors with a score row in the event.
    pub competitor_count: usize,
    pub standings: Vec<Standing>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Standing {
    pub score_id: Uuid,
    pub competitor_id: Uuid,
    pub judge_scores: JudgeScores,
    pub total: Option<Decimal>,
    pub rank: Option<i32>,
    pub placement: Option<String>,
    pub medal: Option<String>,
    pub tie_breaker_status: Option<TieBreakerStatus>,
}

impl From<&Score> for Standing {
    fn from(score: &Score) -> Self {
        Self {
            score_id: score.id,
            competitor_id: score.competitor_id,
            judge_scores: score.judge_scores(),
            total: score.total,
            rank: score.rank,
            placement: score.placement.clone(),
            medal: score.medal.clone(),
            tie_breaker_status: score.tie_breaker_status,
        }
    }
}

impl EventStandings {
    /// Builds standings ordered by rank; unranked competitors come last.
    pub fn from_scores(event_id: Uuid, scores: &[Score]) -> Self {
        let mut standings: Vec<Standing> = scores.iter().map(Standing::from).collect();
        standings.sort_by(|a, b| {
            (a.rank.is_none(), a.rank, a.competitor_id).cmp(&(b.rank.is_none(), b.rank, b.competitor_id))
        });
        let mut competitors: Vec<Uuid> = scores.iter().map(|s| s.competitor_id).collect();
        competitors.sort();
        competitors.dedup();

        Self {
            event_id,
            competitor_count: competitors.len(),
            standings,
        }
    }

    pub fn rank_of(&self, competitor_id: Uuid) -> Option<i32> {
        self.standings
            .iter()
            .find(|s| s.competitor_id == competitor_id)
            .and_then(|s| s.rank)
    }
}
