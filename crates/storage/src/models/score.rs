use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const GOLD_MEDAL: &str = "🥇";
pub const SILVER_MEDAL: &str = "🥈";
pub const BRONZE_MEDAL: &str = "🥉";

/// Judging result of one competitor in one event, plus the ranking outputs.
///
/// `total` is always the sum of the recorded judge scores at the last save and is
/// never edited on its own. `rank`, `placement`, `medal` and `tie_breaker_status`
/// are owned by the rank persister.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Score {
    pub id: Uuid,
    pub event_id: Uuid,
    pub competitor_id: Uuid,
    pub judge1: Option<Decimal>,
    pub judge2: Option<Decimal>,
    pub judge3: Option<Decimal>,
    pub total: Option<Decimal>,
    pub rank: Option<i32>,
    pub placement: Option<String>,
    pub medal: Option<String>,
    pub tie_breaker_status: Option<TieBreakerStatus>,
    /// Organizer-chosen position inside a tie group, 1 = first.
    pub tie_break_order: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Score {
    pub fn judge_scores(&self) -> JudgeScores {
        JudgeScores {
            judge1: self.judge1,
            judge2: self.judge2,
            judge3: self.judge3,
        }
    }

    pub fn rank_fields(&self) -> RankFields {
        RankFields {
            rank: self.rank,
            placement: self.placement.clone(),
            medal: self.medal.clone(),
            tie_breaker_status: self.tie_breaker_status,
        }
    }
}

/// The three judge slots of a score. A slot is `None` until that judge has scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JudgeScores {
    pub judge1: Option<Decimal>,
    pub judge2: Option<Decimal>,
    pub judge3: Option<Decimal>,
}

impl JudgeScores {
    pub fn new(judge1: Option<Decimal>, judge2: Option<Decimal>, judge3: Option<Decimal>) -> Self {
        Self {
            judge1,
            judge2,
            judge3,
        }
    }

    pub fn complete(judge1: Decimal, judge2: Decimal, judge3: Decimal) -> Self {
        Self::new(Some(judge1), Some(judge2), Some(judge3))
    }

    pub fn slots(&self) -> [Option<Decimal>; 3] {
        [self.judge1, self.judge2, self.judge3]
    }

    pub fn is_complete(&self) -> bool {
        self.slots().iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.slots().iter().all(Option::is_none)
    }

    /// These scores with every slot `update` carries replaced. Slots `update`
    /// leaves empty keep their recorded value.
    pub fn merge(&self, update: JudgeScores) -> Self {
        Self::new(
            update.judge1.or(self.judge1),
            update.judge2.or(self.judge2),
            update.judge3.or(self.judge3),
        )
    }

    /// Sum of the recorded slots, `None` when no judge has scored yet.
    pub fn recorded_total(&self) -> Option<Decimal> {
        if self.is_empty() {
            return None;
        }
        Some(self.slots().into_iter().flatten().sum())
    }

    /// Total used for ranking: only defined once all three judges have scored.
    pub fn ranking_total(&self) -> Option<Decimal> {
        if self.is_complete() {
            self.recorded_total()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakerStatus {
    Tied,
    Resolved,
}

/// The ranking outputs written back for one score row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankFields {
    pub rank: Option<i32>,
    pub placement: Option<String>,
    pub medal: Option<String>,
    pub tie_breaker_status: Option<TieBreakerStatus>,
}

impl RankFields {
    pub fn unranked() -> Self {
        Self::default()
    }

    /// Derives placement and medal from the rank.
    pub fn from_rank(rank: i32, tie_breaker_status: Option<TieBreakerStatus>) -> Self {
        let placement = placement_for_rank(rank);
        let medal = placement.as_deref().and_then(medal_for_placement);
        Self {
            rank: Some(rank),
            placement,
            medal: medal.map(str::to_string),
            tie_breaker_status,
        }
    }
}

pub fn placement_for_rank(rank: i32) -> Option<String> {
    match rank {
        1..=3 => Some(rank.to_string()),
        _ => None,
    }
}

pub fn medal_for_placement(placement: &str) -> Option<&'static str> {
    match placement {
        "1" => Some(GOLD_MEDAL),
        "2" => Some(SILVER_MEDAL),
        "3" => Some(BRONZE_MEDAL),
        _ => None,
    }
}
