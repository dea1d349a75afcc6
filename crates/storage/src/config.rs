use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Runtime settings shared by the ranking services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scoring: ScoringRules,
    pub persister: PersisterConfig,
    /// Upper bound for any single store call, in milliseconds.
    pub store_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scoring: ScoringRules::default(),
            persister: PersisterConfig::default(),
            store_timeout_ms: 5_000,
        }
    }
}

impl Settings {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Valid range for a single judge score, inclusive on both ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub judge_min: Decimal,
    pub judge_max: Decimal,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            judge_min: Decimal::ZERO,
            judge_max: Decimal::TEN,
        }
    }
}

impl ScoringRules {
    pub fn contains(&self, score: Decimal) -> bool {
        score >= self.judge_min && score <= self.judge_max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersisterConfig {
    /// Read back every rank write and compare it to the intended value.
    pub verify_writes: bool,
    /// How many times mismatched rows are rewritten before giving up.
    pub verify_retries: u32,
    pub tie_break_policy: TieBreakPolicy,
}

impl Default for PersisterConfig {
    fn default() -> Self {
        Self {
            verify_writes: true,
            verify_retries: 1,
            tie_break_policy: TieBreakPolicy::default(),
        }
    }
}

/// What the stored `tie_breaker_status` becomes once an organizer resolves a tie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// Status is cleared to null for resolved members.
    #[default]
    Clear,
    /// Status is stored as `resolved` so the former tie stays visible.
    MarkResolved,
}

impl std::str::FromStr for TieBreakPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "mark_resolved" | "mark-resolved" | "resolved" => Ok(Self::MarkResolved),
            other => Err(format!("unknown tie-break policy '{}'", other)),
        }
    }
}
