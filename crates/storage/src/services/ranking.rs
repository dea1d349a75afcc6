//! Rank computation for a single event.
//!
//! Competitors are ordered by total, highest first, using standard competition
//! ranking: equal totals share the better rank and the next distinct total resumes
//! at its position (27, 27, 25 ranks as 1, 1, 3). Only competitors with all three
//! judge scores take part, each with exactly one score row.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::TieBreakPolicy;
use crate::models::{JudgeScores, RankFields, Score, TieBreakerStatus};

#[derive(Debug, Clone)]
pub struct RankInput {
    pub score_id: Uuid,
    pub competitor_id: Uuid,
    pub scores: JudgeScores,
    /// Manual position inside a tie group, set by the organizer.
    pub tie_break_order: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Score> for RankInput {
    fn from(score: &Score) -> Self {
        Self {
            score_id: score.id,
            competitor_id: score.competitor_id,
            scores: score.judge_scores(),
            tie_break_order: score.tie_break_order,
            updated_at: score.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub score_id: Uuid,
    pub competitor_id: Uuid,
    pub total: Decimal,
    pub rank: i32,
    pub tie_breaker_status: Option<TieBreakerStatus>,
}

/// Ranks every competitor whose current row has a complete set of judge scores,
/// best first. With several rows for one competitor only the current one (see
/// [`current_inputs`]) is ranked; the others get no entry.
///
/// Inside a group of equal totals, members with a `tie_break_order` take distinct
/// consecutive ranks in that order; the remaining members share the next rank and
/// stay `tied` while at least two of them are left.
pub fn compute_ranking(inputs: &[RankInput], policy: TieBreakPolicy) -> Vec<RankedEntry> {
    let mut ranked: Vec<(&RankInput, Decimal)> = current_inputs(inputs)
        .into_iter()
        .filter_map(|input| input.scores.ranking_total().map(|total| (input, total)))
        .collect();

    ranked.sort_by(|(a, total_a), (b, total_b)| {
        total_b
            .cmp(total_a)
            .then_with(|| manual_order(a).cmp(&manual_order(b)))
            .then_with(|| a.competitor_id.cmp(&b.competitor_id))
            .then_with(|| a.score_id.cmp(&b.score_id))
    });

    let resolved_status = match policy {
        TieBreakPolicy::Clear => None,
        TieBreakPolicy::MarkResolved => Some(TieBreakerStatus::Resolved),
    };

    let mut entries = Vec::with_capacity(ranked.len());
    let mut start = 0;
    while start < ranked.len() {
        let group_total = ranked[start].1;
        let size = ranked[start..]
            .iter()
            .take_while(|(_, total)| *total == group_total)
            .count();
        let group = &ranked[start..start + size];
        let base = start as i32 + 1;

        if size == 1 {
            entries.push(entry(group[0], base, None));
        } else {
            let resolved = group
                .iter()
                .filter(|(input, _)| input.tie_break_order.is_some())
                .count();
            let remaining = size - resolved;
            for (offset, member) in group.iter().enumerate() {
                if offset < resolved {
                    entries.push(entry(*member, base + offset as i32, resolved_status));
                } else {
                    let status = if remaining >= 2 {
                        Some(TieBreakerStatus::Tied)
                    } else {
                        resolved_status
                    };
                    entries.push(entry(*member, base + resolved as i32, status));
                }
            }
        }

        start += size;
    }

    entries
}

/// Ranking outputs for every input, in input order. Inputs that cannot be ranked
/// get empty fields so stale ranks are cleared.
pub fn plan_rank_fields(inputs: &[RankInput], policy: TieBreakPolicy) -> Vec<(Uuid, RankFields)> {
    let ranking = compute_ranking(inputs, policy);
    inputs
        .iter()
        .map(|input| {
            let fields = ranking
                .iter()
                .find(|e| e.score_id == input.score_id)
                .map(|e| RankFields::from_rank(e.rank, e.tie_breaker_status))
                .unwrap_or_else(RankFields::unranked);
            (input.score_id, fields)
        })
        .collect()
}

/// Competitors currently sharing a tie group with `competitor_id`, including it.
pub fn tie_group_of(ranking: &[RankedEntry], competitor_id: Uuid) -> Vec<Uuid> {
    let Some(total) = ranking
        .iter()
        .find(|e| e.competitor_id == competitor_id)
        .map(|e| e.total)
    else {
        return Vec::new();
    };
    ranking
        .iter()
        .filter(|e| e.total == total)
        .map(|e| e.competitor_id)
        .collect()
}

/// One input per competitor: the most recently updated row, the lowest score id
/// among equally recent ones. This is the row score edits are applied to.
pub fn current_inputs(inputs: &[RankInput]) -> Vec<&RankInput> {
    let mut current: HashMap<Uuid, &RankInput> = HashMap::with_capacity(inputs.len());
    for input in inputs {
        current
            .entry(input.competitor_id)
            .and_modify(|kept| {
                if recency(input) > recency(kept) {
                    *kept = input;
                }
            })
            .or_insert(input);
    }
    current.into_values().collect()
}

fn recency(input: &RankInput) -> (DateTime<Utc>, Reverse<Uuid>) {
    (input.updated_at, Reverse(input.score_id))
}

fn manual_order(input: &RankInput) -> (bool, Option<i32>) {
    (input.tie_break_order.is_none(), input.tie_break_order)
}

fn entry(
    (input, total): (&RankInput, Decimal),
    rank: i32,
    tie_breaker_status: Option<TieBreakerStatus>,
) -> RankedEntry {
    RankedEntry {
        score_id: input.score_id,
        competitor_id: input.competitor_id,
        total,
        rank,
        tie_breaker_status,
    }
}
