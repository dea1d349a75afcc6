//! On-demand consistency checks over the shared store.
//!
//! Nothing here repairs data. Each check reads, compares and reports, leaving merges
//! and deletions to an operator.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::config::TieBreakPolicy;
use crate::dto::audit::{
    DuplicateEventGroup, DuplicateScoreGroup, EventRankAudit, FieldMismatch, RankDrift,
};
use crate::error::{Result, StorageError};
use crate::models::{RankFields, Score};
use crate::repository::event::EventRepository;
use crate::repository::score::ScoreRepository;
use crate::services::ranking::{RankInput, plan_rank_fields};
use crate::store::{ChangeFeed, ChangeKind, DataStore, Filter, Row, Table, from_row, to_row};

/// Default spread under which duplicate events are attributed to a creation race.
pub const DEFAULT_RACE_WINDOW_SECS: i64 = 10;

pub struct ConsistencyAuditor<'a> {
    store: &'a dyn DataStore,
    policy: TieBreakPolicy,
}

impl<'a> ConsistencyAuditor<'a> {
    pub fn new(store: &'a dyn DataStore, policy: TieBreakPolicy) -> Self {
        Self { store, policy }
    }

    /// Groups events sharing a `(tournament_id, event_type)` pair.
    pub async fn find_duplicate_events(
        &self,
        tournament_id: Option<Uuid>,
        race_window: Duration,
    ) -> Result<Vec<DuplicateEventGroup>> {
        let events = EventRepository::new(self.store).list(tournament_id).await?;

        let mut by_key: BTreeMap<(Uuid, String), Vec<_>> = BTreeMap::new();
        for event in events {
            by_key
                .entry((event.tournament_id, event.event_type.clone()))
                .or_default()
                .push(event);
        }

        let mut groups = Vec::new();
        for ((tournament_id, event_type), mut events) in by_key {
            if events.len() < 2 {
                continue;
            }
            events.sort_by_key(|e| (e.created_at, e.id));
            let first_created = events[0].created_at;
            let last_created = events[events.len() - 1].created_at;
            let race_suspected = last_created - first_created <= race_window;

            tracing::warn!(
                %tournament_id,
                event_type = %event_type,
                count = events.len(),
                race_suspected,
                "Duplicate events"
            );

            groups.push(DuplicateEventGroup {
                tournament_id,
                event_type,
                event_ids: events.iter().map(|e| e.id).collect(),
                first_created,
                last_created,
                race_suspected,
            });
        }

        Ok(groups)
    }

    /// Groups score rows sharing an `(event_id, competitor_id)` pair.
    pub async fn find_duplicate_scores(&self, event_id: Option<Uuid>) -> Result<Vec<DuplicateScoreGroup>> {
        let scores = ScoreRepository::new(self.store).list(event_id).await?;
        Ok(duplicate_scores(scores))
    }

    /// Re-reads one row and compares every field of `expected` with what is stored.
    pub async fn verify_fields(&self, table: Table, row_id: Uuid, expected: &Row) -> Result<()> {
        let stored = self
            .store
            .select(table, &Filter::new().eq_id("id", row_id))
            .await?
            .into_iter()
            .next()
            .ok_or(StorageError::not_found(table.as_str(), row_id))?;

        match field_mismatches(row_id, expected, &stored).into_iter().next() {
            None => Ok(()),
            Some(mismatch) => {
                tracing::error!(
                    table = %table,
                    %row_id,
                    field = %mismatch.field,
                    expected = %mismatch.expected,
                    actual = %mismatch.actual,
                    "Write did not persist"
                );
                Err(StorageError::PersistenceMismatch {
                    table: table.as_str(),
                    row_id,
                    field: mismatch.field,
                    expected: mismatch.expected,
                    actual: mismatch.actual,
                })
            }
        }
    }

    /// Reads back a batch of rank writes in one query and lists every field that
    /// differs from the plan. A row that disappeared is reported on `id`.
    pub async fn rank_mismatches(&self, planned: &[(Uuid, RankFields)]) -> Result<Vec<FieldMismatch>> {
        if planned.is_empty() {
            return Ok(Vec::new());
        }
        let stored = self
            .store
            .select(
                Table::Scores,
                &Filter::new().in_ids("id", planned.iter().map(|(id, _)| *id)),
            )
            .await?;

        let mut mismatches = Vec::new();
        for (score_id, fields) in planned {
            let id = Value::String(score_id.to_string());
            match stored.iter().find(|row| row.get("id") == Some(&id)) {
                Some(row) => mismatches.extend(field_mismatches(*score_id, &to_row(fields)?, row)),
                None => mismatches.push(FieldMismatch {
                    row_id: *score_id,
                    field: "id".to_string(),
                    expected: id,
                    actual: Value::Null,
                }),
            }
        }
        Ok(mismatches)
    }

    /// Compares the stored ranking of an event with a fresh computation. Read-only.
    pub async fn audit_event_ranks(&self, event_id: Uuid) -> Result<EventRankAudit> {
        EventRepository::new(self.store).find_by_id(event_id).await?;
        let scores = ScoreRepository::new(self.store).list_for_event(event_id).await?;

        let inputs: Vec<RankInput> = scores.iter().map(RankInput::from).collect();
        let drift = plan_rank_fields(&inputs, self.policy)
            .into_iter()
            .zip(&scores)
            .filter_map(|((score_id, expected), score)| {
                let stored = score.rank_fields();
                (stored != expected).then(|| RankDrift {
                    score_id,
                    competitor_id: score.competitor_id,
                    stored,
                    expected,
                })
            })
            .collect::<Vec<_>>();

        let checked = scores.len();
        let duplicates = duplicate_scores(scores);
        if !drift.is_empty() || !duplicates.is_empty() {
            tracing::warn!(
                %event_id,
                drift = drift.len(),
                duplicates = duplicates.len(),
                "Event ranking is inconsistent"
            );
        }

        Ok(EventRankAudit {
            event_id,
            checked,
            drift,
            duplicates,
        })
    }

    /// Subscribes to the score rows of one event and yields rank changes.
    pub async fn watch_event(&self, event_id: Uuid) -> Result<RankWatch> {
        EventRepository::new(self.store).find_by_id(event_id).await?;
        let feed = self
            .store
            .subscribe(Table::Scores, Filter::new().eq_id("event_id", event_id))
            .await?;
        tracing::info!(%event_id, "Watching rank changes");
        Ok(RankWatch { event_id, feed })
    }
}

/// One observed change of a stored ranking.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RankChange {
    pub score_id: Uuid,
    pub competitor_id: Uuid,
    pub kind: ChangeKind,
    pub before: Option<RankFields>,
    pub after: Option<RankFields>,
}

pub struct RankWatch {
    event_id: Uuid,
    feed: ChangeFeed,
}

impl RankWatch {
    /// Next change touching rank, placement, medal or tie status. Judging edits that
    /// leave the ranking alone are skipped. `None` once the feed closes.
    pub async fn next(&mut self) -> Option<RankChange> {
        while let Some(event) = self.feed.next().await {
            let before = event.old.clone().and_then(decode_score);
            let after = event.new.clone().and_then(decode_score);
            let Some(score) = after.as_ref().or(before.as_ref()) else {
                tracing::warn!(event_id = %self.event_id, "Undecodable score change");
                continue;
            };
            let (score_id, competitor_id) = (score.id, score.competitor_id);
            let before = before.map(|s| s.rank_fields());
            let after = after.map(|s| s.rank_fields());

            if event.kind == ChangeKind::Update && before == after {
                continue;
            }

            tracing::info!(
                event_id = %self.event_id,
                %score_id,
                %competitor_id,
                kind = ?event.kind,
                before = ?before.as_ref().and_then(|f| f.rank),
                after = ?after.as_ref().and_then(|f| f.rank),
                "Rank change"
            );
            return Some(RankChange {
                score_id,
                competitor_id,
                kind: event.kind,
                before,
                after,
            });
        }
        None
    }
}

fn decode_score(row: Row) -> Option<Score> {
    from_row(row).ok()
}

fn duplicate_scores(scores: Vec<Score>) -> Vec<DuplicateScoreGroup> {
    let mut by_entry: BTreeMap<(Uuid, Uuid), Vec<Score>> = BTreeMap::new();
    for score in scores {
        by_entry
            .entry((score.event_id, score.competitor_id))
            .or_default()
            .push(score);
    }

    by_entry
        .into_iter()
        .filter(|(_, rows)| rows.len() > 1)
        .map(|((event_id, competitor_id), mut rows)| {
            rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
            tracing::warn!(%event_id, %competitor_id, count = rows.len(), "Duplicate score rows");
            DuplicateScoreGroup {
                event_id,
                competitor_id,
                score_ids: rows.iter().map(|s| s.id).collect(),
            }
        })
        .collect()
}

/// Fields of `expected` whose stored value differs.
pub fn field_mismatches(row_id: Uuid, expected: &Row, stored: &Row) -> Vec<FieldMismatch> {
    expected
        .iter()
        .filter_map(|(field, want)| {
            let actual = stored.get(field).cloned().unwrap_or(Value::Null);
            (!same_value(want, &actual)).then(|| FieldMismatch {
                row_id,
                field: field.clone(),
                expected: want.clone(),
                actual,
            })
        })
        .collect()
}

/// JSON equality that tolerates backend formatting: decimals may come back as
/// numbers or strings, timestamps with a different offset notation.
fn same_value(expected: &Value, actual: &Value) -> bool {
    if expected == actual {
        return true;
    }
    if let (Some(a), Some(b)) = (as_decimal(expected), as_decimal(actual)) {
        return a == b;
    }
    if let (Value::String(a), Value::String(b)) = (expected, actual)
        && let (Ok(a), Ok(b)) = (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b))
    {
        return a == b;
    }
    false
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_decimal_representations_compare_equal() {
        assert!(same_value(&json!("9.50"), &json!(9.5)));
        assert!(same_value(&json!(27), &json!("27.00")));
        assert!(!same_value(&json!("9.5"), &json!(9.6)));
    }

    #[test]
    fn test_timestamps_compare_by_instant() {
        assert!(same_value(
            &json!("2025-03-01T10:00:00Z"),
            &json!("2025-03-01T10:00:00+00:00")
        ));
        assert!(!same_value(
            &json!("2025-03-01T10:00:00Z"),
            &json!("2025-03-01T10:00:01+00:00")
        ));
    }

    #[test]
    fn test_mismatches_name_the_field() {
        let id = Uuid::new_v4();
        let expected = row(json!({"rank": 1, "medal": "🥇", "tie_breaker_status": null}));
        let stored = row(json!({"rank": 2, "medal": "🥇"}));

        let mismatches = field_mismatches(id, &expected, &stored);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].field, "rank");
        assert_eq!(mismatches[0].expected, json!(1));
        assert_eq!(mismatches[0].actual, json!(2));
    }
}
