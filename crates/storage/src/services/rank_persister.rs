use uuid::Uuid;

use crate::Database;
use crate::config::PersisterConfig;
use crate::dto::score::EventStandings;
use crate::error::{BatchFailure, Result, StorageError};
use crate::models::RankFields;
use crate::repository::event::EventRepository;
use crate::repository::score::ScoreRepository;
use crate::services::consistency::ConsistencyAuditor;
use crate::services::locks::{EventGuard, EventLocks};
use crate::services::ranking::{RankInput, plan_rank_fields};
use crate::store::DataStore;

/// Recomputes the ranking of an event and rewrites the rank fields of every
/// competitor in it.
///
/// The whole read, compute, write and verify cycle runs under the event's lock.
/// A write that does not read back is retried `verify_retries` times and then
/// reported; success is only returned once the stored ranking matches.
pub struct RankPersister<'a> {
    store: &'a dyn DataStore,
    locks: &'a EventLocks,
    config: &'a PersisterConfig,
}

impl<'a> RankPersister<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self::with_parts(db.store(), db.locks(), &db.settings().persister)
    }

    pub fn with_parts(store: &'a dyn DataStore, locks: &'a EventLocks, config: &'a PersisterConfig) -> Self {
        Self { store, locks, config }
    }

    pub async fn persist(&self, event_id: Uuid) -> Result<EventStandings> {
        let guard = self.locks.acquire(event_id).await;
        self.recompute(&guard).await
    }

    /// Same as [`RankPersister::persist`] for a caller that already holds the lock,
    /// typically right after mutating a score.
    pub async fn recompute(&self, guard: &EventGuard) -> Result<EventStandings> {
        let event_id = guard.event_id();
        EventRepository::new(self.store).find_by_id(event_id).await?;

        let scores = ScoreRepository::new(self.store);
        let current = scores.list_for_event(event_id).await?;
        let inputs: Vec<RankInput> = current.iter().map(RankInput::from).collect();
        let planned = plan_rank_fields(&inputs, self.config.tie_break_policy);

        self.write_batch(event_id, &planned).await?;
        if self.config.verify_writes {
            self.verify(event_id, &planned).await?;
        }

        let stored = scores.list_for_event(event_id).await?;
        let standings = EventStandings::from_scores(event_id, &stored);
        tracing::info!(
            %event_id,
            competitors = standings.competitor_count,
            ranked = planned.iter().filter(|(_, f)| f.rank.is_some()).count(),
            "Event ranking persisted"
        );
        Ok(standings)
    }

    async fn write_batch(&self, event_id: Uuid, planned: &[(Uuid, RankFields)]) -> Result<()> {
        let scores = ScoreRepository::new(self.store);
        let mut written = 0;
        let mut failed = Vec::new();

        for (score_id, fields) in planned {
            match scores.write_rank_fields(*score_id, fields).await {
                Ok(Some(_)) => written += 1,
                Ok(None) => failed.push(BatchFailure {
                    row_id: *score_id,
                    reason: "score row no longer exists".to_string(),
                }),
                Err(e) => failed.push(BatchFailure {
                    row_id: *score_id,
                    reason: e.to_string(),
                }),
            }
        }

        if failed.is_empty() {
            return Ok(());
        }
        tracing::error!(
            %event_id,
            written,
            failed = failed.len(),
            "Rank rewrite partially failed"
        );
        Err(StorageError::PartialBatch {
            event_id,
            written,
            failed,
        })
    }

    async fn verify(&self, event_id: Uuid, planned: &[(Uuid, RankFields)]) -> Result<()> {
        let auditor = ConsistencyAuditor::new(self.store, self.config.tie_break_policy);
        let mut attempts = 0;

        loop {
            let mismatches = auditor.rank_mismatches(planned).await?;
            let Some(first) = mismatches.first() else {
                return Ok(());
            };

            if attempts >= self.config.verify_retries {
                tracing::error!(
                    %event_id,
                    score_id = %first.row_id,
                    field = %first.field,
                    expected = %first.expected,
                    actual = %first.actual,
                    mismatches = mismatches.len(),
                    "Rank write did not persist"
                );
                return Err(StorageError::PersistenceMismatch {
                    table: "scores",
                    row_id: first.row_id,
                    field: first.field.clone(),
                    expected: first.expected.clone(),
                    actual: first.actual.clone(),
                });
            }

            attempts += 1;
            tracing::warn!(
                %event_id,
                attempt = attempts,
                mismatches = mismatches.len(),
                "Rank write did not read back, rewriting"
            );
            let retry: Vec<(Uuid, RankFields)> = planned
                .iter()
                .filter(|(id, _)| mismatches.iter().any(|m| m.row_id == *id))
                .cloned()
                .collect();
            self.write_batch(event_id, &retry).await?;
        }
    }
}
