use storage::{
    Database,
    dto::{
        audit::EventRankAudit,
        score::{EventStandings, ResolveTieRequest, SubmitScoresRequest},
    },
    error::Result,
    services::{
        consistency::ConsistencyAuditor, events, rank_persister::RankPersister, scoring,
    },
};
use uuid::Uuid;

/// Enter or edit the judge scores of a competitor, then rerank the event
pub async fn submit_scores(
    db: &Database,
    event_id: Uuid,
    competitor_id: Uuid,
    req: &SubmitScoresRequest,
) -> Result<EventStandings> {
    scoring::submit_scores(db, event_id, competitor_id, req).await
}

/// Remove a competitor's entry from the event, then rerank it
pub async fn withdraw_competitor(
    db: &Database,
    event_id: Uuid,
    competitor_id: Uuid,
) -> Result<EventStandings> {
    scoring::withdraw_competitor(db, event_id, competitor_id).await
}

pub async fn resolve_tie(
    db: &Database,
    event_id: Uuid,
    req: &ResolveTieRequest,
) -> Result<EventStandings> {
    scoring::resolve_tie(db, event_id, req).await
}

pub async fn clear_tie_breaks(db: &Database, event_id: Uuid) -> Result<EventStandings> {
    scoring::clear_tie_breaks(db, event_id).await
}

/// Stored standings, as written by the last recompute
pub async fn get_standings(db: &Database, event_id: Uuid) -> Result<EventStandings> {
    scoring::event_standings(db, event_id).await
}

/// Rerank the event from its current scores
pub async fn recompute(db: &Database, event_id: Uuid) -> Result<EventStandings> {
    RankPersister::new(db).persist(event_id).await
}

/// Compare stored ranks with a fresh computation, without repairing anything
pub async fn audit_ranks(db: &Database, event_id: Uuid) -> Result<EventRankAudit> {
    ConsistencyAuditor::new(db.store(), db.settings().persister.tie_break_policy)
        .audit_event_ranks(event_id)
        .await
}

/// Delete an event with its scores and videos
pub async fn delete_event(db: &Database, event_id: Uuid) -> Result<()> {
    let mut cache = events::EventCache::new();
    events::delete_event(db, &mut cache, event_id).await?;
    Ok(())
}
