//! Score mutations. Each one runs under the event's lock and ends with a full
//! rank rewrite of that event before returning.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::Database;
use crate::dto::score::{EventStandings, ResolveTieRequest, SubmitScoresRequest};
use crate::error::{Result, StorageError};
use crate::models::{JudgeScores, Score};
use crate::repository::competitor::CompetitorRepository;
use crate::repository::event::EventRepository;
use crate::repository::score::ScoreRepository;
use crate::repository::video::VideoRepository;
use crate::services::rank_persister::RankPersister;
use crate::services::ranking::{RankInput, compute_ranking, tie_group_of};

/// Records the judge scores of a competitor in an event, then re-ranks the event.
///
/// Every check runs before the first write: ids, score range, existence of the
/// event and competitor, and that the competitor entered the event's tournament.
pub async fn submit_scores(
    db: &Database,
    event_id: Uuid,
    competitor_id: Uuid,
    request: &SubmitScoresRequest,
) -> Result<EventStandings> {
    require_id("event_id", event_id)?;
    require_id("competitor_id", competitor_id)?;
    request
        .validate()
        .map_err(|e| StorageError::validation(e.to_string()))?;

    let scores = request.judge_scores();
    if scores.is_empty() {
        return Err(StorageError::validation("at least one judge score is required"));
    }
    let rules = &db.settings().scoring;
    for (slot, value) in scores.slots().iter().enumerate() {
        if let Some(value) = value
            && !rules.contains(*value)
        {
            return Err(StorageError::validation(format!(
                "judge{} score {} is outside {}..={}",
                slot + 1,
                value,
                rules.judge_min,
                rules.judge_max
            )));
        }
    }

    let store = db.store();
    let event = EventRepository::new(store).find_by_id(event_id).await?;
    let competitor = CompetitorRepository::new(store).find_by_id(competitor_id).await?;
    if competitor.tournament_id != event.tournament_id {
        return Err(StorageError::validation(format!(
            "competitor {} is not registered in the tournament of event {}",
            competitor_id, event_id
        )));
    }

    let guard = db.locks().acquire(event_id).await;
    let repo = ScoreRepository::new(store);
    let recorded = match current_entry(&repo, event_id, competitor_id).await? {
        Some(existing) => update_entry(&repo, &existing, scores).await?,
        None => {
            let now = Utc::now();
            let score = Score {
                id: Uuid::new_v4(),
                event_id,
                competitor_id,
                judge1: scores.judge1,
                judge2: scores.judge2,
                judge3: scores.judge3,
                total: scores.recorded_total(),
                rank: None,
                placement: None,
                medal: None,
                tie_breaker_status: None,
                tie_break_order: None,
                created_at: now,
                updated_at: now,
            };
            match repo.insert(&score).await {
                Ok(_) => scores,
                // Another process inserted the entry first; edit that row instead.
                Err(e) if e.is_unique_violation() => {
                    let existing = current_entry(&repo, event_id, competitor_id)
                        .await?
                        .ok_or(StorageError::not_found("Score", competitor_id))?;
                    update_entry(&repo, &existing, scores).await?
                }
                Err(e) => return Err(e),
            }
        }
    };
    tracing::info!(%event_id, %competitor_id, complete = recorded.is_complete(), "Scores recorded");

    RankPersister::new(db).recompute(&guard).await
}

/// Removes a competitor's score (and its video) from an event, then re-ranks it.
pub async fn withdraw_competitor(db: &Database, event_id: Uuid, competitor_id: Uuid) -> Result<EventStandings> {
    require_id("event_id", event_id)?;
    require_id("competitor_id", competitor_id)?;

    let store = db.store();
    EventRepository::new(store).find_by_id(event_id).await?;

    let guard = db.locks().acquire(event_id).await;
    let repo = ScoreRepository::new(store);
    let entries = repo.find_entry(event_id, competitor_id).await?;
    if entries.is_empty() {
        return Err(StorageError::not_found("Score", competitor_id));
    }

    let score_ids: Vec<Uuid> = entries.iter().map(|s| s.id).collect();
    let videos = VideoRepository::new(store).delete_for_scores(&score_ids).await?;
    let removed = repo.delete_entry(event_id, competitor_id).await?;
    tracing::info!(%event_id, %competitor_id, scores = removed.len(), videos, "Competitor withdrawn");

    RankPersister::new(db).recompute(&guard).await
}

/// Orders some or all members of one tie group, best first, then re-ranks.
///
/// Any earlier manual order inside that group is replaced. Members not listed stay
/// tied behind the listed ones.
pub async fn resolve_tie(db: &Database, event_id: Uuid, request: &ResolveTieRequest) -> Result<EventStandings> {
    require_id("event_id", event_id)?;
    request
        .validate()
        .map_err(|e| StorageError::validation(e.to_string()))?;
    let mut seen = HashSet::new();
    if let Some(repeated) = request.competitor_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(StorageError::validation(format!(
            "competitor {} is listed more than once",
            repeated
        )));
    }

    let store = db.store();
    EventRepository::new(store).find_by_id(event_id).await?;

    let guard = db.locks().acquire(event_id).await;
    let repo = ScoreRepository::new(store);
    let scores = repo.list_for_event(event_id).await?;
    let inputs: Vec<RankInput> = scores.iter().map(RankInput::from).collect();
    let ranking = compute_ranking(&inputs, db.settings().persister.tie_break_policy);

    let group = tie_group_of(&ranking, request.competitor_ids[0]);
    if group.len() < 2 {
        return Err(StorageError::validation(format!(
            "competitor {} is not part of a tie in event {}",
            request.competitor_ids[0], event_id
        )));
    }
    if let Some(outsider) = request.competitor_ids.iter().find(|id| !group.contains(*id)) {
        return Err(StorageError::validation(format!(
            "competitor {} is not in the same tie group",
            outsider
        )));
    }

    for entry in ranking.iter().filter(|e| group.contains(&e.competitor_id)) {
        let order = request
            .competitor_ids
            .iter()
            .position(|id| *id == entry.competitor_id)
            .map(|index| index as i32 + 1);
        repo.set_tie_break_order(entry.score_id, order)
            .await?
            .ok_or(StorageError::not_found("Score", entry.score_id))?;
    }
    tracing::info!(%event_id, resolved = request.competitor_ids.len(), group = group.len(), "Tie resolved");

    RankPersister::new(db).recompute(&guard).await
}

/// Drops every manual tie-break order of an event, then re-ranks.
pub async fn clear_tie_breaks(db: &Database, event_id: Uuid) -> Result<EventStandings> {
    require_id("event_id", event_id)?;
    let store = db.store();
    EventRepository::new(store).find_by_id(event_id).await?;

    let guard = db.locks().acquire(event_id).await;
    let repo = ScoreRepository::new(store);
    let mut cleared = 0;
    for score in repo.list_for_event(event_id).await? {
        if score.tie_break_order.is_some() {
            repo.set_tie_break_order(score.id, None).await?;
            cleared += 1;
        }
    }
    tracing::info!(%event_id, cleared, "Tie breaks cleared");

    RankPersister::new(db).recompute(&guard).await
}

/// The ranking as currently stored. Does not recompute.
pub async fn event_standings(db: &Database, event_id: Uuid) -> Result<EventStandings> {
    require_id("event_id", event_id)?;
    let store = db.store();
    EventRepository::new(store).find_by_id(event_id).await?;
    let scores = ScoreRepository::new(store).list_for_event(event_id).await?;
    Ok(EventStandings::from_scores(event_id, &scores))
}

fn require_id(name: &str, id: Uuid) -> Result<()> {
    if id.is_nil() {
        return Err(StorageError::validation(format!("{} is required", name)));
    }
    Ok(())
}

/// The entry's score row. With duplicates present, the most recently updated wins.
async fn current_entry(repo: &ScoreRepository<'_>, event_id: Uuid, competitor_id: Uuid) -> Result<Option<Score>> {
    let mut rows = repo.find_entry(event_id, competitor_id).await?;
    if rows.len() > 1 {
        tracing::warn!(%event_id, %competitor_id, count = rows.len(), "Duplicate score rows, editing the latest");
    }
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
    Ok(rows.into_iter().next())
}

/// Writes the submitted slots over the entry's recorded ones and returns the result.
/// Slots missing from the submission keep their value.
async fn update_entry(repo: &ScoreRepository<'_>, existing: &Score, submitted: JudgeScores) -> Result<JudgeScores> {
    let scores = existing.judge_scores().merge(submitted);
    let total_changed = existing.total != scores.recorded_total();
    repo.update_judging(existing.id, scores, total_changed, Utc::now())
        .await?
        .ok_or(StorageError::not_found("Score", existing.id))?;
    if total_changed && existing.tie_break_order.is_some() {
        tracing::info!(score_id = %existing.id, "Total changed, manual tie order dropped");
    }
    Ok(scores)
}
