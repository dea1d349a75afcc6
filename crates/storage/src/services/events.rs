use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::Database;
use crate::error::Result;
use crate::models::{Event, EventType};
use crate::repository::event::EventRepository;
use crate::repository::score::ScoreRepository;
use crate::repository::tournament::TournamentRepository;
use crate::repository::video::VideoRepository;

/// `(tournament_id, event_type) -> event_id` lookups owned by the caller.
///
/// Entries are only added for events seen in the store and must be dropped
/// explicitly when an event or tournament goes away.
#[derive(Debug, Default)]
pub struct EventCache {
    ids: HashMap<(Uuid, EventType), Uuid>,
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tournament_id: Uuid, event_type: EventType) -> Option<Uuid> {
        self.ids.get(&(tournament_id, event_type)).copied()
    }

    pub fn remember(&mut self, tournament_id: Uuid, event_type: EventType, event_id: Uuid) {
        self.ids.insert((tournament_id, event_type), event_id);
    }

    pub fn invalidate_event(&mut self, event_id: Uuid) {
        self.ids.retain(|_, id| *id != event_id);
    }

    pub fn invalidate_tournament(&mut self, tournament_id: Uuid) {
        self.ids.retain(|(tournament, _), _| *tournament != tournament_id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Returns the event of `event_type` in the tournament, creating it if needed.
///
/// Insert and lookup are one atomic upsert, so concurrent callers end up with the
/// same row. The flag tells whether this call created it.
pub async fn ensure_event(
    db: &Database,
    cache: &mut EventCache,
    tournament_id: Uuid,
    event_type: EventType,
    name: Option<&str>,
) -> Result<(Event, bool)> {
    TournamentRepository::new(db.store()).find_by_id(tournament_id).await?;

    let (event, inserted) = EventRepository::new(db.store())
        .upsert(&new_event(tournament_id, event_type, name))
        .await?;
    if inserted {
        tracing::info!(event_id = %event.id, %tournament_id, %event_type, "Event created");
    }
    cache.remember(tournament_id, event_type, event.id);
    Ok((event, inserted))
}

/// Strict creation: an existing event of the same type is a conflict.
pub async fn create_event(
    db: &Database,
    cache: &mut EventCache,
    tournament_id: Uuid,
    event_type: EventType,
    name: Option<&str>,
) -> Result<Event> {
    TournamentRepository::new(db.store()).find_by_id(tournament_id).await?;

    let event = EventRepository::new(db.store())
        .insert(&new_event(tournament_id, event_type, name))
        .await?;
    tracing::info!(event_id = %event.id, %tournament_id, %event_type, "Event created");
    cache.remember(tournament_id, event_type, event.id);
    Ok(event)
}

/// Event id for a type, from the cache when present, otherwise from the store.
pub async fn resolve_event_id(
    db: &Database,
    cache: &mut EventCache,
    tournament_id: Uuid,
    event_type: EventType,
) -> Result<Option<Uuid>> {
    if let Some(id) = cache.get(tournament_id, event_type) {
        return Ok(Some(id));
    }

    let found = EventRepository::new(db.store())
        .find_by_type(tournament_id, event_type.as_str())
        .await?;
    if let Some(event) = &found {
        cache.remember(tournament_id, event_type, event.id);
    }
    Ok(found.map(|e| e.id))
}

/// Deletes an event with its scores and their videos.
pub async fn delete_event(db: &Database, cache: &mut EventCache, event_id: Uuid) -> Result<Event> {
    let store = db.store();
    let events = EventRepository::new(store);
    events.find_by_id(event_id).await?;

    let guard = db.locks().acquire(event_id).await;
    let scores = ScoreRepository::new(store);
    let score_ids: Vec<Uuid> = scores
        .list_for_event(event_id)
        .await?
        .iter()
        .map(|s| s.id)
        .collect();
    let videos = VideoRepository::new(store).delete_for_scores(&score_ids).await?;
    let removed_scores = scores.delete_for_event(event_id).await?.len();
    let event = events.delete(event_id).await?;
    drop(guard);

    cache.invalidate_event(event_id);
    db.locks().forget(event_id);
    tracing::info!(%event_id, scores = removed_scores, videos, "Event deleted");
    Ok(event)
}

fn new_event(tournament_id: Uuid, event_type: EventType, name: Option<&str>) -> Event {
    Event {
        id: Uuid::new_v4(),
        tournament_id,
        event_type: event_type.as_str().to_string(),
        name: name.unwrap_or(event_type.display_name()).to_string(),
        created_at: Utc::now(),
    }
}
