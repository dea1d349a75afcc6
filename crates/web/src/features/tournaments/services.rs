use storage::{
    Database,
    dto::tournament::{CreateEventRequest, CreateTournamentRequest, RegisterCompetitorRequest},
    error::Result,
    models::{Competitor, Event, Tournament},
    repository::{event::EventRepository, tournament::TournamentRepository},
    services::{competitors, events, tournaments},
};
use uuid::Uuid;

/// Create a new tournament
pub async fn create_tournament(db: &Database, req: &CreateTournamentRequest) -> Result<Tournament> {
    tournaments::create_tournament(db, req).await
}

/// Get tournament by id
pub async fn get_tournament(db: &Database, tournament_id: Uuid) -> Result<Tournament> {
    TournamentRepository::new(db.store())
        .find_by_id(tournament_id)
        .await
}

/// Get or create the event of a type. The flag is true when it was created.
pub async fn ensure_event(
    db: &Database,
    tournament_id: Uuid,
    req: &CreateEventRequest,
) -> Result<(Event, bool)> {
    let mut cache = events::EventCache::new();
    events::ensure_event(db, &mut cache, tournament_id, req.event_type, req.name.as_deref()).await
}

/// List the events of a tournament
pub async fn list_events(db: &Database, tournament_id: Uuid) -> Result<Vec<Event>> {
    TournamentRepository::new(db.store())
        .find_by_id(tournament_id)
        .await?;
    EventRepository::new(db.store()).list(Some(tournament_id)).await
}

/// Register a competitor in a tournament
pub async fn register_competitor(
    db: &Database,
    tournament_id: Uuid,
    req: &RegisterCompetitorRequest,
) -> Result<Competitor> {
    competitors::register_competitor(db, tournament_id, req).await
}
