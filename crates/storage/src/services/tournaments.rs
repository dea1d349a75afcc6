use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::Database;
use crate::dto::tournament::CreateTournamentRequest;
use crate::error::{Result, StorageError};
use crate::models::{Tournament, TournamentClass};
use crate::repository::tournament::TournamentRepository;

pub async fn create_tournament(db: &Database, request: &CreateTournamentRequest) -> Result<Tournament> {
    request
        .validate()
        .map_err(|e| StorageError::validation(e.to_string()))?;

    // Stored in canonical spelling so every reader parses it the same way.
    let class = request
        .class
        .as_deref()
        .map(|c| c.parse::<TournamentClass>().map(|c| c.as_str().to_string()))
        .transpose()
        .map_err(StorageError::validation)?;

    let tournament = Tournament {
        id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        date: request.date,
        location: request.location.clone(),
        class,
        created_at: Utc::now(),
    };
    let created = TournamentRepository::new(db.store()).create(&tournament).await?;
    tracing::info!(tournament_id = %created.id, class = ?created.class, "Tournament created");
    Ok(created)
}
