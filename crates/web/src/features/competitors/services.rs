use storage::{
    Database,
    dto::competitor::PromoteCompetitorRequest,
    error::Result,
    models::Competitor,
    repository::competitor::CompetitorRepository,
    services::competitors,
};
use uuid::Uuid;

/// Get competitor by id
pub async fn get_competitor(db: &Database, competitor_id: Uuid) -> Result<Competitor> {
    CompetitorRepository::new(db.store())
        .find_by_id(competitor_id)
        .await
}

/// Link a competitor to a global profile
pub async fn promote_competitor(
    db: &Database,
    competitor_id: Uuid,
    req: &PromoteCompetitorRequest,
) -> Result<Competitor> {
    competitors::promote_competitor(db, competitor_id, req).await
}
