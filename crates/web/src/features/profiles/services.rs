use storage::{
    Database, dto::season::SeasonalHistory, error::Result,
    services::seasonal_points::SeasonalPointsAggregator,
};
use uuid::Uuid;

/// Points-earning results of a profile, optionally restricted to one calendar year
pub async fn seasonal_points(
    db: &Database,
    profile_id: Uuid,
    season: Option<i32>,
) -> Result<SeasonalHistory> {
    let aggregator = SeasonalPointsAggregator::new(db.store());
    match season {
        Some(year) => aggregator.season_history(profile_id, year).await,
        None => aggregator.seasonal_history(profile_id).await,
    }
}

/// Every ranked result of a profile, points or not
pub async fn all_results(db: &Database, profile_id: Uuid) -> Result<SeasonalHistory> {
    SeasonalPointsAggregator::new(db.store())
        .all_results(profile_id)
        .await
}
