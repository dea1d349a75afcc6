use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use storage::{Database, dto::season::SeasonalHistory};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::WebError;

use super::services;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SeasonQuery {
    /// Calendar year of the tournaments to include
    pub season: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/profiles/{profile_id}/points",
    params(
        ("profile_id" = Uuid, Path, description = "Champion or competitor profile id"),
        SeasonQuery
    ),
    responses(
        (status = 200, description = "Podium results that earned points, newest first", body = SeasonalHistory),
        (status = 400, description = "Invalid season"),
        (status = 404, description = "Profile not found")
    ),
    tag = "profiles"
)]
pub async fn get_seasonal_points(
    State(db): State<Database>,
    Path(profile_id): Path<Uuid>,
    Query(query): Query<SeasonQuery>,
) -> Result<Json<SeasonalHistory>, WebError> {
    if let Some(season) = query.season
        && !(1900..=9999).contains(&season)
    {
        return Err(WebError::BadRequest(format!("Invalid season {}", season)));
    }

    let history = services::seasonal_points(&db, profile_id, query.season).await?;

    Ok(Json(history))
}

#[utoipa::path(
    get,
    path = "/api/profiles/{profile_id}/results",
    params(
        ("profile_id" = Uuid, Path, description = "Champion or competitor profile id")
    ),
    responses(
        (status = 200, description = "Every ranked result, newest first", body = SeasonalHistory),
        (status = 404, description = "Profile not found")
    ),
    tag = "profiles"
)]
pub async fn get_all_results(
    State(db): State<Database>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<SeasonalHistory>, WebError> {
    let history = services::all_results(&db, profile_id).await?;

    Ok(Json(history))
}
