use axum::{
    Json,
    extract::{Path, State},
};
use storage::{Database, dto::competitor::PromoteCompetitorRequest, models::Competitor};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/competitors/{id}",
    params(
        ("id" = Uuid, Path, description = "Competitor id")
    ),
    responses(
        (status = 200, description = "Competitor found", body = Competitor),
        (status = 404, description = "Competitor not found")
    ),
    tag = "competitors"
)]
pub async fn get_competitor(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Competitor>, WebError> {
    let competitor = services::get_competitor(&db, id).await?;

    Ok(Json(competitor))
}

#[utoipa::path(
    post,
    path = "/api/competitors/{id}/promote",
    params(
        ("id" = Uuid, Path, description = "Competitor id")
    ),
    request_body = PromoteCompetitorRequest,
    responses(
        (status = 200, description = "Competitor linked to a global profile", body = Competitor),
        (status = 400, description = "Validation error or competitor already linked"),
        (status = 404, description = "Competitor or profile not found"),
        (status = 500, description = "Profile link did not persist")
    ),
    tag = "competitors"
)]
pub async fn promote_competitor(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(req): Json<PromoteCompetitorRequest>,
) -> Result<Json<Competitor>, WebError> {
    req.validate()?;

    let competitor = services::promote_competitor(&db, id, &req).await?;

    Ok(Json(competitor))
}
