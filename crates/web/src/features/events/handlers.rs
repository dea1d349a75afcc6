use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        audit::EventRankAudit,
        score::{EventStandings, ResolveTieRequest, SubmitScoresRequest},
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/scores/{competitor_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("competitor_id" = Uuid, Path, description = "Competitor id")
    ),
    request_body = SubmitScoresRequest,
    responses(
        (status = 200, description = "Scores saved, event reranked", body = EventStandings),
        (status = 400, description = "Score out of range or competitor from another tournament"),
        (status = 404, description = "Event or competitor not found"),
        (status = 500, description = "Rank rewrite failed or did not persist"),
        (status = 504, description = "Data store timed out")
    ),
    tag = "events"
)]
pub async fn submit_scores(
    State(db): State<Database>,
    Path((event_id, competitor_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SubmitScoresRequest>,
) -> Result<Json<EventStandings>, WebError> {
    req.validate()?;

    let standings = services::submit_scores(&db, event_id, competitor_id, &req).await?;

    Ok(Json(standings))
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/scores/{competitor_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("competitor_id" = Uuid, Path, description = "Competitor id")
    ),
    responses(
        (status = 200, description = "Entry removed, event reranked", body = EventStandings),
        (status = 404, description = "Event or entry not found")
    ),
    tag = "events"
)]
pub async fn withdraw_competitor(
    State(db): State<Database>,
    Path((event_id, competitor_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EventStandings>, WebError> {
    let standings = services::withdraw_competitor(&db, event_id, competitor_id).await?;

    Ok(Json(standings))
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/tie-break",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    request_body = ResolveTieRequest,
    responses(
        (status = 200, description = "Tie resolved, event reranked", body = EventStandings),
        (status = 400, description = "Competitors are not tied with each other"),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn resolve_tie(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<ResolveTieRequest>,
) -> Result<Json<EventStandings>, WebError> {
    req.validate()?;

    let standings = services::resolve_tie(&db, event_id, &req).await?;

    Ok(Json(standings))
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/tie-break",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Manual tie orders cleared, event reranked", body = EventStandings),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn clear_tie_breaks(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventStandings>, WebError> {
    let standings = services::clear_tie_breaks(&db, event_id).await?;

    Ok(Json(standings))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/standings",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Stored standings of the event", body = EventStandings),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn get_standings(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventStandings>, WebError> {
    let standings = services::get_standings(&db, event_id).await?;

    Ok(Json(standings))
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/recompute",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Event reranked", body = EventStandings),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Rank rewrite failed or did not persist")
    ),
    tag = "events"
)]
pub async fn recompute(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventStandings>, WebError> {
    let standings = services::recompute(&db, event_id).await?;

    Ok(Json(standings))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/audit",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Rank drift and duplicate entries of the event"),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn audit_ranks(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventRankAudit>, WebError> {
    let audit = services::audit_ranks(&db, event_id).await?;

    Ok(Json(audit))
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 204, description = "Event deleted with its scores and videos"),
        (status = 404, description = "Event not found")
    ),
    tag = "events"
)]
pub async fn delete_event(
    State(db): State<Database>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, WebError> {
    services::delete_event(&db, event_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
