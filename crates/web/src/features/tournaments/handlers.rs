use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::tournament::{CreateEventRequest, CreateTournamentRequest, RegisterCompetitorRequest},
    models::{Competitor, Event, Tournament},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/tournaments",
    request_body = CreateTournamentRequest,
    responses(
        (status = 201, description = "Tournament created successfully", body = Tournament),
        (status = 400, description = "Validation error")
    ),
    tag = "tournaments"
)]
pub async fn create_tournament(
    State(db): State<Database>,
    Json(req): Json<CreateTournamentRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let tournament = services::create_tournament(&db, &req).await?;

    Ok((StatusCode::CREATED, Json(tournament)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/tournaments/{id}",
    params(
        ("id" = Uuid, Path, description = "Tournament id")
    ),
    responses(
        (status = 200, description = "Tournament found", body = Tournament),
        (status = 404, description = "Tournament not found")
    ),
    tag = "tournaments"
)]
pub async fn get_tournament(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tournament>, WebError> {
    let tournament = services::get_tournament(&db, id).await?;

    Ok(Json(tournament))
}

#[utoipa::path(
    post,
    path = "/api/tournaments/{id}/events",
    params(
        ("id" = Uuid, Path, description = "Tournament id")
    ),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 200, description = "Event of that type already existed", body = Event),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Tournament not found")
    ),
    tag = "tournaments"
)]
pub async fn create_event(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let (event, created) = services::ensure_event(&db, id, &req).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(event)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/tournaments/{id}/events",
    params(
        ("id" = Uuid, Path, description = "Tournament id")
    ),
    responses(
        (status = 200, description = "Events of the tournament", body = Vec<Event>),
        (status = 404, description = "Tournament not found")
    ),
    tag = "tournaments"
)]
pub async fn list_events(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Event>>, WebError> {
    let events = services::list_events(&db, id).await?;

    Ok(Json(events))
}

#[utoipa::path(
    post,
    path = "/api/tournaments/{id}/competitors",
    params(
        ("id" = Uuid, Path, description = "Tournament id")
    ),
    request_body = RegisterCompetitorRequest,
    responses(
        (status = 201, description = "Competitor registered", body = Competitor),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Tournament not found")
    ),
    tag = "tournaments"
)]
pub async fn register_competitor(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(req): Json<RegisterCompetitorRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let competitor = services::register_competitor(&db, id, &req).await?;

    Ok((StatusCode::CREATED, Json(competitor)).into_response())
}
